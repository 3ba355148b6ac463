use chrono::NaiveDate;
use plank_storage::{Card, CardId, Column, ColumnId, UserId};

/// What the pointer is hovering while a drag is in flight: another card, or
/// the body of a column (which is how a card lands in an empty column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragTarget {
    Card(CardId),
    Column(ColumnId),
}

/// Narrows which cards a board snapshot keeps. Applied when fetching, not
/// retroactively on state already held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardFilter {
    pub assignees: Vec<UserId>,
    pub overdue_only: bool,
}

impl BoardFilter {
    pub fn allows(&self, card: &Card, today: NaiveDate) -> bool {
        if !self.assignees.is_empty() && !self.assignees.contains(&card.assignee_id) {
            return false;
        }

        if self.overdue_only {
            // A card due today already counts as overdue.
            match card.due_date {
                Some(due) => due <= today,
                None => false,
            }
        } else {
            true
        }
    }
}

/// In-memory snapshot of one board: the ordered column list plus a single
/// flat card list spanning every column. Hover moves reorder these vectors
/// without touching the persisted index fields; commit reads the final
/// vector order back out.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    columns: Vec<Column>,
    cards: Vec<Card>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_columns(&mut self, columns: Vec<Column>) {
        self.columns = columns;
    }

    pub fn set_cards(&mut self, cards: Vec<Card>) {
        self.cards = cards;
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Cards of one column, in flat-list order.
    pub fn cards_of(&self, column_id: &str) -> Vec<&Card> {
        self.cards
            .iter()
            .filter(|card| card.column_id == column_id)
            .collect()
    }

    pub fn find_column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.id == column_id)
    }

    pub fn find_card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    pub fn column_position(&self, column_id: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.id == column_id)
    }

    /// Position of a card within its own column's list.
    pub fn card_position_in_column(&self, card_id: &str) -> Option<usize> {
        let column_id = self.find_card(card_id)?.column_id.clone();
        self.cards_of(&column_id)
            .iter()
            .position(|card| card.id == card_id)
    }

    pub fn rename_column(&mut self, column_id: &str, title: &str) -> bool {
        match self.columns.iter_mut().find(|column| column.id == column_id) {
            Some(column) => {
                column.title = title.to_string();
                true
            }
            None => false,
        }
    }

    /// Drops a column and every card that sat in it.
    pub fn remove_column(&mut self, column_id: &str) {
        self.columns.retain(|column| column.id != column_id);
        self.cards.retain(|card| card.column_id != column_id);
    }

    pub fn remove_card(&mut self, card_id: &str) {
        self.cards.retain(|card| card.id != card_id);
    }

    /// Reorders the column list so `active_id` lands at the slot currently
    /// held by `over_id`. Unknown ids leave the state untouched.
    pub fn move_column(&mut self, active_id: &str, over_id: &str) -> bool {
        if active_id == over_id {
            return false;
        }

        let (Some(from), Some(to)) = (
            self.column_position(active_id),
            self.column_position(over_id),
        ) else {
            return false;
        };

        let column = self.columns.remove(from);
        let to = to.min(self.columns.len());
        self.columns.insert(to, column);
        true
    }

    /// Applies one hover step of a card drag. Over another card the active
    /// card first adopts that card's column, then takes its flat slot. Over
    /// a column body the card adopts the column and moves to the end of the
    /// flat list, which renders as the last card of that column.
    pub fn move_card(&mut self, active_id: &str, target: &DragTarget) -> bool {
        match target {
            DragTarget::Card(over_id) => self.move_card_over_card(active_id, over_id),
            DragTarget::Column(column_id) => self.move_card_over_column(active_id, column_id),
        }
    }

    fn move_card_over_card(&mut self, active_id: &str, over_id: &str) -> bool {
        if active_id == over_id {
            return false;
        }

        let positions = (
            self.cards.iter().position(|card| card.id == active_id),
            self.cards.iter().position(|card| card.id == over_id),
        );
        let (Some(from), Some(to)) = positions else {
            return false;
        };

        if self.cards[from].column_id != self.cards[to].column_id {
            self.cards[from].column_id = self.cards[to].column_id.clone();
        }

        let card = self.cards.remove(from);
        let to = to.min(self.cards.len());
        self.cards.insert(to, card);
        true
    }

    fn move_card_over_column(&mut self, active_id: &str, column_id: &str) -> bool {
        if self.find_column(column_id).is_none() {
            return false;
        }

        let Some(from) = self.cards.iter().position(|card| card.id == active_id) else {
            return false;
        };

        if self.cards[from].column_id == column_id {
            return false;
        }

        let mut card = self.cards.remove(from);
        card.column_id = column_id.to_string();
        self.cards.push(card);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(id: &str, index: u32) -> Column {
        Column {
            id: id.to_string(),
            workspace_id: "w1".to_string(),
            title: format!("Column {id}"),
            column_index: index,
            cards: vec![],
        }
    }

    fn card(id: &str, column_id: &str, index: u32) -> Card {
        Card {
            id: id.to_string(),
            column_id: column_id.to_string(),
            card_index: index,
            content: format!("Card {id}"),
            due_date: None,
            assignee_id: "u1".to_string(),
            tasks: vec![],
        }
    }

    fn board() -> BoardState {
        let mut state = BoardState::new();
        state.set_columns(vec![column("a", 0), column("b", 1), column("c", 2)]);
        state.set_cards(vec![
            card("k1", "a", 0),
            card("k2", "a", 1),
            card("k3", "b", 2),
        ]);
        state
    }

    fn column_ids(state: &BoardState) -> Vec<&str> {
        state.columns().iter().map(|c| c.id.as_str()).collect()
    }

    fn card_ids(state: &BoardState) -> Vec<&str> {
        state.cards().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_snapshots_preserve_given_order() {
        let state = board();
        assert_eq!(column_ids(&state), vec!["a", "b", "c"]);
        assert_eq!(card_ids(&state), vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn test_move_column_lands_on_the_over_slot() {
        let mut state = board();
        assert!(state.move_column("a", "c"));
        assert_eq!(column_ids(&state), vec!["b", "c", "a"]);

        assert!(state.move_column("a", "b"));
        assert_eq!(column_ids(&state), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_hover_sequence_equals_single_move() {
        let mut stepped = BoardState::new();
        stepped.set_columns(vec![
            column("a", 0),
            column("b", 1),
            column("c", 2),
            column("d", 3),
        ]);
        let mut direct = stepped.clone();

        // Jittering across intermediate columns must settle exactly where a
        // single move to the final target would.
        stepped.move_column("a", "c");
        stepped.move_column("a", "b");
        stepped.move_column("a", "d");
        direct.move_column("a", "d");

        assert_eq!(column_ids(&stepped), column_ids(&direct));
        assert_eq!(column_ids(&stepped), vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_move_column_ignores_unknown_ids() {
        let mut state = board();
        assert!(!state.move_column("ghost", "b"));
        assert!(!state.move_column("a", "ghost"));
        assert!(!state.move_column("a", "a"));
        assert_eq!(column_ids(&state), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_move_card_within_a_column() {
        let mut state = board();
        assert!(state.move_card("k1", &DragTarget::Card("k2".to_string())));
        assert_eq!(card_ids(&state), vec!["k2", "k1", "k3"]);
        assert_eq!(state.find_card("k1").unwrap().column_id, "a");
    }

    #[test]
    fn test_move_card_over_a_card_adopts_its_column() {
        let mut state = board();
        assert!(state.move_card("k1", &DragTarget::Card("k3".to_string())));
        assert_eq!(state.find_card("k1").unwrap().column_id, "b");
        assert_eq!(card_ids(&state), vec!["k2", "k3", "k1"]);
        assert_eq!(
            state.cards_of("b").iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            vec!["k3", "k1"]
        );
    }

    #[test]
    fn test_move_card_over_a_column_body_appends() {
        let mut state = board();
        assert!(state.move_card("k1", &DragTarget::Column("c".to_string())));
        assert_eq!(state.find_card("k1").unwrap().column_id, "c");
        assert_eq!(card_ids(&state), vec!["k2", "k3", "k1"]);
        assert_eq!(state.cards_of("c").len(), 1);
    }

    #[test]
    fn test_move_card_over_its_own_column_is_a_no_op() {
        let mut state = board();
        assert!(!state.move_card("k1", &DragTarget::Column("a".to_string())));
        assert_eq!(card_ids(&state), vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn test_move_card_ignores_unknown_ids() {
        let mut state = board();
        assert!(!state.move_card("ghost", &DragTarget::Card("k1".to_string())));
        assert!(!state.move_card("k1", &DragTarget::Card("ghost".to_string())));
        assert!(!state.move_card("k1", &DragTarget::Column("ghost".to_string())));
        assert_eq!(card_ids(&state), vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn test_card_position_is_measured_within_its_column() {
        let state = board();
        assert_eq!(state.card_position_in_column("k2"), Some(1));
        assert_eq!(state.card_position_in_column("k3"), Some(0));
        assert_eq!(state.card_position_in_column("ghost"), None);
    }

    #[test]
    fn test_remove_column_drops_its_cards() {
        let mut state = board();
        state.remove_column("a");
        assert_eq!(column_ids(&state), vec!["b", "c"]);
        assert_eq!(card_ids(&state), vec!["k3"]);
    }

    #[test]
    fn test_filter_by_assignee() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let filter = BoardFilter {
            assignees: vec!["u2".to_string()],
            overdue_only: false,
        };
        let mut mine = card("k1", "a", 0);
        mine.assignee_id = "u2".to_string();

        assert!(filter.allows(&mine, today));
        assert!(!filter.allows(&card("k2", "a", 1), today));
    }

    #[test]
    fn test_overdue_filter_includes_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let filter = BoardFilter {
            assignees: vec![],
            overdue_only: true,
        };

        let mut due_today = card("k1", "a", 0);
        due_today.due_date = NaiveDate::from_ymd_opt(2024, 3, 15);
        let mut due_later = card("k2", "a", 1);
        due_later.due_date = NaiveDate::from_ymd_opt(2024, 3, 20);
        let undated = card("k3", "a", 2);

        assert!(filter.allows(&due_today, today));
        assert!(!filter.allows(&due_later, today));
        assert!(!filter.allows(&undated, today));
    }
}

use chrono::NaiveDate;
use plank_storage::{Card, CardId, CardUpdate, Column, ColumnId, ColumnUpdate, Subtask, WorkspaceId};
use tracing::{debug, instrument};
use ulid::Ulid;

use crate::board::{BoardFilter, BoardState, DragTarget};
use crate::drag::{DragKind, DragOrigin, DragSession, DropOutcome};
use crate::watch::BoardWatcher;
use crate::{utils, Core, CoreError};

/// One opened workspace board: the optimistic snapshot the UI renders, the
/// gesture session reordering it, and the subscriptions keeping it honest.
///
/// Everything on this struct is local and synchronous. The async halves
/// (fetching, committing a drop, reacting to staleness) live on [`Core`]
/// and take the board as `&mut`.
#[derive(Debug)]
pub struct OpenBoard {
    workspace_id: WorkspaceId,
    state: BoardState,
    session: DragSession,
    watcher: BoardWatcher,
    filter: BoardFilter,
}

impl OpenBoard {
    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn columns(&self) -> &[Column] {
        self.state.columns()
    }

    pub fn cards(&self) -> &[Card] {
        self.state.cards()
    }

    pub fn cards_of(&self, column_id: &str) -> Vec<&Card> {
        self.state.cards_of(column_id)
    }

    pub fn filter(&self) -> &BoardFilter {
        &self.filter
    }

    pub fn is_stale(&self) -> bool {
        self.watcher.is_stale()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_dragging()
    }

    pub fn press_column(&mut self, column_id: &str, x: f64, y: f64) {
        if let Some(position) = self.state.column_position(column_id) {
            let origin = DragOrigin {
                position,
                column_id: None,
            };
            self.session.press(DragKind::Column, column_id, origin, x, y);
        }
    }

    pub fn press_card(&mut self, card_id: &str, x: f64, y: f64) {
        let Some(card) = self.state.find_card(card_id) else {
            return;
        };
        let column_id = card.column_id.clone();
        if let Some(position) = self.state.card_position_in_column(card_id) {
            let origin = DragOrigin {
                position,
                column_id: Some(column_id),
            };
            self.session.press(DragKind::Card, card_id, origin, x, y);
        }
    }

    /// Feeds a pointer position, returning true on the move that turns the
    /// press into a drag.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.session.pointer_move(x, y)
    }

    /// Records what the pointer is over. Targets pile into a single slot
    /// until the next [`tick`](Self::tick) applies the survivor.
    pub fn hover(&mut self, target: DragTarget) {
        self.session.hover(target);
    }

    /// Applies the coalesced hover to the snapshot.
    pub fn tick(&mut self) {
        let (Some(kind), Some(active_id)) = (
            self.session.kind(),
            self.session.active_id().map(str::to_string),
        ) else {
            return;
        };
        if let Some(target) = self.session.tick() {
            self.apply_target(kind, &active_id, &target);
        }
    }

    /// Abandons the gesture without committing. The optimistic order stays
    /// on screen until the next refresh snaps it back to the stored one.
    pub fn cancel_drag(&mut self) {
        self.session.cancel();
    }

    fn apply_target(&mut self, kind: DragKind, active_id: &str, target: &DragTarget) {
        match kind {
            DragKind::Column => {
                if let DragTarget::Column(over_id) = target {
                    self.state.move_column(active_id, over_id);
                }
            }
            DragKind::Card => {
                self.state.move_card(active_id, target);
            }
        }
    }
}

/// A fresh unchecked sub-task with a generated id.
pub fn new_subtask(content: &str) -> Subtask {
    Subtask {
        id: Ulid::new().to_string(),
        content: content.to_string(),
        done: false,
    }
}

impl Core {
    /// Opens a workspace board for `actor`. Non-members are rejected before
    /// anything is fetched or subscribed.
    pub async fn open_board(&self, actor: &str, workspace_id: &str) -> eyre::Result<OpenBoard> {
        let workspace = self.storage.get_workspace(workspace_id.to_string()).await?;
        if workspace.owner != actor && !workspace.members.iter().any(|member| member == actor) {
            return Err(CoreError::not_member(actor, workspace_id).into());
        }

        let watcher = BoardWatcher::attach(&self.storage, workspace_id).await?;
        let mut board = OpenBoard {
            workspace_id: workspace_id.to_string(),
            state: BoardState::new(),
            session: DragSession::new(self.drag_tuning()),
            watcher,
            filter: BoardFilter::default(),
        };
        self.refresh_board(&mut board).await?;
        Ok(board)
    }

    /// Refetches the snapshot and realigns the per-column subscriptions.
    /// The stale flag is cleared before fetching so a write racing the
    /// fetch re-arms it.
    pub async fn refresh_board(&self, board: &mut OpenBoard) -> eyre::Result<()> {
        board.watcher.mark_fresh();
        let (columns, cards) = self.fetch_board(&board.workspace_id, &board.filter).await?;
        board
            .watcher
            .sync_card_subscriptions(&self.storage, &columns)
            .await?;
        board.state.set_columns(columns);
        board.state.set_cards(cards);
        Ok(())
    }

    /// Refreshes only when the watcher flagged a change and no gesture is
    /// in flight. Returns whether a refresh happened.
    pub async fn maybe_refresh_board(&self, board: &mut OpenBoard) -> eyre::Result<bool> {
        if !board.watcher.is_stale() || board.session.is_active() {
            return Ok(false);
        }
        self.refresh_board(board).await?;
        Ok(true)
    }

    pub async fn set_board_filter(
        &self,
        board: &mut OpenBoard,
        filter: BoardFilter,
    ) -> eyre::Result<()> {
        board.filter = filter;
        self.refresh_board(board).await
    }

    /// Ordered columns plus the flat card list, column by column. The store
    /// already breaks index ties, so concatenation yields a stable total
    /// order.
    pub async fn fetch_board(
        &self,
        workspace_id: &str,
        filter: &BoardFilter,
    ) -> eyre::Result<(Vec<Column>, Vec<Card>)> {
        let columns = self.storage.list_columns(workspace_id.to_string()).await?;
        let mut cards = Vec::new();
        for column in &columns {
            cards.extend(self.storage.list_cards(column.id.clone()).await?);
        }

        let today = utils::today();
        let cards = cards
            .into_iter()
            .filter(|card| filter.allows(card, today))
            .collect();
        Ok((columns, cards))
    }

    /// Appends a column to the board.
    pub async fn create_column(
        &self,
        board: &mut OpenBoard,
        title: &str,
    ) -> eyre::Result<ColumnId> {
        let column = Column {
            id: String::new(),
            workspace_id: board.workspace_id.clone(),
            title: title.to_string(),
            column_index: board.state.columns().len() as u32,
            cards: vec![],
        };
        let column_id = self.storage.create_column(column).await?;
        self.refresh_board(board).await?;
        Ok(column_id)
    }

    pub async fn rename_column(
        &self,
        board: &mut OpenBoard,
        column_id: &str,
        title: &str,
    ) -> eyre::Result<()> {
        board.state.rename_column(column_id, title);
        self.storage
            .update_column(
                column_id.to_string(),
                ColumnUpdate::default().set_title(title.to_string()),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_column(&self, board: &mut OpenBoard, column_id: &str) -> eyre::Result<()> {
        board.state.remove_column(column_id);
        self.storage.delete_column(column_id.to_string()).await?;
        Ok(())
    }

    /// Creates a card at the end of `column_id`, assigned to `actor` and
    /// due tomorrow. New cards continue the flat board numbering.
    pub async fn create_card(
        &self,
        board: &mut OpenBoard,
        actor: &str,
        column_id: &str,
        content: &str,
    ) -> eyre::Result<CardId> {
        let card = Card {
            id: String::new(),
            column_id: column_id.to_string(),
            card_index: board.state.cards().len() as u32,
            content: content.to_string(),
            due_date: Some(utils::tomorrow(utils::today())),
            assignee_id: actor.to_string(),
            tasks: vec![],
        };
        let card_id = self.storage.create_card(card).await?;
        self.refresh_board(board).await?;
        Ok(card_id)
    }

    pub async fn delete_card(&self, board: &mut OpenBoard, card_id: &str) -> eyre::Result<()> {
        board.state.remove_card(card_id);
        self.storage.delete_card(card_id.to_string()).await?;
        Ok(())
    }

    pub async fn update_card_content(&self, card_id: &str, content: &str) -> eyre::Result<()> {
        self.storage
            .update_card(
                card_id.to_string(),
                CardUpdate::default().set_content(content.to_string()),
            )
            .await?;
        Ok(())
    }

    pub async fn set_card_due_date(
        &self,
        card_id: &str,
        due_date: Option<NaiveDate>,
    ) -> eyre::Result<()> {
        self.storage
            .update_card(
                card_id.to_string(),
                CardUpdate::default().set_due_date(due_date),
            )
            .await?;
        Ok(())
    }

    pub async fn assign_card(&self, card_id: &str, assignee_id: &str) -> eyre::Result<()> {
        self.storage
            .update_card(
                card_id.to_string(),
                CardUpdate::default().set_assignee_id(assignee_id.to_string()),
            )
            .await?;
        Ok(())
    }

    pub async fn replace_subtasks(&self, card_id: &str, tasks: Vec<Subtask>) -> eyre::Result<()> {
        self.storage
            .update_card(card_id.to_string(), CardUpdate::default().set_tasks(tasks))
            .await?;
        Ok(())
    }

    /// Flips one sub-task's done flag. Unknown sub-task ids leave the card
    /// untouched.
    pub async fn toggle_subtask(&self, card_id: &str, subtask_id: &str) -> eyre::Result<()> {
        let card = self.storage.get_card(card_id.to_string()).await?;
        let mut tasks = card.tasks;
        let mut changed = false;
        for task in tasks.iter_mut() {
            if task.id == subtask_id {
                task.done = !task.done;
                changed = true;
            }
        }
        if changed {
            self.storage
                .update_card(card_id.to_string(), CardUpdate::default().set_tasks(tasks))
                .await?;
        }
        Ok(())
    }

    /// Case-insensitive content search across the whole board.
    pub async fn search_cards(&self, workspace_id: &str, needle: &str) -> eyre::Result<Vec<Card>> {
        let needle = needle.to_lowercase();
        let (_, cards) = self
            .fetch_board(workspace_id, &BoardFilter::default())
            .await?;
        Ok(cards
            .into_iter()
            .filter(|card| card.content.to_lowercase().contains(&needle))
            .collect())
    }

    /// Ends the gesture and persists the final order in one commit:
    /// adjacent moves swap the two index fields, longer moves rewrite the
    /// order wholesale, and cross-column moves go through the retryable
    /// relocation unit. A drag that never left its origin writes nothing.
    #[instrument(skip(self, board))]
    pub async fn finish_drag(&self, board: &mut OpenBoard) -> eyre::Result<()> {
        let Some(outcome) = board.session.release() else {
            return Ok(());
        };
        if let Some(target) = &outcome.unapplied_hover {
            board.apply_target(outcome.kind, &outcome.active_id, target);
        }

        match outcome.kind {
            DragKind::Column => self.commit_column_drag(board, &outcome).await,
            DragKind::Card => self.commit_card_drag(board, &outcome).await,
        }
    }

    async fn commit_column_drag(
        &self,
        board: &mut OpenBoard,
        outcome: &DropOutcome,
    ) -> eyre::Result<()> {
        let Some(final_position) = board.state.column_position(&outcome.active_id) else {
            return Ok(());
        };
        let origin_position = outcome.origin.position;
        if final_position == origin_position {
            return Ok(());
        }

        let displaced = board.state.columns().get(origin_position);
        if let (true, Some(displaced)) =
            (final_position.abs_diff(origin_position) == 1, displaced)
        {
            let active_index = board.state.columns()[final_position].column_index;
            debug!(active = %outcome.active_id, over = %displaced.id, "column swap");
            self.storage
                .swap_column_positions(
                    outcome.active_id.clone(),
                    active_index,
                    displaced.id.clone(),
                    displaced.column_index,
                )
                .await?;
        } else {
            debug!(columns = board.state.columns().len(), "column order flush");
            self.storage
                .sync_column_order(board.state.columns().to_vec())
                .await?;
        }
        Ok(())
    }

    async fn commit_card_drag(
        &self,
        board: &mut OpenBoard,
        outcome: &DropOutcome,
    ) -> eyre::Result<()> {
        let Some(active) = board.state.find_card(&outcome.active_id).cloned() else {
            return Ok(());
        };
        let Some(final_position) = board.state.card_position_in_column(&outcome.active_id) else {
            return Ok(());
        };
        let Some(origin_column) = outcome.origin.column_id.clone() else {
            return Ok(());
        };

        if active.column_id == origin_column {
            let origin_position = outcome.origin.position;
            if final_position == origin_position {
                return Ok(());
            }

            let displaced = board
                .state
                .cards_of(&origin_column)
                .get(origin_position)
                .map(|card| (card.id.clone(), card.card_index));
            if let (true, Some((over_id, over_index))) =
                (final_position.abs_diff(origin_position) == 1, displaced)
            {
                debug!(active = %outcome.active_id, over = %over_id, "card swap");
                self.storage
                    .swap_card_positions(
                        outcome.active_id.clone(),
                        active.card_index,
                        over_id,
                        over_index,
                    )
                    .await?;
            } else {
                debug!(cards = board.state.cards().len(), "card order flush");
                self.storage
                    .sync_card_order(board.state.cards().to_vec())
                    .await?;
            }
        } else {
            // An append slots in after the column's stored tail, so the
            // order needs no renumbering. A mid-list landing gets a
            // transient index and is renumbered right below.
            let (appended, stored_index) = {
                let target_cards = board.state.cards_of(&active.column_id);
                let appended = final_position + 1 == target_cards.len();
                let stored_index = if appended {
                    final_position
                        .checked_sub(1)
                        .and_then(|position| target_cards.get(position))
                        .map(|neighbor| neighbor.card_index + 1)
                        .unwrap_or(0)
                } else {
                    final_position as u32
                };
                (appended, stored_index)
            };
            debug!(
                active = %outcome.active_id,
                from = %origin_column,
                to = %active.column_id,
                "card relocation"
            );
            self.storage
                .move_card_to_column(
                    outcome.active_id.clone(),
                    origin_column.clone(),
                    active.column_id.clone(),
                    stored_index,
                )
                .await?;

            if !appended {
                self.storage
                    .sync_card_order(board.state.cards().to_vec())
                    .await?;
                self.storage.refresh_column_membership(origin_column).await?;
                self.storage
                    .refresh_column_membership(active.column_id.clone())
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_core_with, build_test_core, seed_user};

    async fn seed_board(core: &Core) -> OpenBoard {
        seed_user(core, "u1").await;
        let workspace_id = core
            .create_workspace("u1", "Board", "1f4cb")
            .await
            .unwrap();
        core.open_board("u1", &workspace_id).await.unwrap()
    }

    fn column_ids(board: &OpenBoard) -> Vec<String> {
        board.columns().iter().map(|c| c.id.clone()).collect()
    }

    fn card_ids(board: &OpenBoard) -> Vec<String> {
        board.cards().iter().map(|c| c.id.clone()).collect()
    }

    fn drag_column(board: &mut OpenBoard, active: &str, over: &str) {
        board.press_column(active, 0.0, 0.0);
        assert!(board.pointer_move(40.0, 0.0));
        board.hover(DragTarget::Column(over.to_string()));
        board.tick();
    }

    fn drag_card(board: &mut OpenBoard, active: &str, target: DragTarget) {
        board.press_card(active, 0.0, 0.0);
        assert!(board.pointer_move(40.0, 0.0));
        board.hover(target);
        board.tick();
    }

    #[tokio::test]
    async fn test_open_board_rejects_non_members() {
        let core = build_test_core().await;
        seed_user(&core, "u1").await;
        seed_user(&core, "u2").await;
        let workspace_id = core
            .create_workspace("u1", "Private", "1f512")
            .await
            .unwrap();

        let err = core.open_board("u2", &workspace_id).await.unwrap_err();
        assert!(CoreError::is_forbidden(&err));
        assert!(core.open_board("u1", &workspace_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_column_appends_with_the_next_index() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;

        core.create_column(&mut board, "Todo").await.unwrap();
        core.create_column(&mut board, "Doing").await.unwrap();
        core.create_column(&mut board, "Done").await.unwrap();

        let titles: Vec<&str> = board.columns().iter().map(|c| c.title.as_str()).collect();
        let indexes: Vec<u32> = board.columns().iter().map(|c| c.column_index).collect();
        assert_eq!(titles, vec!["Todo", "Doing", "Done"]);
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_adjacent_column_drag_swaps_index_values() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let b = core.create_column(&mut board, "B").await.unwrap();

        drag_column(&mut board, &a, &b);
        core.finish_drag(&mut board).await.unwrap();
        core.refresh_board(&mut board).await.unwrap();

        assert_eq!(column_ids(&board), vec![b.clone(), a.clone()]);
        let find = |id: &str| {
            board
                .columns()
                .iter()
                .find(|c| c.id == id)
                .unwrap()
                .column_index
        };
        assert_eq!(find(&a), 1);
        assert_eq!(find(&b), 0);
    }

    #[tokio::test]
    async fn test_long_column_drag_rewrites_the_order() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let b = core.create_column(&mut board, "B").await.unwrap();
        let c = core.create_column(&mut board, "C").await.unwrap();

        drag_column(&mut board, &a, &c);
        core.finish_drag(&mut board).await.unwrap();
        core.refresh_board(&mut board).await.unwrap();

        assert_eq!(column_ids(&board), vec![b, c, a]);
        let indexes: Vec<u32> = board.columns().iter().map(|c| c.column_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_unmoved_drag_writes_nothing() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        core.create_column(&mut board, "B").await.unwrap();
        assert!(!board.is_stale());

        // Hovering the dragged column itself reorders nothing, so the drop
        // must not touch the store either.
        drag_column(&mut board, &a, &a);
        core.finish_drag(&mut board).await.unwrap();
        assert!(!board.is_stale());
    }

    #[tokio::test]
    async fn test_press_without_activation_commits_nothing() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let b = core.create_column(&mut board, "B").await.unwrap();

        board.press_column(&a, 0.0, 0.0);
        assert!(!board.pointer_move(5.0, 5.0));
        board.hover(DragTarget::Column(b.clone()));
        board.tick();
        core.finish_drag(&mut board).await.unwrap();

        assert_eq!(column_ids(&board), vec![a, b]);
        assert!(!board.is_stale());
    }

    #[tokio::test]
    async fn test_adjacent_card_drag_swaps_index_values() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let col = core.create_column(&mut board, "Todo").await.unwrap();
        let k1 = core.create_card(&mut board, "u1", &col, "One").await.unwrap();
        let k2 = core.create_card(&mut board, "u1", &col, "Two").await.unwrap();

        drag_card(&mut board, &k2, DragTarget::Card(k1.clone()));
        core.finish_drag(&mut board).await.unwrap();
        core.refresh_board(&mut board).await.unwrap();

        assert_eq!(card_ids(&board), vec![k2.clone(), k1.clone()]);
        let find = |id: &str| {
            board
                .cards()
                .iter()
                .find(|c| c.id == id)
                .unwrap()
                .card_index
        };
        assert_eq!(find(&k2), 0);
        assert_eq!(find(&k1), 1);
    }

    #[tokio::test]
    async fn test_card_dropped_into_an_empty_column() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let b = core.create_column(&mut board, "B").await.unwrap();
        let k1 = core.create_card(&mut board, "u1", &a, "Only").await.unwrap();

        drag_card(&mut board, &k1, DragTarget::Column(b.clone()));
        core.finish_drag(&mut board).await.unwrap();
        core.refresh_board(&mut board).await.unwrap();

        let card = board.cards().iter().find(|c| c.id == k1).unwrap();
        assert_eq!(card.column_id, b);
        assert_eq!(card.card_index, 0);

        let membership = |id: &str| {
            board
                .columns()
                .iter()
                .find(|c| c.id == id)
                .unwrap()
                .cards
                .clone()
        };
        assert!(membership(&a).is_empty());
        assert_eq!(membership(&b), vec![k1]);
    }

    #[tokio::test]
    async fn test_card_appended_to_a_populated_column_lands_last() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let b = core.create_column(&mut board, "B").await.unwrap();
        let k1 = core.create_card(&mut board, "u1", &a, "One").await.unwrap();
        let k2 = core.create_card(&mut board, "u1", &b, "Two").await.unwrap();
        let k3 = core.create_card(&mut board, "u1", &b, "Three").await.unwrap();

        drag_card(&mut board, &k1, DragTarget::Column(b.clone()));
        core.finish_drag(&mut board).await.unwrap();
        core.refresh_board(&mut board).await.unwrap();

        let in_b: Vec<&str> = board.cards_of(&b).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(in_b, vec![k2.as_str(), k3.as_str(), k1.as_str()]);

        // The append wrote past the column's tail and left the neighbors'
        // stored indexes alone.
        let find = |id: &str| {
            board
                .cards()
                .iter()
                .find(|c| c.id == id)
                .unwrap()
                .card_index
        };
        assert_eq!(find(&k2), 1);
        assert_eq!(find(&k3), 2);
        assert_eq!(find(&k1), 3);
    }

    #[tokio::test]
    async fn test_card_dropped_mid_list_renumbers_the_board() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let b = core.create_column(&mut board, "B").await.unwrap();
        let k1 = core.create_card(&mut board, "u1", &a, "One").await.unwrap();
        let k2 = core.create_card(&mut board, "u1", &b, "Two").await.unwrap();
        let k3 = core.create_card(&mut board, "u1", &b, "Three").await.unwrap();

        drag_card(&mut board, &k1, DragTarget::Card(k2.clone()));
        core.finish_drag(&mut board).await.unwrap();
        core.refresh_board(&mut board).await.unwrap();

        assert!(board.cards_of(&a).is_empty());
        let in_b: Vec<&str> = board.cards_of(&b).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(in_b, vec![k2.as_str(), k1.as_str(), k3.as_str()]);

        let indexes: Vec<u32> = board.cards().iter().map(|c| c.card_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);

        let membership = board.columns().iter().find(|c| c.id == b).unwrap();
        assert_eq!(membership.cards, vec![k2, k1, k3]);
    }

    #[tokio::test]
    async fn test_drop_into_a_deleted_column_propagates_not_found() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let b = core.create_column(&mut board, "B").await.unwrap();
        let k1 = core.create_card(&mut board, "u1", &a, "One").await.unwrap();

        drag_card(&mut board, &k1, DragTarget::Column(b.clone()));
        // The target column disappears under the drag.
        core.get_inner_storage()
            .delete_column(b)
            .await
            .unwrap();

        let err = core.finish_drag(&mut board).await.unwrap_err();
        assert!(CoreError::is_not_found(&err));

        // Nothing was half-written.
        let card = core.get_inner_storage().get_card(k1).await.unwrap();
        assert_eq!(card.column_id, a);
    }

    #[tokio::test]
    async fn test_cancel_keeps_the_optimistic_order_until_refresh() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let b = core.create_column(&mut board, "B").await.unwrap();

        drag_column(&mut board, &a, &b);
        board.cancel_drag();

        assert_eq!(column_ids(&board), vec![b.clone(), a.clone()]);
        let stored = core
            .get_inner_storage()
            .list_columns(board.workspace_id().to_string())
            .await
            .unwrap();
        let stored_ids: Vec<String> = stored.iter().map(|c| c.id.clone()).collect();
        assert_eq!(stored_ids, vec![a.clone(), b.clone()]);

        core.refresh_board(&mut board).await.unwrap();
        assert_eq!(column_ids(&board), vec![a, b]);
    }

    #[tokio::test]
    async fn test_refresh_is_deferred_while_dragging() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        core.create_column(&mut board, "B").await.unwrap();

        board.press_column(&a, 0.0, 0.0);
        board.pointer_move(40.0, 0.0);

        // A remote write lands mid-drag.
        core.get_inner_storage()
            .create_column(Column {
                id: String::new(),
                workspace_id: board.workspace_id().to_string(),
                title: "C".to_string(),
                column_index: 2,
                cards: vec![],
            })
            .await
            .unwrap();
        assert!(board.is_stale());
        assert!(!core.maybe_refresh_board(&mut board).await.unwrap());
        assert_eq!(board.columns().len(), 2);

        core.finish_drag(&mut board).await.unwrap();
        assert!(core.maybe_refresh_board(&mut board).await.unwrap());
        assert_eq!(board.columns().len(), 3);
    }

    #[tokio::test]
    async fn test_create_card_defaults() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let b = core.create_column(&mut board, "B").await.unwrap();

        let k1 = core.create_card(&mut board, "u1", &a, "First").await.unwrap();
        let k2 = core.create_card(&mut board, "u1", &a, "Second").await.unwrap();
        let k3 = core.create_card(&mut board, "u1", &b, "Third").await.unwrap();

        let card = core.get_inner_storage().get_card(k1.clone()).await.unwrap();
        assert_eq!(card.assignee_id, "u1");
        assert_eq!(card.due_date, Some(utils::tomorrow(utils::today())));
        assert!(card.tasks.is_empty());

        // Indexes continue the flat numbering across columns.
        let index_of = |id: &str| {
            board
                .cards()
                .iter()
                .find(|c| c.id == id)
                .unwrap()
                .card_index
        };
        assert_eq!(index_of(&k1), 0);
        assert_eq!(index_of(&k2), 1);
        assert_eq!(index_of(&k3), 2);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        core.create_card(&mut board, "u1", &a, "Fix the Roof").await.unwrap();
        core.create_card(&mut board, "u1", &a, "roofing quote").await.unwrap();
        core.create_card(&mut board, "u1", &a, "paint fence").await.unwrap();

        let hits = core
            .search_cards(board.workspace_id(), "ROOF")
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_assignee_filter_narrows_the_snapshot() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let mine = core.create_card(&mut board, "u1", &a, "Mine").await.unwrap();
        let theirs = core.create_card(&mut board, "u1", &a, "Theirs").await.unwrap();
        core.assign_card(&theirs, "u2").await.unwrap();

        core.set_board_filter(
            &mut board,
            BoardFilter {
                assignees: vec!["u1".to_string()],
                overdue_only: false,
            },
        )
        .await
        .unwrap();

        assert_eq!(card_ids(&board), vec![mine]);
    }

    #[tokio::test]
    async fn test_overdue_filter_keeps_cards_due_today_or_earlier() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let late = core.create_card(&mut board, "u1", &a, "Late").await.unwrap();
        core.create_card(&mut board, "u1", &a, "On time").await.unwrap();

        let yesterday = utils::today() - chrono::Duration::days(1);
        core.set_card_due_date(&late, Some(yesterday)).await.unwrap();

        core.set_board_filter(
            &mut board,
            BoardFilter {
                assignees: vec![],
                overdue_only: true,
            },
        )
        .await
        .unwrap();

        assert_eq!(card_ids(&board), vec![late]);
    }

    #[tokio::test]
    async fn test_subtask_toggling() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let k1 = core.create_card(&mut board, "u1", &a, "Card").await.unwrap();

        let tasks = vec![new_subtask("buy paint"), new_subtask("sand walls")];
        let first = tasks[0].id.clone();
        core.replace_subtasks(&k1, tasks).await.unwrap();

        core.toggle_subtask(&k1, &first).await.unwrap();
        let card = core.get_inner_storage().get_card(k1.clone()).await.unwrap();
        assert!(card.tasks[0].done);
        assert!(!card.tasks[1].done);

        // Unknown subtask ids change nothing.
        core.toggle_subtask(&k1, "ghost").await.unwrap();
        let card = core.get_inner_storage().get_card(k1).await.unwrap();
        assert!(card.tasks[0].done);
    }

    #[tokio::test]
    async fn test_rename_column_applies_locally_before_the_write() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "Old").await.unwrap();

        core.rename_column(&mut board, &a, "New").await.unwrap();
        assert_eq!(board.columns()[0].title, "New");

        let stored = core
            .get_inner_storage()
            .list_columns(board.workspace_id().to_string())
            .await
            .unwrap();
        assert_eq!(stored[0].title, "New");
    }

    #[tokio::test]
    async fn test_delete_column_cascades() {
        let core = build_test_core().await;
        let mut board = seed_board(&core).await;
        let a = core.create_column(&mut board, "A").await.unwrap();
        let k1 = core.create_card(&mut board, "u1", &a, "One").await.unwrap();

        core.delete_column(&mut board, &a).await.unwrap();
        assert!(board.columns().is_empty());
        assert!(board.cards().is_empty());

        let err = core.get_inner_storage().get_card(k1).await.unwrap_err();
        assert!(CoreError::is_not_found(&err));
    }

    #[tokio::test]
    async fn test_two_clients_converge_on_the_later_flush() {
        let database = format!("plank-test-{}", Ulid::new());
        let core_a = build_core_with(Some(database.clone())).await;
        let core_b = build_core_with(Some(database)).await;

        let mut board_a = seed_board(&core_a).await;
        let a = core_a.create_column(&mut board_a, "A").await.unwrap();
        let b = core_a.create_column(&mut board_a, "B").await.unwrap();
        let c = core_a.create_column(&mut board_a, "C").await.unwrap();
        let mut board_b = core_b
            .open_board("u1", board_a.workspace_id())
            .await
            .unwrap();

        // Client A commits one order, then client B commits another from an
        // equally fresh snapshot. The later flush wins wholesale.
        drag_column(&mut board_a, &a, &c);
        core_a.finish_drag(&mut board_a).await.unwrap();

        drag_column(&mut board_b, &c, &a);
        core_b.finish_drag(&mut board_b).await.unwrap();

        core_a.refresh_board(&mut board_a).await.unwrap();
        core_b.refresh_board(&mut board_b).await.unwrap();
        assert_eq!(column_ids(&board_a), vec![c, a, b]);
        assert_eq!(column_ids(&board_a), column_ids(&board_b));
    }
}

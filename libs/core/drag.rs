use plank_config::DragConfig;
use plank_storage::ColumnId;

use crate::board::DragTarget;

/// Gesture thresholds, snapshotted from the config when a board is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTuning {
    /// Pointer travel required before a press turns into a drag.
    pub activation_distance: f64,
}

impl Default for DragTuning {
    fn default() -> Self {
        Self {
            activation_distance: 30.0,
        }
    }
}

impl From<&DragConfig> for DragTuning {
    fn from(config: &DragConfig) -> Self {
        Self {
            activation_distance: config.activation_distance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Column,
    Card,
}

/// Where the dragged entity sat when the press happened. `column_id` is only
/// set for card drags; `position` is measured within the parent list (the
/// column list for columns, the card's own column for cards).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragOrigin {
    pub position: usize,
    pub column_id: Option<ColumnId>,
}

/// What `release` hands back for a drag that actually activated. The last
/// hover is flushed through `unapplied_hover` when no tick consumed it, so
/// the drop lands where the pointer last was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropOutcome {
    pub kind: DragKind,
    pub active_id: String,
    pub origin: DragOrigin,
    pub unapplied_hover: Option<DragTarget>,
}

#[derive(Debug, Clone, PartialEq)]
enum SessionState {
    Idle,
    Pending {
        kind: DragKind,
        active_id: String,
        origin: DragOrigin,
        pressed_at: (f64, f64),
    },
    Dragging {
        kind: DragKind,
        active_id: String,
        origin: DragOrigin,
    },
}

/// Tracks one pointer gesture from press to drop. A press stays `Pending`
/// until the pointer travels the activation distance, so plain clicks never
/// reorder anything. Hovers are coalesced: they overwrite a single pending
/// slot and only the survivor is applied on the next tick.
#[derive(Debug)]
pub struct DragSession {
    tuning: DragTuning,
    state: SessionState,
    pending_hover: Option<DragTarget>,
}

impl DragSession {
    pub fn new(tuning: DragTuning) -> Self {
        Self {
            tuning,
            state: SessionState::Idle,
            pending_hover: None,
        }
    }

    /// Begins a gesture. Ignored while another gesture is in flight.
    pub fn press(&mut self, kind: DragKind, active_id: &str, origin: DragOrigin, x: f64, y: f64) {
        if !matches!(self.state, SessionState::Idle) {
            return;
        }

        self.state = SessionState::Pending {
            kind,
            active_id: active_id.to_string(),
            origin,
            pressed_at: (x, y),
        };
    }

    /// Feeds a pointer position. Returns true on the move that activates
    /// the drag.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let activated = match &self.state {
            SessionState::Pending { pressed_at, .. } => {
                (x - pressed_at.0).hypot(y - pressed_at.1) >= self.tuning.activation_distance
            }
            _ => false,
        };
        if !activated {
            return false;
        }

        if let SessionState::Pending {
            kind,
            active_id,
            origin,
            ..
        } = std::mem::replace(&mut self.state, SessionState::Idle)
        {
            self.state = SessionState::Dragging {
                kind,
                active_id,
                origin,
            };
        }
        true
    }

    /// Records the current hover target, replacing any not-yet-applied one.
    /// Hovers before activation are dropped.
    pub fn hover(&mut self, target: DragTarget) {
        if matches!(self.state, SessionState::Dragging { .. }) {
            self.pending_hover = Some(target);
        }
    }

    /// Takes the coalesced hover for this tick, if any.
    pub fn tick(&mut self) -> Option<DragTarget> {
        if matches!(self.state, SessionState::Dragging { .. }) {
            self.pending_hover.take()
        } else {
            None
        }
    }

    /// Ends the gesture. A press that never activated is a click and yields
    /// nothing.
    pub fn release(&mut self) -> Option<DropOutcome> {
        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        let unapplied_hover = self.pending_hover.take();

        match state {
            SessionState::Dragging {
                kind,
                active_id,
                origin,
            } => Some(DropOutcome {
                kind,
                active_id,
                origin,
                unapplied_hover,
            }),
            _ => None,
        }
    }

    /// Abandons the gesture without producing an outcome.
    pub fn cancel(&mut self) {
        self.state = SessionState::Idle;
        self.pending_hover = None;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SessionState::Dragging { .. })
    }

    /// True from press to release, activated or not.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, SessionState::Idle)
    }

    pub fn kind(&self) -> Option<DragKind> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Pending { kind, .. } | SessionState::Dragging { kind, .. } => Some(*kind),
        }
    }

    pub fn active_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Pending { active_id, .. } | SessionState::Dragging { active_id, .. } => {
                Some(active_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(position: usize) -> DragOrigin {
        DragOrigin {
            position,
            column_id: None,
        }
    }

    fn session() -> DragSession {
        DragSession::new(DragTuning::default())
    }

    #[test]
    fn test_click_without_travel_yields_nothing() {
        let mut session = session();
        session.press(DragKind::Column, "a", origin(0), 100.0, 100.0);
        assert!(!session.pointer_move(105.0, 103.0));
        assert!(!session.is_dragging());
        assert_eq!(session.release(), None);
    }

    #[test]
    fn test_activation_distance_gates_the_drag() {
        let mut session = session();
        session.press(DragKind::Column, "a", origin(0), 0.0, 0.0);
        assert!(!session.pointer_move(29.9, 0.0));
        assert!(session.pointer_move(30.0, 0.0));
        assert!(session.is_dragging());
    }

    #[test]
    fn test_diagonal_travel_counts_as_distance() {
        let mut session = session();
        session.press(DragKind::Card, "k1", origin(0), 0.0, 0.0);
        // 3-4-5 triangle scaled: sqrt(18^2 + 24^2) = 30.
        assert!(session.pointer_move(18.0, 24.0));
    }

    #[test]
    fn test_hovers_coalesce_to_the_latest() {
        let mut session = session();
        session.press(DragKind::Card, "k1", origin(0), 0.0, 0.0);
        session.pointer_move(40.0, 0.0);

        session.hover(DragTarget::Card("k2".to_string()));
        session.hover(DragTarget::Card("k3".to_string()));
        session.hover(DragTarget::Column("b".to_string()));

        assert_eq!(session.tick(), Some(DragTarget::Column("b".to_string())));
        assert_eq!(session.tick(), None);
    }

    #[test]
    fn test_hover_before_activation_is_dropped() {
        let mut session = session();
        session.press(DragKind::Card, "k1", origin(0), 0.0, 0.0);
        session.hover(DragTarget::Card("k2".to_string()));
        assert_eq!(session.tick(), None);

        session.pointer_move(40.0, 0.0);
        assert_eq!(session.tick(), None);
    }

    #[test]
    fn test_release_flushes_the_unapplied_hover() {
        let mut session = session();
        session.press(DragKind::Card, "k1", origin(2), 0.0, 0.0);
        session.pointer_move(40.0, 0.0);
        session.hover(DragTarget::Card("k2".to_string()));

        let outcome = session.release().unwrap();
        assert_eq!(outcome.kind, DragKind::Card);
        assert_eq!(outcome.active_id, "k1");
        assert_eq!(outcome.origin.position, 2);
        assert_eq!(
            outcome.unapplied_hover,
            Some(DragTarget::Card("k2".to_string()))
        );
        assert!(!session.is_active());
    }

    #[test]
    fn test_applied_hover_is_not_flushed_twice() {
        let mut session = session();
        session.press(DragKind::Card, "k1", origin(0), 0.0, 0.0);
        session.pointer_move(40.0, 0.0);
        session.hover(DragTarget::Card("k2".to_string()));
        assert!(session.tick().is_some());

        let outcome = session.release().unwrap();
        assert_eq!(outcome.unapplied_hover, None);
    }

    #[test]
    fn test_cancel_discards_the_gesture() {
        let mut session = session();
        session.press(DragKind::Column, "a", origin(0), 0.0, 0.0);
        session.pointer_move(40.0, 0.0);
        session.hover(DragTarget::Column("b".to_string()));

        session.cancel();
        assert!(!session.is_active());
        assert_eq!(session.release(), None);
    }

    #[test]
    fn test_press_while_active_is_ignored() {
        let mut session = session();
        session.press(DragKind::Column, "a", origin(0), 0.0, 0.0);
        session.press(DragKind::Column, "b", origin(1), 50.0, 50.0);
        assert_eq!(session.active_id(), Some("a"));
    }

    #[test]
    fn test_tuning_comes_from_the_config() {
        let config = plank_config::DragConfig {
            activation_distance: 5.0,
        };
        let mut session = DragSession::new(DragTuning::from(&config));
        session.press(DragKind::Column, "a", origin(0), 0.0, 0.0);
        assert!(session.pointer_move(5.0, 0.0));
    }
}

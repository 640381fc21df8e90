//! Drag session: turns a multi-frame pointer gesture into one history entry.
//!
//! ```text
//! Idle ──start──▶ Dragging ──finish, items changed──▶ Committed
//!                    │
//!                    └──finish, no net change──▶ Idle   (command discarded)
//! ```
//!
//! `Committed` lasts until the next `start()` or `reset()`, so hosts can
//! show feedback for the gesture that just ended.

use crate::commands::{Command, History};
use crate::error::EditorError;
use trellis_core::{ItemId, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging {
        /// The item under the pointer when the drag began.
        item: ItemId,
        /// Pointer minus the item's screen position at the press.
        start_delta: Vec2,
    },
    Committed {
        item: ItemId,
    },
}

/// What `finish()` did with the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    NotDragging,
    /// An undo entry was pushed.
    Committed,
    /// The gesture ended without net change; nothing was recorded.
    Discarded,
}

#[derive(Debug, Clone, Default)]
pub struct DragSession {
    phase: DragPhase,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    pub fn dragged_item(&self) -> Option<ItemId> {
        match self.phase {
            DragPhase::Dragging { item, .. } => Some(item),
            _ => None,
        }
    }

    pub fn start_delta(&self) -> Option<Vec2> {
        match self.phase {
            DragPhase::Dragging { start_delta, .. } => Some(start_delta),
            _ => None,
        }
    }

    /// Idle → Dragging. Begins `command` on `history`.
    pub fn start<D: ?Sized>(
        &mut self,
        history: &mut History<D>,
        command: impl Command<D> + 'static,
        item: ItemId,
        start_delta: Vec2,
    ) -> Result<(), EditorError> {
        history.begin(command)?;
        log::debug!("drag start on {item}");
        self.phase = DragPhase::Dragging { item, start_delta };
        Ok(())
    }

    /// Dragging → Committed when the items ended up somewhere else,
    /// Dragging → Idle otherwise. The decision is the command's own net
    /// change, not how far the pointer travelled.
    pub fn finish<D: ?Sized>(&mut self, history: &mut History<D>, doc: &D) -> DragOutcome {
        let DragPhase::Dragging { item, .. } = self.phase else {
            return DragOutcome::NotDragging;
        };
        if history.commit(doc) {
            self.phase = DragPhase::Committed { item };
            return DragOutcome::Committed;
        }
        self.phase = DragPhase::Idle;
        DragOutcome::Discarded
    }

    pub fn reset(&mut self) {
        self.phase = DragPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;

    struct SetValue {
        before: i32,
        after: i32,
    }

    impl Command<i32> for SetValue {
        fn name(&self) -> &str {
            "set"
        }
        fn execute(&mut self, doc: &mut i32) -> Result<(), CommandError> {
            *doc = self.after;
            Ok(())
        }
        fn undo(&mut self, doc: &mut i32) -> Result<(), CommandError> {
            *doc = self.before;
            Ok(())
        }
        fn store_current_values(&mut self, doc: &i32) {
            self.after = *doc;
        }
        fn has_changes(&self) -> bool {
            self.before != self.after
        }
    }

    fn start(session: &mut DragSession, history: &mut History<i32>, value: i32) {
        session
            .start(
                history,
                SetValue {
                    before: value,
                    after: value,
                },
                ItemId::intern("drag_item"),
                Vec2::new(3.0, 4.0),
            )
            .unwrap();
    }

    #[test]
    fn moved_gesture_commits() {
        let mut session = DragSession::new();
        let mut history: History<i32> = History::new(10);
        let mut value = 1;

        start(&mut session, &mut history, value);
        assert!(session.is_dragging());
        assert_eq!(session.start_delta(), Some(Vec2::new(3.0, 4.0)));

        value = 5;
        assert_eq!(session.finish(&mut history, &value), DragOutcome::Committed);
        assert!(matches!(session.phase(), DragPhase::Committed { .. }));
        assert_eq!(history.undo_len(), 1);

        history.undo(&mut value);
        assert_eq!(value, 1);
    }

    #[test]
    fn unchanged_release_discards() {
        let mut session = DragSession::new();
        let mut history: History<i32> = History::new(10);
        let value = 1;

        start(&mut session, &mut history, value);
        assert_eq!(session.finish(&mut history, &value), DragOutcome::Discarded);
        assert_eq!(session.phase(), DragPhase::Idle);
        assert!(!history.can_undo());
        assert!(!history.is_in_flight());
    }

    #[test]
    fn value_changed_without_pointer_travel_still_commits() {
        let mut session = DragSession::new();
        let mut history: History<i32> = History::new(10);
        let mut value = 2;

        start(&mut session, &mut history, value);
        // A snap or a press-frame move left the value elsewhere.
        value = 3;
        assert_eq!(session.finish(&mut history, &value), DragOutcome::Committed);
        assert_eq!(history.undo_len(), 1);
        history.undo(&mut value);
        assert_eq!(value, 2);
    }

    #[test]
    fn finish_when_idle_is_noop() {
        let mut session = DragSession::new();
        let mut history: History<i32> = History::new(10);
        assert_eq!(session.finish(&mut history, &0), DragOutcome::NotDragging);
    }

    #[test]
    fn second_session_on_same_history_fails() {
        let mut history: History<i32> = History::new(10);
        let mut first = DragSession::new();
        let mut second = DragSession::new();
        start(&mut first, &mut history, 0);

        let result = second.start(
            &mut history,
            SetValue {
                before: 0,
                after: 0,
            },
            ItemId::intern("other"),
            Vec2::ZERO,
        );
        assert!(result.is_err());
        assert_eq!(second.phase(), DragPhase::Idle);
    }
}

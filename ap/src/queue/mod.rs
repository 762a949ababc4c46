//! ActionQueue - ordered, index-addressed store of planned actions
//!
//! Indices are stable until the queue is cleared, replaced or compacted by
//! `pop_approved`. Callers outside the orchestration core only ever see
//! indices and cloned snapshots.

use thiserror::Error;
use tracing::debug;

use crate::domain::{ActionIndex, PlannedAction};

/// Access beyond the end of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Action index {index} out of range (queue holds {len} actions)")]
pub struct OutOfRange {
    pub index: ActionIndex,
    pub len: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionQueue {
    actions: Vec<PlannedAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, index: ActionIndex) -> Result<&PlannedAction, OutOfRange> {
        self.actions.get(index.0).ok_or(OutOfRange {
            index,
            len: self.actions.len(),
        })
    }

    /// One-line rendering of the action at `index`
    pub fn preview_text(&self, index: ActionIndex) -> Result<String, OutOfRange> {
        self.get(index).map(PlannedAction::preview)
    }

    pub fn set_approved(&mut self, index: ActionIndex, approved: bool) -> Result<(), OutOfRange> {
        debug!(%index, approved, "set_approved: called");
        let len = self.actions.len();
        let action = self.actions.get_mut(index.0).ok_or(OutOfRange { index, len })?;
        action.set_approved(approved);
        Ok(())
    }

    /// Remove and return approved actions in order; the rest keep their relative order
    pub fn pop_approved(&mut self) -> Vec<PlannedAction> {
        let (approved, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.actions)
            .into_iter()
            .partition(PlannedAction::approved);
        debug!(popped = approved.len(), kept = kept.len(), "pop_approved: called");
        self.actions = kept;
        approved
    }

    /// Where the action at `index` will sit after `pop_approved`; None if it will be popped
    pub fn position_after_pop(&self, index: ActionIndex) -> Option<ActionIndex> {
        let action = self.actions.get(index.0)?;
        if action.approved() {
            return None;
        }
        let kept_before = self.actions[..index.0].iter().filter(|a| !a.approved()).count();
        Some(ActionIndex(kept_before))
    }

    pub fn clear(&mut self) {
        debug!(count = self.actions.len(), "clear: called");
        self.actions.clear();
    }

    /// Record an execution outcome; an index that no longer exists is ignored
    ///
    /// The queue may have been reset between planning and the end of
    /// execution, so a stale index is expected rather than a fault.
    pub fn record_outcome(&mut self, index: ActionIndex, succeeded: bool, attempt_count: u32) {
        match self.actions.get_mut(index.0) {
            Some(action) => {
                debug!(%index, succeeded, attempt_count, "record_outcome: called");
                action.record_outcome(succeeded, attempt_count);
            }
            None => {
                debug!(%index, len = self.actions.len(), "record_outcome: stale index ignored");
            }
        }
    }

    /// First action still pending, if any
    pub fn next_pending_index(&self) -> Option<ActionIndex> {
        self.actions.iter().position(PlannedAction::is_pending).map(ActionIndex)
    }

    /// Append an action, returning its index
    pub fn push(&mut self, action: PlannedAction) -> ActionIndex {
        self.actions.push(action);
        ActionIndex(self.actions.len() - 1)
    }

    /// Replace the whole queue
    pub fn replace(&mut self, actions: Vec<PlannedAction>) {
        debug!(old = self.actions.len(), new = actions.len(), "replace: called");
        self.actions = actions;
    }

    /// Local index of the action the server knows as `server_index`
    pub fn position_of_server_index(&self, server_index: usize) -> Option<ActionIndex> {
        self.actions
            .iter()
            .position(|a| a.server_index() == Some(server_index))
            .map(ActionIndex)
    }

    /// Insert a server-proposed action, replacing an entry with the same server index
    pub fn upsert(&mut self, action: PlannedAction) -> ActionIndex {
        if let Some(server_index) = action.server_index()
            && let Some(existing) = self.position_of_server_index(server_index)
        {
            debug!(%existing, server_index, "upsert: replacing existing entry");
            self.actions[existing.0] = action;
            return existing;
        }
        self.push(action)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlannedAction> {
        self.actions.iter()
    }

    /// Cloned copy of every action, for readers outside the core
    pub fn snapshot(&self) -> Vec<PlannedAction> {
        self.actions.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionKind, ActionState, RiskLevel};
    use proptest::prelude::*;

    fn undo(steps: u32) -> PlannedAction {
        PlannedAction::new(ActionKind::Undo { steps }, RiskLevel::Low)
    }

    fn queue_of(n: u32) -> ActionQueue {
        let mut queue = ActionQueue::new();
        for i in 1..=n {
            queue.push(undo(i));
        }
        queue
    }

    fn steps(actions: &[PlannedAction]) -> Vec<u32> {
        actions
            .iter()
            .map(|a| match a.kind() {
                ActionKind::Undo { steps } => *steps,
                _ => 0,
            })
            .collect()
    }

    #[test]
    fn test_get_out_of_range() {
        let queue = queue_of(2);
        assert!(queue.get(ActionIndex(1)).is_ok());
        assert_eq!(
            queue.get(ActionIndex(2)).unwrap_err(),
            OutOfRange {
                index: ActionIndex(2),
                len: 2
            }
        );
        assert!(queue.preview_text(ActionIndex(5)).is_err());
    }

    #[test]
    fn test_pop_approved_keeps_rejected_in_order() {
        let mut queue = queue_of(5);
        queue.set_approved(ActionIndex(1), false).unwrap();
        queue.set_approved(ActionIndex(3), false).unwrap();

        let popped = queue.pop_approved();
        assert_eq!(steps(&popped), vec![1, 3, 5]);
        assert_eq!(queue.count(), 2);
        assert_eq!(steps(&queue.snapshot()), vec![2, 4]);
    }

    #[test]
    fn test_position_after_pop() {
        let mut queue = queue_of(5);
        queue.set_approved(ActionIndex(1), false).unwrap();
        queue.set_approved(ActionIndex(3), false).unwrap();

        assert_eq!(queue.position_after_pop(ActionIndex(3)), Some(ActionIndex(1)));
        assert_eq!(queue.position_after_pop(ActionIndex(1)), Some(ActionIndex(0)));
        assert_eq!(queue.position_after_pop(ActionIndex(2)), None);
        assert_eq!(queue.position_after_pop(ActionIndex(9)), None);

        let before = queue.get(ActionIndex(3)).unwrap().clone();
        queue.pop_approved();
        assert_eq!(queue.get(ActionIndex(1)).unwrap(), &before);
    }

    #[test]
    fn test_pop_approved_on_empty_is_idempotent() {
        let mut queue = ActionQueue::new();
        assert!(queue.pop_approved().is_empty());
        assert!(queue.pop_approved().is_empty());
        assert_eq!(queue, ActionQueue::new());
    }

    #[test]
    fn test_set_approved_out_of_range() {
        let mut queue = queue_of(1);
        assert!(queue.set_approved(ActionIndex(1), false).is_err());
    }

    #[test]
    fn test_record_outcome() {
        let mut queue = queue_of(3);
        queue.record_outcome(ActionIndex(1), true, 2);

        let action = queue.get(ActionIndex(1)).unwrap();
        assert_eq!(action.state(), ActionState::Succeeded);
        assert_eq!(action.attempt_count(), 2);
        assert_eq!(queue.get(ActionIndex(0)).unwrap().state(), ActionState::Pending);
        assert_eq!(queue.get(ActionIndex(2)).unwrap().state(), ActionState::Pending);
    }

    #[test]
    fn test_record_outcome_out_of_range_is_noop() {
        let mut queue = queue_of(2);
        let before = queue.clone();
        queue.record_outcome(ActionIndex(7), false, 1);
        assert_eq!(queue, before);
    }

    #[test]
    fn test_next_pending_index() {
        let mut queue = queue_of(3);
        assert_eq!(queue.next_pending_index(), Some(ActionIndex(0)));
        queue.record_outcome(ActionIndex(0), true, 1);
        queue.record_outcome(ActionIndex(1), false, 3);
        assert_eq!(queue.next_pending_index(), Some(ActionIndex(2)));
        queue.record_outcome(ActionIndex(2), true, 1);
        assert_eq!(queue.next_pending_index(), None);
    }

    #[test]
    fn test_upsert_by_server_index() {
        let mut queue = ActionQueue::new();
        let first = queue.upsert(undo(1).with_server_index(Some(4)));
        let second = queue.upsert(undo(2).with_server_index(Some(5)));
        let replaced = queue.upsert(undo(9).with_server_index(Some(4)));
        let appended = queue.upsert(undo(3));

        assert_eq!(first, ActionIndex(0));
        assert_eq!(second, ActionIndex(1));
        assert_eq!(replaced, ActionIndex(0));
        assert_eq!(appended, ActionIndex(2));
        assert_eq!(steps(&queue.snapshot()), vec![9, 2, 3]);
        assert_eq!(queue.position_of_server_index(5), Some(ActionIndex(1)));
    }

    proptest! {
        #[test]
        fn prop_pop_approved_partitions(flags in prop::collection::vec(any::<bool>(), 0..32)) {
            let mut queue = queue_of(flags.len() as u32);
            for (i, approved) in flags.iter().enumerate() {
                queue.set_approved(ActionIndex(i), *approved).unwrap();
            }

            let popped = queue.pop_approved();
            let expected_popped: Vec<u32> = (1..=flags.len() as u32).filter(|i| flags[*i as usize - 1]).collect();
            let expected_kept: Vec<u32> = (1..=flags.len() as u32).filter(|i| !flags[*i as usize - 1]).collect();

            prop_assert_eq!(steps(&popped), expected_popped);
            prop_assert_eq!(steps(&queue.snapshot()), expected_kept);
            prop_assert!(queue.iter().all(|a| !a.approved()));
        }
    }
}

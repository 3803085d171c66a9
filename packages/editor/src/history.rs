//! # History
//!
//! Snapshot-based undo/redo over immutable values.
//!
//! ## Design
//!
//! - `past` holds earlier snapshots, most recent last
//! - `future` holds undone snapshots, the next redo last
//! - Recording a new present clears `future`
//! - An optional limit drops the oldest snapshots
//!
//! ```text
//!   past: [d0, d1]   present: d2   future: []
//!   undo  → past: [d0]   present: d1   future: [d2]
//!   redo  → past: [d0, d1]   present: d2   future: []
//! ```
//!
//! Snapshots are whole values. For documents that is cheap because unchanged
//! blocks are shared between snapshots.

use tracing::trace;

#[derive(Debug, Clone)]
pub struct History<T> {
    past: Vec<T>,
    present: T,
    future: Vec<T>,

    /// Maximum number of undo levels (`None` = unlimited)
    limit: Option<usize>,
}

impl<T: Clone> History<T> {
    pub fn new(present: T) -> Self {
        Self {
            past: Vec::new(),
            present,
            future: Vec::new(),
            limit: None,
        }
    }

    /// History keeping at most `limit` undo levels
    pub fn with_limit(present: T, limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::new(present)
        }
    }

    pub fn present(&self) -> &T {
        &self.present
    }

    /// Make `next` the present, pushing the old present onto `past`
    pub fn record(&mut self, next: T) {
        let previous = std::mem::replace(&mut self.present, next);
        self.past.push(previous);
        self.future.clear();

        if let Some(limit) = self.limit {
            if self.past.len() > limit {
                let excess = self.past.len() - limit;
                self.past.drain(..excess);
            }
        }

        trace!(undo_levels = self.past.len(), "Recorded snapshot");
    }

    /// Record the value `f` derives from the present
    pub fn record_with(&mut self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.present);
        self.record(next);
    }

    /// Swap the present without touching `past` or `future`.
    ///
    /// Used for loading, where the previous value is not an edit to undo.
    pub fn replace(&mut self, next: T) {
        self.present = next;
    }

    /// Step back one snapshot. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };

        let current = std::mem::replace(&mut self.present, previous);
        self.future.push(current);
        trace!(undo_levels = self.past.len(), redo_levels = self.future.len(), "Undo");
        true
    }

    /// Step forward one snapshot. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };

        let current = std::mem::replace(&mut self.present, next);
        self.past.push(current);
        trace!(undo_levels = self.past.len(), redo_levels = self.future.len(), "Redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.past.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.future.len()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Earlier snapshots, oldest first
    pub fn past(&self) -> &[T] {
        &self.past
    }

    /// Undone snapshots, next redo first
    pub fn future(&self) -> impl Iterator<Item = &T> {
        self.future.iter().rev()
    }

    /// Forget all undo and redo levels, keeping the present
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl<T: Clone + Default> Default for History<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_undo() {
        let mut history = History::new(0);
        history.record(1);
        history.record(2);

        assert!(history.can_undo());
        assert_eq!(history.undo_levels(), 2);

        assert!(history.undo());
        assert_eq!(*history.present(), 1);
        assert!(history.can_redo());

        assert!(history.redo());
        assert_eq!(*history.present(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut history = History::new("only");

        assert!(!history.undo());
        assert!(!history.redo());
        assert_eq!(*history.present(), "only");
    }

    #[test]
    fn test_record_clears_future() {
        let mut history = History::new(0);
        history.record(1);
        history.undo();
        history.record(5);

        assert!(!history.can_redo());
        assert_eq!(history.past(), &[0]);
    }

    #[test]
    fn test_future_order() {
        let mut history = History::new(0);
        history.record(1);
        history.record(2);
        history.undo();
        history.undo();

        assert_eq!(history.future().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::with_limit(0, Some(2));
        for n in 1..=4 {
            history.record(n);
        }

        assert_eq!(history.past(), &[2, 3]);
        assert!(history.undo());
        assert!(history.undo());
        assert!(!history.undo());
        assert_eq!(*history.present(), 2);
    }

    #[test]
    fn test_replace_keeps_stacks() {
        let mut history = History::new(0);
        history.record(1);
        history.replace(10);

        assert_eq!(history.undo_levels(), 1);
        history.undo();
        assert_eq!(*history.present(), 0);
    }

    #[test]
    fn test_record_with() {
        let mut history = History::new(vec![1]);
        history.record_with(|v| [v.as_slice(), &[2]].concat());

        assert_eq!(history.present(), &vec![1, 2]);
    }
}

//! # Snapshot History
//!
//! Linear undo/redo over whole-document snapshots.
//!
//! ## Design
//!
//! - `entries[index]` is always the current snapshot
//! - Undo/redo only move the cursor; entries are never rewritten
//! - Pushing while mid-history discards everything after the cursor
//! - With a level limit, the oldest entries are dropped once it is exceeded
//!
//! ## Example
//!
//! ```rust
//! use pagesmith_editor::History;
//!
//! let mut history = History::new("a", 0);
//! history.push("b");
//! history.push("c");
//!
//! assert!(history.undo());
//! assert_eq!(*history.current(), "b");
//!
//! history.push("d"); // "c" is gone
//! assert!(!history.can_redo());
//! ```

/// Snapshot history with a cursor
#[derive(Debug, Clone)]
pub struct History<T> {
    /// Snapshots, oldest first
    entries: Vec<T>,

    /// Position of the current snapshot
    index: usize,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// The load-time snapshot was dropped by the level limit
    base_trimmed: bool,
}

impl<T: Clone> History<T> {
    /// Start a history at `initial`
    pub fn new(initial: T, max_levels: usize) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
            max_levels,
            base_trimmed: false,
        }
    }

    /// Current snapshot
    pub fn current(&self) -> &T {
        &self.entries[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the cursor sits on the snapshot the history started from
    pub fn at_base(&self) -> bool {
        self.index == 0 && !self.base_trimmed
    }

    /// Record a new snapshot after the cursor
    pub fn push(&mut self, snapshot: T) {
        // A new edit invalidates the redo tail
        self.entries.truncate(self.index + 1);
        self.entries.push(snapshot);
        self.index = self.entries.len() - 1;

        if self.max_levels > 0 && self.entries.len() > self.max_levels + 1 {
            let excess = self.entries.len() - (self.max_levels + 1);
            self.entries.drain(..excess);
            self.index -= excess;
            self.base_trimmed = true;
        }
    }

    /// Step back; returns false at the oldest snapshot
    pub fn undo(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Step forward; returns false at the newest snapshot
    pub fn redo(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Number of undo levels available
    pub fn undo_levels(&self) -> usize {
        self.index
    }

    /// Number of redo levels available
    pub fn redo_levels(&self) -> usize {
        self.entries.len() - self.index - 1
    }

    /// Replace all history with a single snapshot
    pub fn reset(&mut self, snapshot: T) {
        self.entries.clear();
        self.entries.push(snapshot);
        self.index = 0;
        self.base_trimmed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_creation() {
        let history = History::new(0, 0);
        assert_eq!(history.len(), 1);
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.at_base());
    }

    #[test]
    fn test_push_undo_redo() {
        let mut history = History::new(0, 0);
        history.push(1);
        history.push(2);
        assert_eq!(*history.current(), 2);

        assert!(history.undo());
        assert_eq!(*history.current(), 1);
        assert_eq!(history.redo_levels(), 1);

        assert!(history.redo());
        assert_eq!(*history.current(), 2);
        assert!(!history.redo());
    }

    #[test]
    fn test_push_mid_history_truncates() {
        let mut history = History::new(0, 0);
        history.push(1);
        history.push(2);
        history.undo();
        history.undo();
        history.push(3);

        assert_eq!(history.len(), 2);
        assert_eq!(*history.current(), 3);
        assert!(!history.can_redo());
        history.undo();
        assert_eq!(*history.current(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut history = History::new(0, 2);
        for i in 1..=3 {
            history.push(i);
        }

        // Only 2 undo levels survive
        assert_eq!(history.undo_levels(), 2);
        assert!(history.undo());
        assert!(history.undo());
        assert!(!history.undo());
        assert_eq!(*history.current(), 1);
        assert!(!history.at_base());
    }

    #[test]
    fn test_reset() {
        let mut history = History::new(0, 1);
        history.push(1);
        history.push(2);
        history.reset(9);
        assert_eq!(*history.current(), 9);
        assert_eq!(history.len(), 1);
        assert!(history.at_base());
    }
}

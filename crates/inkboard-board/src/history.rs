//! Undo/redo history
//!
//! An ordered list of element-collection snapshots and a pointer to the one
//! currently rendered. Undo and redo only move the pointer; pushing appends.

use inkboard_core::Element;

/// What happens to snapshots past the pointer when a new one is pushed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Keep them; the history only ever grows
    #[default]
    AppendOnly,
    /// Discard them before pushing
    TruncateRedo,
}

/// Snapshot history with a movable pointer
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Vec<Element>>,
    index: usize,
    policy: HistoryPolicy,
}

impl History {
    /// Start with a single empty snapshot at pointer 0
    #[must_use]
    pub fn new(policy: HistoryPolicy) -> Self {
        Self {
            snapshots: vec![Vec::new()],
            index: 0,
            policy,
        }
    }

    /// Snapshot at the pointer
    #[must_use]
    pub fn current(&self) -> &[Element] {
        &self.snapshots[self.index]
    }

    /// Position of the pointer
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of snapshots
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; the initial empty snapshot is never removed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Active policy
    #[must_use]
    pub fn policy(&self) -> HistoryPolicy {
        self.policy
    }

    /// Whether `undo` would move the pointer
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    /// Whether `redo` would move the pointer
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// Push a snapshot and move the pointer onto it
    pub fn push(&mut self, snapshot: Vec<Element>) {
        if self.policy == HistoryPolicy::TruncateRedo {
            self.snapshots.truncate(self.index + 1);
        }
        self.snapshots.push(snapshot);
        self.index = self.snapshots.len() - 1;
    }

    /// Step back one snapshot; `None` at the start
    pub fn undo(&mut self) -> Option<&[Element]> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    /// Step forward one snapshot; `None` at the end
    pub fn redo(&mut self) -> Option<&[Element]> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::{Point, Stroke};

    fn snapshot(n: usize) -> Vec<Element> {
        (0..n)
            .map(|i| {
                Element::Brush(Stroke {
                    points: vec![Point::new(i as f64, i as f64)],
                    stroke: "#000000".to_string(),
                })
            })
            .collect()
    }

    #[test]
    fn test_undo_redo_walks_every_commit() {
        let mut history = History::default();
        let n = 5;
        for i in 1..=n {
            history.push(snapshot(i));
        }

        for i in (0..n).rev() {
            assert_eq!(history.undo(), Some(snapshot(i).as_slice()));
        }
        assert!(history.current().is_empty());
        assert_eq!(history.undo(), None);
        assert_eq!(history.index(), 0);

        for i in 1..=n {
            assert_eq!(history.redo(), Some(snapshot(i).as_slice()));
        }
        assert_eq!(history.redo(), None);
        assert_eq!(history.current(), snapshot(n).as_slice());
    }

    #[test]
    fn test_append_only_keeps_redo_branch() {
        let mut history = History::new(HistoryPolicy::AppendOnly);
        history.push(snapshot(1));
        history.push(snapshot(2));
        history.undo();
        history.undo();

        history.push(snapshot(3));
        assert_eq!(history.len(), 4);
        assert_eq!(history.index(), 3);
        assert_eq!(history.current(), snapshot(3).as_slice());
        assert!(!history.can_redo());

        // Abandoned snapshots stay reachable by undo
        assert_eq!(history.undo(), Some(snapshot(2).as_slice()));
    }

    #[test]
    fn test_truncate_redo_discards_branch() {
        let mut history = History::new(HistoryPolicy::TruncateRedo);
        history.push(snapshot(1));
        history.push(snapshot(2));
        history.undo();

        history.push(snapshot(3));
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
        assert_eq!(history.undo(), Some(snapshot(1).as_slice()));
    }

    #[test]
    fn test_pointer_stays_in_bounds() {
        let mut history = History::default();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.redo(), None);
        assert_eq!(history.undo(), None);
        assert_eq!(history.len(), 1);
        assert!(!history.is_empty());
    }
}

//! Index-level view diffs.
//!
//! A `ViewDiff` tells a list presentation how to get from the previous
//! ordering of a view to the current one. Every field refers to exactly one
//! snapshot:
//!
//! - `inserted`: positions in the post-commit ordering
//! - `deleted`: positions in the pre-commit ordering
//! - `updated`: positions in the post-commit ordering
//! - `moved`: (pre-commit position, post-commit position) pairs

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

/// A member that changed position relative to the rest of the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MovedIndex {
    /// Position in the pre-commit ordering
    pub from: usize,
    /// Position in the post-commit ordering
    pub to: usize,
}

impl MovedIndex {
    #[inline]
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

/// The minimal set of index operations produced by one reconciliation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewDiff {
    inserted: BTreeSet<usize>,
    deleted: BTreeSet<usize>,
    updated: BTreeSet<usize>,
    moved: Vec<MovedIndex>,
}

impl ViewDiff {
    /// Creates an empty diff.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a diff from its parts. Moves are kept ordered by their
    /// post-commit position.
    pub fn from_parts(
        inserted: BTreeSet<usize>,
        deleted: BTreeSet<usize>,
        updated: BTreeSet<usize>,
        mut moved: Vec<MovedIndex>,
    ) -> Self {
        moved.sort_by_key(|m| (m.to, m.from));
        debug_assert!(inserted.is_disjoint(&updated));
        debug_assert!(moved.iter().all(|m| !updated.contains(&m.to) && !inserted.contains(&m.to)));
        Self {
            inserted,
            deleted,
            updated,
            moved,
        }
    }

    /// Post-commit positions of members that joined the view.
    #[inline]
    pub fn inserted(&self) -> &BTreeSet<usize> {
        &self.inserted
    }

    /// Pre-commit positions of members that left the view.
    #[inline]
    pub fn deleted(&self) -> &BTreeSet<usize> {
        &self.deleted
    }

    /// Post-commit positions of members whose content changed in place.
    #[inline]
    pub fn updated(&self) -> &BTreeSet<usize> {
        &self.updated
    }

    /// Members that changed position, ordered by post-commit position.
    #[inline]
    pub fn moved(&self) -> &[MovedIndex] {
        &self.moved
    }

    /// Calls `f(from, to)` for every move.
    pub fn enumerate_moved<F: FnMut(usize, usize)>(&self, mut f: F) {
        for m in &self.moved {
            f(m.from, m.to);
        }
    }

    /// Returns true if the diff carries no operation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
            && self.deleted.is_empty()
            && self.updated.is_empty()
            && self.moved.is_empty()
    }

    /// Returns the total number of index operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.inserted.len() + self.deleted.len() + self.updated.len() + self.moved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_view_diff_new_is_empty() {
        let diff = ViewDiff::new();
        assert!(diff.is_empty());
        assert_eq!(diff.len(), 0);
    }

    #[test]
    fn test_view_diff_moves_sorted_by_destination() {
        let diff = ViewDiff::from_parts(
            BTreeSet::new(),
            BTreeSet::new(),
            BTreeSet::new(),
            vec![MovedIndex::new(0, 3), MovedIndex::new(4, 1)],
        );
        assert_eq!(diff.moved(), &[MovedIndex::new(4, 1), MovedIndex::new(0, 3)]);

        let mut seen = vec![];
        diff.enumerate_moved(|from, to| seen.push((from, to)));
        assert_eq!(seen, vec![(4, 1), (0, 3)]);
        assert_eq!(diff.len(), 2);
        assert!(!diff.is_empty());
    }

    #[test]
    fn test_view_diff_deleted_only() {
        let diff = ViewDiff::from_parts(
            BTreeSet::new(),
            [0].into_iter().collect(),
            BTreeSet::new(),
            vec![],
        );
        assert_eq!(diff.deleted().len(), 1);
        assert!(diff.inserted().is_empty());
        assert!(!diff.is_empty());
    }
}

//! Membership deltas.
//!
//! A `Delta` records how one commit changed an entity's membership in a view:
//! `+1` when it joined, `-1` when it left, `0` when it stayed a member but has
//! to be re-placed because it was touched.

/// A differential change to a view member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delta<T> {
    /// The data being changed
    pub data: T,
    /// The differential: +1 joined, -1 left, 0 retained
    pub diff: i32,
}

impl<T> Delta<T> {
    /// Creates a new delta with the given data and diff.
    #[inline]
    pub fn new(data: T, diff: i32) -> Self {
        Self { data, diff }
    }

    /// Creates a join delta (+1).
    #[inline]
    pub fn insert(data: T) -> Self {
        Self { data, diff: 1 }
    }

    /// Creates a leave delta (-1).
    #[inline]
    pub fn delete(data: T) -> Self {
        Self { data, diff: -1 }
    }

    /// Creates a retained delta (0).
    #[inline]
    pub fn retain(data: T) -> Self {
        Self { data, diff: 0 }
    }

    /// Returns true if the member joined (diff > 0).
    #[inline]
    pub fn is_insert(&self) -> bool {
        self.diff > 0
    }

    /// Returns true if the member left (diff < 0).
    #[inline]
    pub fn is_delete(&self) -> bool {
        self.diff < 0
    }

    /// Returns true if membership did not change (diff == 0).
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.diff == 0
    }

    /// Returns a reference to the data.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Builds the delta for a membership transition, or `None` if the entity
    /// was and still is outside the view.
    pub fn transition(data: T, was_member: bool, is_member: bool) -> Option<Self> {
        match (was_member, is_member) {
            (false, false) => None,
            (false, true) => Some(Self::insert(data)),
            (true, false) => Some(Self::delete(data)),
            (true, true) => Some(Self::retain(data)),
        }
    }
}

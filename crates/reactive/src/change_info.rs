//! Per-entity change notifications.
//!
//! A `ChangeInfo` is what an entity observer receives: which aspects of the
//! observed entity changed in one commit, and the raw keys behind them.

use ripple_core::{AspectSet, EntityRef, KeySet};

/// The changes of one observed entity in one commit.
///
/// Immutable once built. Never constructed with an empty aspect set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeInfo {
    entity: EntityRef,
    aspects: AspectSet,
    keys: KeySet,
    inserted: bool,
}

impl ChangeInfo {
    /// Creates the notification for an updated entity.
    pub fn new(entity: EntityRef, aspects: AspectSet, keys: KeySet) -> Self {
        debug_assert!(!aspects.is_empty());
        Self {
            entity,
            aspects,
            keys,
            inserted: false,
        }
    }

    /// Creates the notification for an entity inserted by the commit, where
    /// every known aspect counts as changed.
    pub fn insertion(entity: EntityRef, aspects: AspectSet, keys: KeySet) -> Self {
        Self {
            entity,
            aspects,
            keys,
            inserted: true,
        }
    }

    /// The entity this notification is about.
    #[inline]
    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    #[inline]
    pub fn changed_aspects(&self) -> &AspectSet {
        &self.aspects
    }

    /// Changed keys, in the observed entity's own vocabulary.
    #[inline]
    pub fn changed_keys(&self) -> &KeySet {
        &self.keys
    }

    /// Returns true if `aspect` changed.
    #[inline]
    pub fn has_changed(&self, aspect: &str) -> bool {
        self.aspects.contains(aspect)
    }

    /// Returns true if the entity was inserted by the commit.
    #[inline]
    pub fn is_insertion(&self) -> bool {
        self.inserted
    }
}

//! Raw commit change sets.
//!
//! A `RawChange` is what the store hands over after a transaction commits:
//! which entities were inserted, updated (with the raw attribute keys that
//! changed) or deleted, and which relation edges were created or dropped.
//! It is built once with `RawChangeBuilder` and never mutated afterwards.

use crate::entity::EntityRef;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

/// A set of attribute key names.
pub type KeySet = BTreeSet<String>;

/// A set of aspect names.
pub type AspectSet = BTreeSet<String>;

/// Whether a relation edge appeared or disappeared in a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationChangeKind {
    Added,
    Removed,
}

/// A relation edge created or dropped by a commit, e.g. a participant joining
/// a conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationChange {
    /// The entity whose aspects depend on the relation
    pub observed: EntityRef,
    /// The entity on the other end of the relation
    pub related: EntityRef,
    /// Relation name as registered in the aspect map
    pub relation: String,
    /// Added or removed
    pub kind: RelationChangeKind,
}

/// The entity-level changes of one committed transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawChange {
    inserted: BTreeSet<EntityRef>,
    updated: BTreeMap<EntityRef, KeySet>,
    deleted: BTreeSet<EntityRef>,
    relations: Vec<RelationChange>,
}

impl RawChange {
    /// Starts building a change set.
    #[inline]
    pub fn builder() -> RawChangeBuilder {
        RawChangeBuilder::default()
    }

    /// Entities inserted by the commit.
    #[inline]
    pub fn inserted(&self) -> &BTreeSet<EntityRef> {
        &self.inserted
    }

    /// Entities updated by the commit with their changed raw keys.
    #[inline]
    pub fn updated(&self) -> &BTreeMap<EntityRef, KeySet> {
        &self.updated
    }

    /// Entities deleted by the commit.
    #[inline]
    pub fn deleted(&self) -> &BTreeSet<EntityRef> {
        &self.deleted
    }

    /// Relation edges created or dropped by the commit, in commit order.
    #[inline]
    pub fn relations(&self) -> &[RelationChange] {
        &self.relations
    }

    /// Returns the changed keys of an updated entity.
    pub fn changed_keys(&self, entity: &EntityRef) -> Option<&KeySet> {
        self.updated.get(entity)
    }

    /// Returns true if the commit carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
            && self.updated.is_empty()
            && self.deleted.is_empty()
            && self.relations.is_empty()
    }

    /// Returns the number of distinct entities touched by the commit.
    pub fn entity_count(&self) -> usize {
        let mut all: BTreeSet<&EntityRef> = self.inserted.iter().collect();
        all.extend(self.updated.keys());
        all.extend(self.deleted.iter());
        all.len()
    }
}

/// Builder for `RawChange`.
#[derive(Debug, Default)]
pub struct RawChangeBuilder {
    change: RawChange,
}

impl RawChangeBuilder {
    /// Records an inserted entity.
    pub fn insert(mut self, entity: EntityRef) -> Self {
        self.change.inserted.insert(entity);
        self
    }

    /// Records an updated entity. Keys accumulate over repeated calls.
    pub fn update<I, K>(mut self, entity: EntityRef, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.change
            .updated
            .entry(entity)
            .or_default()
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// Records a deleted entity.
    pub fn delete(mut self, entity: EntityRef) -> Self {
        self.change.deleted.insert(entity);
        self
    }

    /// Records a relation edge created by the commit.
    pub fn relate(self, observed: EntityRef, related: EntityRef, relation: impl Into<String>) -> Self {
        self.relation(observed, related, relation.into(), RelationChangeKind::Added)
    }

    /// Records a relation edge dropped by the commit.
    pub fn unrelate(self, observed: EntityRef, related: EntityRef, relation: impl Into<String>) -> Self {
        self.relation(observed, related, relation.into(), RelationChangeKind::Removed)
    }

    fn relation(
        mut self,
        observed: EntityRef,
        related: EntityRef,
        relation: String,
        kind: RelationChangeKind,
    ) -> Self {
        self.change.relations.push(RelationChange {
            observed,
            related,
            relation,
            kind,
        });
        self
    }

    /// Finishes the change set.
    ///
    /// Deleted entities are dropped from the updated map. An entity both
    /// inserted and deleted in the same commit never existed outside of it and
    /// is removed from both sets.
    pub fn build(mut self) -> RawChange {
        let deleted = core::mem::take(&mut self.change.deleted);
        for entity in deleted {
            self.change.updated.remove(&entity);
            if !self.change.inserted.remove(&entity) {
                self.change.deleted.insert(entity);
            }
        }
        self.change
    }
}

//! Change-set collection.
//!
//! Turns one `RawChange` into the set of observed entities it affects, with
//! the keys that changed in each entity's own vocabulary. Relation edges the
//! commit created or dropped are applied to the dependency graph on the way.

use crate::aspect::AspectMap;
use crate::dependency::DependencyGraph;
use ripple_core::{EntityRef, KeySet, RawChange, RelationChangeKind};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// What one commit means for observed entities.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectedChanges {
    /// Observed entity -> merged changed keys
    pub affected: BTreeMap<EntityRef, KeySet>,
    /// Entities inserted by the commit
    pub inserted: BTreeSet<EntityRef>,
    /// Entities deleted by the commit
    pub deleted: BTreeSet<EntityRef>,
    /// Entities whose view membership or position may have changed
    pub touched: BTreeSet<EntityRef>,
}

impl CollectedChanges {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `keys` into the entry of `entity` and marks it touched.
    pub fn add_keys<I>(&mut self, entity: EntityRef, keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.affected.entry(entity).or_default().extend(keys);
        self.touched.insert(entity);
    }

    /// Returns true if the commit affects nothing.
    pub fn is_empty(&self) -> bool {
        self.affected.is_empty()
            && self.inserted.is_empty()
            && self.deleted.is_empty()
            && self.touched.is_empty()
    }
}

/// Collects the observed-entity changes of `raw`.
///
/// Application order: relation additions, own updates, related updates,
/// relation removals, deletions. A related entity's keys only reach
/// dependents through edges that exist at that point.
pub fn collect(raw: &RawChange, graph: &mut DependencyGraph, map: &AspectMap) -> CollectedChanges {
    let mut out = CollectedChanges {
        inserted: raw.inserted().clone(),
        deleted: raw.deleted().clone(),
        ..CollectedChanges::default()
    };

    for change in raw.relations() {
        if change.kind != RelationChangeKind::Added {
            continue;
        }
        if map.relation(&change.relation).is_none() {
            debug!("Relation {} is not mapped", change.relation);
        }
        graph.register_dependency(change.observed, change.related, &change.relation);
        out.add_keys(change.observed, map.membership_keys(&change.relation));
    }

    for (entity, keys) in raw.updated() {
        out.add_keys(*entity, keys.iter().cloned());
    }

    for (related, keys) in raw.updated() {
        for (observed, relation) in graph.dependents_of(related) {
            let translated: KeySet = keys
                .iter()
                .flat_map(|key| map.translate(&relation, key))
                .collect();
            out.add_keys(observed, translated);
        }
    }

    for change in raw.relations() {
        if change.kind != RelationChangeKind::Removed {
            continue;
        }
        if map.relation(&change.relation).is_none() {
            debug!("Relation {} is not mapped", change.relation);
        }
        graph.remove_dependency(change.observed, change.related, &change.relation);
        out.add_keys(change.observed, map.membership_keys(&change.relation));
    }

    for deleted in raw.deleted() {
        for edge in graph.forget(deleted) {
            if edge.related == *deleted {
                out.add_keys(edge.observed, map.membership_keys(&edge.relation));
            }
        }
    }
    for deleted in raw.deleted() {
        out.affected.remove(deleted);
        out.touched.remove(deleted);
    }

    out
}

//! Dependency graph between observed and related entities.
//!
//! An observed entity (a conversation) depends on related entities (its
//! participants) through a named relation. The graph is kept in both
//! directions so that a change of a related entity finds its dependents
//! without a scan.

use hashbrown::HashMap;
use ripple_core::EntityRef;
use std::collections::BTreeSet;

/// One `observed -> related` edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyEdge {
    pub observed: EntityRef,
    pub related: EntityRef,
    pub relation: String,
}

impl DependencyEdge {
    pub fn new(observed: EntityRef, related: EntityRef, relation: impl Into<String>) -> Self {
        Self {
            observed,
            related,
            relation: relation.into(),
        }
    }
}

type Adjacency = HashMap<EntityRef, BTreeSet<(EntityRef, String)>>;

/// Bidirectional relation index.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// observed -> (related, relation)
    forward: Adjacency,
    /// related -> (observed, relation)
    reverse: Adjacency,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an edge. Returns false if it already existed.
    pub fn register_dependency(
        &mut self,
        observed: EntityRef,
        related: EntityRef,
        relation: &str,
    ) -> bool {
        let added = self
            .forward
            .entry(observed)
            .or_default()
            .insert((related, relation.to_string()));
        if added {
            self.reverse
                .entry(related)
                .or_default()
                .insert((observed, relation.to_string()));
        }
        added
    }

    /// Removes an edge. Returns false if it was not present.
    pub fn remove_dependency(
        &mut self,
        observed: EntityRef,
        related: EntityRef,
        relation: &str,
    ) -> bool {
        let key = (related, relation.to_string());
        let removed = remove_from(&mut self.forward, observed, &key);
        if removed {
            remove_from(&mut self.reverse, related, &(observed, key.1));
        }
        removed
    }

    /// Entities `observed` depends on, under any relation.
    pub fn related_entities(&self, observed: &EntityRef) -> BTreeSet<EntityRef> {
        self.forward
            .get(observed)
            .map(|edges| edges.iter().map(|(e, _)| *e).collect())
            .unwrap_or_default()
    }

    /// Observed entities that depend on `related`, with the relation name.
    pub fn dependents_of(&self, related: &EntityRef) -> Vec<(EntityRef, String)> {
        self.reverse
            .get(related)
            .map(|edges| edges.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every edge touching `entity`, on either side.
    pub fn edges_of(&self, entity: &EntityRef) -> Vec<DependencyEdge> {
        let mut edges: Vec<DependencyEdge> = Vec::new();
        if let Some(out) = self.forward.get(entity) {
            edges.extend(
                out.iter()
                    .map(|(related, relation)| DependencyEdge::new(*entity, *related, relation.clone())),
            );
        }
        if let Some(inc) = self.reverse.get(entity) {
            edges.extend(
                inc.iter()
                    .map(|(observed, relation)| DependencyEdge::new(*observed, *entity, relation.clone())),
            );
        }
        edges.sort();
        edges.dedup();
        edges
    }

    /// Drops every edge touching `entity` and returns them.
    pub fn forget(&mut self, entity: &EntityRef) -> Vec<DependencyEdge> {
        let edges = self.edges_of(entity);
        for edge in &edges {
            self.remove_dependency(edge.observed, edge.related, &edge.relation);
        }
        edges
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// Returns true if there are no edges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Removes every edge.
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }
}

fn remove_from(map: &mut Adjacency, from: EntityRef, edge: &(EntityRef, String)) -> bool {
    let Some(edges) = map.get_mut(&from) else {
        return false;
    };
    let removed = edges.remove(edge);
    if edges.is_empty() {
        map.remove(&from);
    }
    removed
}

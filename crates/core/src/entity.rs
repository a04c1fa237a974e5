//! Entity identities.
//!
//! An `EntityRef` is the store's stable handle for one object. The observation
//! layer never creates or destroys entities, it only uses these handles as map
//! keys and as the final tie-break when ordering views.

use core::fmt;

/// Store-assigned numeric identifier, unique within an entity kind.
pub type EntityId = u64;

/// The schema-level type of an entity (e.g. `"conversation"`, `"user"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKind(&'static str);

impl EntityKind {
    /// Creates a kind from its schema name.
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the schema name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A stable, opaque reference to a store entity.
///
/// Ordering is by kind first, then id. Views use it to break comparator ties,
/// so two entities that compare equal always keep the same relative order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    kind: EntityKind,
    id: EntityId,
}

impl EntityRef {
    /// Creates a reference from a kind and a store id.
    #[inline]
    pub const fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }

    /// Returns the entity kind.
    #[inline]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the store id.
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns true if this entity is of the given kind.
    #[inline]
    pub fn is(&self, kind: EntityKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

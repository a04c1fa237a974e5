//! View queries.
//!
//! The store's query layer owns predicate and comparator evaluation. A view
//! only sees it through `ViewQuery`, which also names the view so the same
//! query can be looked up again.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use ripple_core::{EntityKind, EntityRef};
use thiserror::Error;

/// Identity of a view: two queries with the same key describe the same
/// predicate and comparator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewKey(String);

impl ViewKey {
    /// Creates a view key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// A predicate or comparator failed for one entity.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("evaluation failed for {entity}: {message}")]
pub struct EvalError {
    /// The entity whose attributes could not be evaluated
    pub entity: EntityRef,
    /// Description supplied by the query layer
    pub message: String,
}

impl EvalError {
    /// Creates an evaluation error for an entity.
    pub fn new(entity: EntityRef, message: impl Into<String>) -> Self {
        Self {
            entity,
            message: message.into(),
        }
    }
}

/// Predicate and comparator of a live view, evaluated against the store's
/// committed state.
pub trait ViewQuery {
    /// The view's identity.
    fn key(&self) -> ViewKey;

    /// The kind of entity the view lists. Entities of other kinds are never
    /// evaluated.
    fn kind(&self) -> EntityKind;

    /// Every entity of `kind()` currently in the store. Used to build the
    /// initial baseline.
    fn universe(&self) -> Vec<EntityRef>;

    /// Whether the entity belongs to the view.
    fn matches(&self, entity: EntityRef) -> Result<bool, EvalError>;

    /// Orders two members. Ties are broken by `EntityRef` order by the view.
    fn compare(&self, a: EntityRef, b: EntityRef) -> Result<Ordering, EvalError>;

    /// Whether a change of `aspect` counts as a content update for rows of
    /// this view. Defaults to every aspect.
    fn reports_aspect(&self, _aspect: &str) -> bool {
        true
    }
}

//! Ripple Core - Entity identities and commit change sets.
//!
//! This crate provides the foundational types shared by the observation layer:
//!
//! - `EntityKind` / `EntityRef`: stable identities of store entities
//! - `RawChange`: what one committed transaction inserted, updated and deleted
//! - `RelationChange`: relation edges created or dropped by a commit
//! - `Error`: error types for the few fallible operations
//!
//! # Example
//!
//! ```rust
//! use ripple_core::{EntityKind, EntityRef, RawChange};
//!
//! const CONVERSATION: EntityKind = EntityKind::new("conversation");
//!
//! let conversation = EntityRef::new(CONVERSATION, 1);
//! let change = RawChange::builder()
//!     .update(conversation, ["userDefinedName"])
//!     .build();
//!
//! assert!(change.changed_keys(&conversation).unwrap().contains("userDefinedName"));
//! ```

#![no_std]

extern crate alloc;

mod change;
mod entity;
mod error;

pub use change::{AspectSet, KeySet, RawChange, RawChangeBuilder, RelationChange, RelationChangeKind};
pub use entity::{EntityId, EntityKind, EntityRef};
pub use error::{Error, Result};

//! Ripple Incremental - Ordered view reconciliation.
//!
//! This crate keeps live, filtered and sorted views over store entities up to
//! date one commit at a time, and computes the index-level diff a list
//! presentation needs to follow along without re-reading the whole view.
//!
//! # Core Concepts
//!
//! - `ViewQuery`: predicate + comparator supplied by the store's query layer
//! - `OrderedView`: the current ordering of a query, kept as the next baseline
//! - `ViewCommit`: the entities one commit inserted, deleted or touched
//! - `ViewDiff`: inserted / deleted / updated positions and moved pairs
//! - `Delta<T>`: membership transition of one entity (+1 / -1 / 0)
//!
//! # Example
//!
//! ```ignore
//! use ripple_incremental::{OrderedView, ViewCommit};
//!
//! let mut view = OrderedView::new(query);
//! view.rebuild();
//!
//! // conversation 2 got a new last-modified date
//! let result = view.reconcile(&ViewCommit::new().change(conversation_2));
//! result.diff.enumerate_moved(|from, to| println!("{} -> {}", from, to));
//! ```

#![no_std]

extern crate alloc;

pub mod delta;
pub mod diff;
mod moves;
pub mod query;
pub mod view;

pub use delta::Delta;
pub use diff::{MovedIndex, ViewDiff};
pub use query::{EvalError, ViewKey, ViewQuery};
pub use view::{OrderedView, Reconciliation, ViewCommit};

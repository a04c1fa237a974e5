//! Ripple Reactive - Change observation for a transactional object store.
//!
//! This crate turns the raw change sets of committed transactions into
//! semantic notifications: which aspects of an observed entity changed, and
//! how the ordering of a live view moved.
//!
//! # Core Concepts
//!
//! - `AspectMap`: static table from raw keys to named aspects, and from keys of
//!   related entities to keys of the observed entity
//! - `DependencyGraph`: which observed entities depend on which related ones
//! - `collect` / `aggregate`: `RawChange` -> affected keys -> `ChangeInfo`
//! - `ObservableViews`: the live `OrderedView`s, reconciled per commit
//! - `ObserverRegistry` / `dispatch`: weakly held observers, deferred
//!   (un)subscription during a dispatch pass
//! - `ObserverCenter`: the context object tying the pipeline together
//!
//! # Example
//!
//! ```ignore
//! use ripple_reactive::{AspectMap, CenterConfig, ChangeInfo, ObserverCenter};
//! use std::rc::Rc;
//! use std::sync::Arc;
//!
//! let center = ObserverCenter::new(Arc::new(aspects), CenterConfig::default());
//!
//! let observer = Rc::new(|info: &ChangeInfo| {
//!     if info.has_changed("nameChanged") {
//!         println!("{} was renamed", info.entity());
//!     }
//! });
//! let token = center.subscribe_entity(&observer, conversation);
//!
//! center.process_commit(RawChange::builder().update(conversation, ["userDefinedName"]).build());
//! center.unsubscribe(token);
//! ```

pub mod aggregate;
pub mod aspect;
pub mod center;
pub mod change_info;
pub mod collect;
pub mod config;
pub mod dependency;
pub mod dispatch;
pub mod notify;
pub mod observable;
pub mod observer;
pub mod pipeline;
pub mod subscription;

pub use aggregate::{aggregate, aspects_for_keys};
pub use aspect::{AspectMap, AspectMapBuilder, RelationSpec};
pub use center::ObserverCenter;
pub use change_info::ChangeInfo;
pub use collect::{collect, CollectedChanges};
pub use config::{CenterConfig, CenterConfigBuilder, ViewRetention};
pub use dependency::{DependencyEdge, DependencyGraph};
pub use dispatch::{dispatch, DispatchReport};
pub use notify::ObserverRegistry;
pub use observable::{ObservableViews, ViewHandle, ViewsOutcome};
pub use observer::{EntityObserver, ViewObserver};
pub use pipeline::CommitSender;
pub use subscription::{ObserverRef, Subscription, SubscriptionToken, Target};

// Re-export commonly used types from dependencies
pub use ripple_core::{AspectSet, EntityKind, EntityRef, Error, KeySet, RawChange, Result};
pub use ripple_incremental::{EvalError, MovedIndex, ViewDiff, ViewKey, ViewQuery};

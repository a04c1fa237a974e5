//! Subscription tokens and records.
//!
//! Every subscribe call yields a fresh `SubscriptionToken`. The record behind
//! it holds the observer weakly together with the exact target it watches.

use crate::observer::{EntityObserver, ViewObserver};
use ripple_core::EntityRef;
use ripple_incremental::ViewKey;
use std::fmt;
use std::rc::{Rc, Weak};

/// Opaque handle returned by subscribe; passing it to unsubscribe detaches
/// the observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    #[inline]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id, for logging.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// What a subscription watches.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Entity(EntityRef),
    View(ViewKey),
}

/// The weakly held observer of a subscription.
#[derive(Clone)]
pub enum ObserverRef {
    Entity(Weak<dyn EntityObserver>),
    View(Weak<dyn ViewObserver>),
}

impl ObserverRef {
    /// Returns true if the observer has not been dropped.
    #[inline]
    pub fn is_alive(&self) -> bool {
        match self {
            ObserverRef::Entity(w) => w.strong_count() > 0,
            ObserverRef::View(w) => w.strong_count() > 0,
        }
    }
}

impl fmt::Debug for ObserverRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ObserverRef::Entity(_) => "Entity",
            ObserverRef::View(_) => "View",
        };
        f.debug_struct("ObserverRef")
            .field("kind", &kind)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// A registered subscription.
#[derive(Clone, Debug)]
pub struct Subscription {
    token: SubscriptionToken,
    target: Target,
    observer: ObserverRef,
}

impl Subscription {
    /// Creates an entity subscription.
    pub fn entity(
        token: SubscriptionToken,
        entity: EntityRef,
        observer: Weak<dyn EntityObserver>,
    ) -> Self {
        Self {
            token,
            target: Target::Entity(entity),
            observer: ObserverRef::Entity(observer),
        }
    }

    /// Creates a view subscription.
    pub fn view(token: SubscriptionToken, view: ViewKey, observer: Weak<dyn ViewObserver>) -> Self {
        Self {
            token,
            target: Target::View(view),
            observer: ObserverRef::View(observer),
        }
    }

    #[inline]
    pub fn token(&self) -> SubscriptionToken {
        self.token
    }

    #[inline]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Returns true if the observer is still alive.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.observer.is_alive()
    }

    /// Upgrades the entity observer, if this is a live entity subscription.
    pub fn entity_observer(&self) -> Option<Rc<dyn EntityObserver>> {
        match &self.observer {
            ObserverRef::Entity(w) => w.upgrade(),
            ObserverRef::View(_) => None,
        }
    }

    /// Upgrades the view observer, if this is a live view subscription.
    pub fn view_observer(&self) -> Option<Rc<dyn ViewObserver>> {
        match &self.observer {
            ObserverRef::View(w) => w.upgrade(),
            ObserverRef::Entity(_) => None,
        }
    }
}

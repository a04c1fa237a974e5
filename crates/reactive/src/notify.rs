//! Observer registry.
//!
//! `ObserverRegistry` tracks entity and view subscriptions and hands out
//! snapshots of the subscribers of a target in subscription order. Observers
//! are held weakly; dead ones are swept by `cleanup()`.
//!
//! While a dispatch pass is running, subscribe and unsubscribe calls are
//! queued and applied by `end_dispatch()`, so the set of receivers of a pass
//! is fixed when it starts.

use crate::observer::{EntityObserver, ViewObserver};
use crate::subscription::{Subscription, SubscriptionToken, Target};
use hashbrown::{HashMap, HashSet};
use ripple_core::EntityRef;
use ripple_incremental::ViewKey;
use std::rc::Weak;

#[derive(Debug)]
enum Deferred {
    Subscribe(Subscription),
    Unsubscribe(SubscriptionToken),
}

/// Routes targets to their subscriptions.
#[derive(Debug)]
pub struct ObserverRegistry {
    /// Token -> subscription
    subscriptions: HashMap<SubscriptionToken, Subscription>,
    /// Target -> tokens, in subscription order
    by_target: HashMap<Target, Vec<SubscriptionToken>>,
    /// Next token id to assign
    next_id: u64,
    dispatching: bool,
    deferred: Vec<Deferred>,
    /// Tokens with a queued unsubscribe
    detaching: HashSet<SubscriptionToken>,
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObserverRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            by_target: HashMap::new(),
            next_id: 1,
            dispatching: false,
            deferred: Vec::new(),
            detaching: HashSet::new(),
        }
    }

    /// Subscribes an observer to one entity.
    pub fn subscribe_entity(
        &mut self,
        observer: Weak<dyn EntityObserver>,
        entity: EntityRef,
    ) -> SubscriptionToken {
        let token = self.next_token();
        self.add(Subscription::entity(token, entity, observer));
        token
    }

    /// Subscribes an observer to one view.
    pub fn subscribe_view(
        &mut self,
        observer: Weak<dyn ViewObserver>,
        view: ViewKey,
    ) -> SubscriptionToken {
        let token = self.next_token();
        self.add(Subscription::view(token, view, observer));
        token
    }

    /// Detaches a subscription.
    ///
    /// Returns false for unknown or already detached tokens.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        if self.dispatching {
            if !self.is_subscribed(token) {
                return false;
            }
            self.detaching.insert(token);
            self.deferred.push(Deferred::Unsubscribe(token));
            return true;
        }
        self.remove(token).is_some()
    }

    /// Returns true if `token` is registered, or queued for registration, and
    /// not queued for removal.
    pub fn is_subscribed(&self, token: SubscriptionToken) -> bool {
        if self.detaching.contains(&token) {
            return false;
        }
        self.subscriptions.contains_key(&token)
            || self.deferred.iter().any(|op| match op {
                Deferred::Subscribe(sub) => sub.token() == token,
                Deferred::Unsubscribe(_) => false,
            })
    }

    /// The target of a registered subscription.
    pub fn target_of(&self, token: SubscriptionToken) -> Option<&Target> {
        self.subscriptions.get(&token).map(Subscription::target)
    }

    /// Snapshot of the subscriptions of `target`, in subscription order.
    pub fn subscriptions_for(&self, target: &Target) -> Vec<Subscription> {
        self.by_target
            .get(target)
            .map(|tokens| {
                tokens
                    .iter()
                    .filter_map(|token| self.subscriptions.get(token).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns true if `entity` has at least one live subscriber.
    pub fn has_entity_subscribers(&self, entity: EntityRef) -> bool {
        self.live_count(&Target::Entity(entity)) > 0
    }

    /// Returns the number of live subscribers of a view.
    pub fn view_subscriber_count(&self, view: &ViewKey) -> usize {
        self.live_count(&Target::View(view.clone()))
    }

    /// Marks the start of a dispatch pass.
    pub fn begin_dispatch(&mut self) {
        debug_assert!(!self.dispatching, "dispatch passes do not nest");
        self.dispatching = true;
    }

    /// Ends a dispatch pass, applies queued operations in call order and
    /// sweeps dead observers.
    pub fn end_dispatch(&mut self) {
        self.dispatching = false;
        self.detaching.clear();
        for op in std::mem::take(&mut self.deferred) {
            match op {
                Deferred::Subscribe(sub) => self.insert(sub),
                Deferred::Unsubscribe(token) => {
                    self.remove(token);
                }
            }
        }
        self.cleanup();
    }

    /// Returns true while a dispatch pass is running.
    #[inline]
    pub fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    /// Removes every subscription to `entity`. Returns the number removed.
    pub fn purge_entity(&mut self, entity: EntityRef) -> usize {
        let tokens = self
            .by_target
            .get(&Target::Entity(entity))
            .cloned()
            .unwrap_or_default();
        tokens.into_iter().filter(|t| self.unsubscribe(*t)).count()
    }

    /// Removes subscriptions whose observer was dropped. Returns the number
    /// removed.
    pub fn cleanup(&mut self) -> usize {
        if self.dispatching {
            return 0;
        }
        let dead: Vec<SubscriptionToken> = self
            .subscriptions
            .values()
            .filter(|sub| !sub.is_alive())
            .map(Subscription::token)
            .collect();
        for token in &dead {
            self.remove(*token);
        }
        dead.len()
    }

    /// Returns the number of registered subscriptions.
    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns true if there are no subscriptions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Removes every subscription.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
        self.by_target.clear();
        self.deferred.clear();
        self.detaching.clear();
    }

    fn next_token(&mut self) -> SubscriptionToken {
        let token = SubscriptionToken::new(self.next_id);
        self.next_id += 1;
        token
    }

    fn add(&mut self, sub: Subscription) {
        if self.dispatching {
            self.deferred.push(Deferred::Subscribe(sub));
        } else {
            self.insert(sub);
        }
    }

    fn insert(&mut self, sub: Subscription) {
        self.by_target
            .entry(sub.target().clone())
            .or_default()
            .push(sub.token());
        self.subscriptions.insert(sub.token(), sub);
    }

    fn remove(&mut self, token: SubscriptionToken) -> Option<Subscription> {
        let sub = self.subscriptions.remove(&token)?;
        if let Some(tokens) = self.by_target.get_mut(sub.target()) {
            tokens.retain(|t| *t != token);
            if tokens.is_empty() {
                self.by_target.remove(sub.target());
            }
        }
        Some(sub)
    }

    fn live_count(&self, target: &Target) -> usize {
        self.by_target
            .get(target)
            .map(|tokens| {
                tokens
                    .iter()
                    .filter_map(|t| self.subscriptions.get(t))
                    .filter(|sub| sub.is_alive())
                    .count()
            })
            .unwrap_or(0)
    }
}

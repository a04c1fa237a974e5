//! The observer center.
//!
//! `ObserverCenter` is the one object a store talks to. It owns the
//! dependency graph, the live views and the observer registry, and runs every
//! commit through collection, aggregation, view reconciliation and dispatch.
//!
//! The center is single threaded (`!Send`). Commits made on other threads
//! travel through a `CommitSender` and are processed by `process_pending()`.

use crate::aggregate::aggregate;
use crate::aspect::AspectMap;
use crate::collect::collect;
use crate::config::{CenterConfig, ViewRetention};
use crate::dependency::DependencyGraph;
use crate::dispatch::dispatch;
use crate::notify::ObserverRegistry;
use crate::observable::{ObservableViews, ViewHandle};
use crate::observer::{EntityObserver, ViewObserver};
use crate::pipeline::{CommitQueue, CommitSender};
use crate::subscription::{SubscriptionToken, Target};
use ripple_core::{EntityRef, KeySet, RawChange};
use ripple_incremental::{EvalError, ViewKey, ViewQuery};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Processing,
}

/// Resets the phase when processing ends, even on panic.
struct PhaseGuard<'a>(&'a Cell<Phase>);

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.0.set(Phase::Idle);
    }
}

/// Change observation context for one store.
///
/// # Example
///
/// ```ignore
/// let center = ObserverCenter::new(Arc::new(aspects), CenterConfig::default());
/// let list = center.create_or_get_view(Rc::new(ActiveConversations::new(store)));
/// let token = center.subscribe_view(&list_observer, &list);
///
/// center.process_commit(
///     RawChange::builder().update(conversation, ["lastModifiedDate"]).build(),
/// );
/// ```
pub struct ObserverCenter {
    aspects: Arc<AspectMap>,
    config: CenterConfig,
    graph: RefCell<DependencyGraph>,
    views: RefCell<ObservableViews>,
    registry: RefCell<ObserverRegistry>,
    phase: Cell<Phase>,
    /// Commits submitted while another one was being processed
    backlog: RefCell<VecDeque<RawChange>>,
    /// Keys from dependency removals, folded into the next commit
    staged: RefCell<BTreeMap<EntityRef, KeySet>>,
    queue: CommitQueue,
    commits: Cell<u64>,
}

impl ObserverCenter {
    /// Creates a center over a frozen aspect map.
    pub fn new(aspects: Arc<AspectMap>, config: CenterConfig) -> Self {
        Self {
            aspects,
            config,
            graph: RefCell::new(DependencyGraph::new()),
            views: RefCell::new(ObservableViews::new()),
            registry: RefCell::new(ObserverRegistry::new()),
            phase: Cell::new(Phase::Idle),
            backlog: RefCell::new(VecDeque::new()),
            staged: RefCell::new(BTreeMap::new()),
            queue: CommitQueue::new(),
            commits: Cell::new(0),
        }
    }

    #[inline]
    pub fn config(&self) -> &CenterConfig {
        &self.config
    }

    #[inline]
    pub fn aspects(&self) -> &Arc<AspectMap> {
        &self.aspects
    }

    /// Returns the view for `query`, building its baseline if it does not
    /// exist yet.
    ///
    /// With `ViewRetention::DropWhenUnobserved` a view nobody subscribes to is
    /// torn down at the end of the next commit.
    pub fn create_or_get_view(&self, query: Rc<dyn ViewQuery>) -> ViewHandle {
        let (handle, failures) = self.views.borrow_mut().create_or_get(query);
        log_failures(handle.key(), &failures);
        handle
    }

    /// Subscribes to the changes of one entity.
    pub fn subscribe_entity<O>(&self, observer: &Rc<O>, entity: EntityRef) -> SubscriptionToken
    where
        O: EntityObserver + 'static,
    {
        let weak: Weak<O> = Rc::downgrade(observer);
        let weak: Weak<dyn EntityObserver> = weak;
        self.registry.borrow_mut().subscribe_entity(weak, entity)
    }

    /// Subscribes to the diffs of a view, recreating it if it was torn down.
    pub fn subscribe_view<O>(&self, observer: &Rc<O>, view: &ViewHandle) -> SubscriptionToken
    where
        O: ViewObserver + 'static,
    {
        if !self.views.borrow().contains(view.key()) {
            self.create_or_get_view(view.query().clone());
        }
        let weak: Weak<O> = Rc::downgrade(observer);
        let weak: Weak<dyn ViewObserver> = weak;
        self.registry
            .borrow_mut()
            .subscribe_view(weak, view.key().clone())
    }

    /// Detaches a subscription. Unknown or already detached tokens are a
    /// no-op returning false.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let target = self.registry.borrow().target_of(token).cloned();
        let removed = self.registry.borrow_mut().unsubscribe(token);
        if removed && self.phase.get() == Phase::Idle {
            if let Some(Target::View(key)) = target {
                self.sweep_view(&key);
            }
        }
        removed
    }

    /// Records that `observed` depends on `related`. Does not notify by
    /// itself; the edge takes effect for subsequent commits.
    pub fn register_dependency(&self, observed: EntityRef, related: EntityRef, relation: &str) -> bool {
        self.graph
            .borrow_mut()
            .register_dependency(observed, related, relation)
    }

    /// Drops a dependency. The relation's membership keys are reported for
    /// `observed` with the next processed commit.
    pub fn remove_dependency(&self, observed: EntityRef, related: EntityRef, relation: &str) -> bool {
        let removed = self
            .graph
            .borrow_mut()
            .remove_dependency(observed, related, relation);
        if removed {
            self.staged
                .borrow_mut()
                .entry(observed)
                .or_default()
                .extend(self.aspects.membership_keys(relation));
        }
        removed
    }

    /// Entities `observed` currently depends on.
    pub fn related_entities(&self, observed: &EntityRef) -> BTreeSet<EntityRef> {
        self.graph.borrow().related_entities(observed)
    }

    /// Processes one commit and notifies observers.
    ///
    /// A commit submitted while another is being processed (typically by an
    /// observer) is queued and processed right after the current one.
    pub fn process_commit(&self, change: RawChange) {
        if self.phase.get() == Phase::Processing {
            debug!("Deferring commit submitted during processing");
            self.backlog.borrow_mut().push_back(change);
            return;
        }

        self.phase.set(Phase::Processing);
        let _guard = PhaseGuard(&self.phase);

        let mut pending = Some(change);
        while let Some(change) = pending.take() {
            self.run_commit(&change);
            pending = self.backlog.borrow_mut().pop_front();
        }
    }

    /// Returns a sender other threads can submit commits through.
    pub fn sender(&self) -> CommitSender {
        self.queue.sender()
    }

    /// Processes every commit queued through a `CommitSender`, in order.
    /// Returns the number processed.
    pub fn process_pending(&self) -> usize {
        let mut processed = 0;
        while let Some(change) = self.queue.try_next() {
            self.process_commit(change);
            processed += 1;
        }
        processed
    }

    /// Current ordering of a view; empty if the view is not live.
    pub fn view_entities(&self, view: &ViewHandle) -> Vec<EntityRef> {
        self.views
            .borrow()
            .get(view.key())
            .map(|v| v.entities().to_vec())
            .unwrap_or_default()
    }

    /// Returns true if the view is live.
    pub fn has_view(&self, view: &ViewHandle) -> bool {
        self.views.borrow().contains(view.key())
    }

    /// Returns the number of live views.
    pub fn view_count(&self) -> usize {
        self.views.borrow().len()
    }

    /// Returns the number of registered subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Returns the number of commits processed so far.
    pub fn commit_count(&self) -> u64 {
        self.commits.get()
    }

    fn run_commit(&self, change: &RawChange) {
        let seq = self.commits.get() + 1;
        self.commits.set(seq);

        let mut collected = collect(change, &mut self.graph.borrow_mut(), &self.aspects);
        let staged = std::mem::take(&mut *self.staged.borrow_mut());
        for (entity, keys) in staged {
            if !collected.deleted.contains(&entity) {
                collected.add_keys(entity, keys);
            }
        }

        let infos = aggregate(&collected, &self.aspects, self.config.notify_inserted);
        let outcome = self.views.borrow_mut().reconcile_all(&collected, &infos);
        for failure in &outcome.failures {
            warn!("Commit {}: {}", seq, failure);
        }
        debug!(
            "Commit {}: {} affected, {} notifications, {} view diffs",
            seq,
            collected.affected.len(),
            infos.len(),
            outcome.diffs.len()
        );

        let report = dispatch(&self.registry, &infos, &outcome.diffs);
        if report.skipped > 0 {
            debug!("Commit {}: skipped {} dropped observers", seq, report.skipped);
        }

        {
            let mut registry = self.registry.borrow_mut();
            for entity in &collected.deleted {
                registry.purge_entity(*entity);
            }
        }
        self.sweep_views();
    }

    fn sweep_views(&self) {
        if self.config.view_retention == ViewRetention::Retain {
            return;
        }
        let keys = self.views.borrow().keys();
        for key in keys {
            self.sweep_view(&key);
        }
    }

    fn sweep_view(&self, key: &ViewKey) {
        if self.config.view_retention == ViewRetention::Retain {
            return;
        }
        if self.registry.borrow().view_subscriber_count(key) > 0 {
            return;
        }
        if self.views.borrow_mut().remove(key).is_some() {
            debug!("Tearing down unobserved view {}", key);
        }
    }
}

fn log_failures(view: &ViewKey, failures: &[EvalError]) {
    for failure in failures {
        warn!("View {}: {}", view, failure);
    }
}

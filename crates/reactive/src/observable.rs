//! Observable ordered views.
//!
//! `ObservableViews` owns the live `OrderedView`s, one per view key, and
//! reconciles all of them with each commit.

use crate::change_info::ChangeInfo;
use crate::collect::CollectedChanges;
use ripple_core::EntityRef;
use ripple_incremental::{EvalError, OrderedView, ViewCommit, ViewDiff, ViewKey, ViewQuery};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

/// Handle to a view, returned by view creation.
///
/// Carries the query so a view torn down for lack of observers can be
/// recreated by a later subscription.
#[derive(Clone)]
pub struct ViewHandle {
    key: ViewKey,
    query: Rc<dyn ViewQuery>,
}

impl ViewHandle {
    pub(crate) fn new(query: Rc<dyn ViewQuery>) -> Self {
        Self {
            key: query.key(),
            query,
        }
    }

    /// The view's identity.
    #[inline]
    pub fn key(&self) -> &ViewKey {
        &self.key
    }

    #[inline]
    pub fn query(&self) -> &Rc<dyn ViewQuery> {
        &self.query
    }
}

impl fmt::Debug for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewHandle").field("key", &self.key).finish()
    }
}

impl PartialEq for ViewHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ViewHandle {}

/// Diffs and failures of one commit across all views.
#[derive(Clone, Debug, Default)]
pub struct ViewsOutcome {
    /// Non-empty diffs, ordered by view key
    pub diffs: Vec<(ViewKey, ViewDiff)>,
    /// Evaluation failures of every view
    pub failures: Vec<EvalError>,
}

/// The live views, keyed by view key.
#[derive(Default)]
pub struct ObservableViews {
    views: BTreeMap<ViewKey, OrderedView>,
}

impl ObservableViews {
    /// Creates an empty set of views.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the view with the query's key, building it first if needed.
    ///
    /// The failures of the initial build are returned; a view that already
    /// existed reports none.
    pub fn create_or_get(&mut self, query: Rc<dyn ViewQuery>) -> (ViewHandle, Vec<EvalError>) {
        let key = query.key();
        if let Some(view) = self.views.get(&key) {
            return (ViewHandle::new(view.query().clone()), Vec::new());
        }
        let mut view = OrderedView::new(query.clone());
        let failures = view.rebuild();
        self.views.insert(key, view);
        (ViewHandle::new(query), failures)
    }

    #[inline]
    pub fn get(&self, key: &ViewKey) -> Option<&OrderedView> {
        self.views.get(key)
    }

    #[inline]
    pub fn contains(&self, key: &ViewKey) -> bool {
        self.views.contains_key(key)
    }

    /// Tears a view down.
    pub fn remove(&mut self, key: &ViewKey) -> Option<OrderedView> {
        self.views.remove(key)
    }

    /// Keys of the live views, in order.
    pub fn keys(&self) -> Vec<ViewKey> {
        self.views.keys().cloned().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Reconciles every view with a commit.
    ///
    /// An entity counts as a content update for a view if its `ChangeInfo`
    /// carries an aspect the view's query reports.
    pub fn reconcile_all(
        &mut self,
        collected: &CollectedChanges,
        infos: &[ChangeInfo],
    ) -> ViewsOutcome {
        let mut outcome = ViewsOutcome::default();
        if self.views.is_empty() {
            return outcome;
        }

        let base = ViewCommit {
            inserted: collected.inserted.clone(),
            deleted: collected.deleted.clone(),
            touched: collected.touched.clone(),
            ..ViewCommit::default()
        };

        for (key, view) in self.views.iter_mut() {
            let mut commit = base.clone();
            commit.content_changed = content_changes(view, infos);
            commit.touched.extend(commit.content_changed.iter().copied());

            let result = view.reconcile(&commit);
            outcome.failures.extend(result.failures);
            if !result.diff.is_empty() {
                outcome.diffs.push((key.clone(), result.diff));
            }
        }
        outcome
    }
}

fn content_changes(view: &OrderedView, infos: &[ChangeInfo]) -> BTreeSet<EntityRef> {
    let query = view.query();
    infos
        .iter()
        .filter(|info| !info.is_insertion() && info.entity().is(view.kind()))
        .filter(|info| info.changed_aspects().iter().any(|a| query.reports_aspect(a)))
        .map(ChangeInfo::entity)
        .collect()
}

//! Ordered views.
//!
//! An `OrderedView` keeps the current ordered membership of a query as the
//! baseline for the next commit. Reconciliation re-evaluates only the
//! entities a commit touched: members the commit did not touch keep their
//! baseline order, touched and new members are re-placed by binary search.
//! The result is the same ordering a full re-sort would produce, and the
//! index-level diff between the old and the new baseline.

use crate::delta::Delta;
use crate::diff::{MovedIndex, ViewDiff};
use crate::moves::moved_members;
use crate::query::{EvalError, ViewKey, ViewQuery};
use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cmp::Ordering;
use hashbrown::{HashMap, HashSet};
use ripple_core::{EntityKind, EntityRef};

/// The part of a commit a view needs to reconcile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewCommit {
    /// Entities inserted by the commit
    pub inserted: BTreeSet<EntityRef>,
    /// Entities deleted by the commit
    pub deleted: BTreeSet<EntityRef>,
    /// Entities whose membership or sort position may have changed, directly
    /// or through a dependency
    pub touched: BTreeSet<EntityRef>,
    /// Touched entities whose change counts as a content update for the view
    pub content_changed: BTreeSet<EntityRef>,
}

impl ViewCommit {
    /// Creates an empty commit.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an inserted entity.
    pub fn insert(mut self, entity: EntityRef) -> Self {
        self.inserted.insert(entity);
        self
    }

    /// Adds a deleted entity.
    pub fn delete(mut self, entity: EntityRef) -> Self {
        self.deleted.insert(entity);
        self
    }

    /// Adds an entity that must be re-evaluated without a content change.
    pub fn touch(mut self, entity: EntityRef) -> Self {
        self.touched.insert(entity);
        self
    }

    /// Adds an entity whose content changed.
    pub fn change(mut self, entity: EntityRef) -> Self {
        self.touched.insert(entity);
        self.content_changed.insert(entity);
        self
    }

    /// Returns true if the commit touches nothing.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
            && self.deleted.is_empty()
            && self.touched.is_empty()
            && self.content_changed.is_empty()
    }
}

/// Result of reconciling one commit against a view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Index operations from the old to the new baseline
    pub diff: ViewDiff,
    /// Entities excluded because their predicate or comparator failed
    pub failures: Vec<EvalError>,
}

/// A live, predicate-filtered, comparator-sorted sequence of entities.
pub struct OrderedView {
    query: Rc<dyn ViewQuery>,
    key: ViewKey,
    kind: EntityKind,
    /// Current ordering, the baseline of the next diff
    entities: Vec<EntityRef>,
    /// Entity -> position in `entities`
    positions: HashMap<EntityRef, usize>,
}

impl OrderedView {
    /// Creates an empty view for the query. Call `rebuild` to load the
    /// initial membership.
    pub fn new(query: Rc<dyn ViewQuery>) -> Self {
        let key = query.key();
        let kind = query.kind();
        Self {
            query,
            key,
            kind,
            entities: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Returns the view's identity.
    #[inline]
    pub fn key(&self) -> &ViewKey {
        &self.key
    }

    /// Returns the kind of entity the view lists.
    #[inline]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the query backing this view.
    #[inline]
    pub fn query(&self) -> &Rc<dyn ViewQuery> {
        &self.query
    }

    /// Returns the current ordering.
    #[inline]
    pub fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    /// Returns the number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the view has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the position of a member.
    #[inline]
    pub fn position_of(&self, entity: &EntityRef) -> Option<usize> {
        self.positions.get(entity).copied()
    }

    /// Returns true if the entity is a member.
    #[inline]
    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.positions.contains_key(entity)
    }

    /// Recomputes the membership from scratch over the query's universe.
    ///
    /// Returns the evaluation failures; failing entities are left out.
    pub fn rebuild(&mut self) -> Vec<EvalError> {
        let mut failures = Vec::new();
        let universe: BTreeSet<EntityRef> = self
            .query
            .universe()
            .into_iter()
            .filter(|e| e.is(self.kind))
            .collect();

        let mut order = Vec::with_capacity(universe.len());
        for entity in universe {
            match self.query.matches(entity) {
                Ok(true) => {
                    self.place(&mut order, entity, &mut failures);
                }
                Ok(false) => {}
                Err(err) => failures.push(err),
            }
        }

        self.replace_baseline(order);
        failures
    }

    /// Reconciles the view with a commit and replaces the baseline.
    ///
    /// The diff is computed completely before the baseline is swapped, so the
    /// view never exposes a half-updated ordering.
    pub fn reconcile(&mut self, commit: &ViewCommit) -> Reconciliation {
        let mut failures = Vec::new();
        let deltas = self.membership_deltas(commit, &mut failures);
        if deltas.is_empty() {
            return Reconciliation {
                diff: ViewDiff::new(),
                failures,
            };
        }

        let replaced: HashSet<EntityRef> = deltas.iter().map(|d| d.data).collect();
        let mut order: Vec<EntityRef> = self
            .entities
            .iter()
            .filter(|e| !replaced.contains(*e))
            .copied()
            .collect();

        for delta in deltas.iter().filter(|d| !d.is_delete()) {
            self.place(&mut order, delta.data, &mut failures);
        }

        let diff = self.diff_against(&order, &deltas, commit);
        self.replace_baseline(order);

        Reconciliation { diff, failures }
    }

    /// Evaluates the predicate for every candidate of the commit.
    fn membership_deltas(
        &self,
        commit: &ViewCommit,
        failures: &mut Vec<EvalError>,
    ) -> Vec<Delta<EntityRef>> {
        let candidates: BTreeSet<EntityRef> = commit
            .touched
            .iter()
            .chain(&commit.inserted)
            .chain(&commit.deleted)
            .chain(&commit.content_changed)
            .filter(|e| e.is(self.kind))
            .copied()
            .collect();

        candidates
            .into_iter()
            .filter_map(|entity| {
                let was_member = self.contains(&entity);
                let is_member = if commit.deleted.contains(&entity) {
                    false
                } else {
                    match self.query.matches(entity) {
                        Ok(matches) => matches,
                        Err(err) => {
                            failures.push(err);
                            false
                        }
                    }
                };
                Delta::transition(entity, was_member, is_member)
            })
            .collect()
    }

    /// Inserts `entity` at its sorted position.
    ///
    /// A comparator failure excludes the entity it names: either the one being
    /// placed, or a member already in `order`, after which placement retries.
    fn place(&self, order: &mut Vec<EntityRef>, entity: EntityRef, failures: &mut Vec<EvalError>) -> bool {
        loop {
            match self.insertion_point(order, entity) {
                Ok(pos) => {
                    order.insert(pos, entity);
                    return true;
                }
                Err(err) => {
                    let culprit = err.entity;
                    failures.push(err);
                    if culprit == entity {
                        return false;
                    }
                    match order.iter().position(|e| *e == culprit) {
                        Some(pos) => {
                            order.remove(pos);
                        }
                        None => return false,
                    }
                }
            }
        }
    }

    fn insertion_point(&self, order: &[EntityRef], entity: EntityRef) -> Result<usize, EvalError> {
        let (mut lo, mut hi) = (0, order.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let other = order[mid];
            let ordering = self
                .query
                .compare(entity, other)?
                .then_with(|| entity.cmp(&other));
            if ordering == Ordering::Less {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Ok(lo)
    }

    fn diff_against(
        &self,
        order: &[EntityRef],
        deltas: &[Delta<EntityRef>],
        commit: &ViewCommit,
    ) -> ViewDiff {
        let post: HashMap<EntityRef, usize> = order
            .iter()
            .enumerate()
            .map(|(pos, e)| (*e, pos))
            .collect();

        let deleted: BTreeSet<usize> = self
            .entities
            .iter()
            .enumerate()
            .filter(|(_, e)| !post.contains_key(*e))
            .map(|(pos, _)| pos)
            .collect();

        let inserted: BTreeSet<usize> = order
            .iter()
            .enumerate()
            .filter(|(_, e)| !self.positions.contains_key(*e))
            .map(|(pos, _)| pos)
            .collect();

        let retained: HashSet<EntityRef> = deltas
            .iter()
            .filter(|d| d.is_noop() && post.contains_key(&d.data))
            .map(|d| d.data)
            .collect();

        let moved_set = moved_members(&self.entities, order, &retained);
        let moved: Vec<MovedIndex> = moved_set
            .iter()
            .map(|e| MovedIndex::new(self.positions[e], post[e]))
            .collect();

        let updated: BTreeSet<usize> = commit
            .content_changed
            .iter()
            .filter(|e| retained.contains(*e) && !moved_set.contains(*e))
            .map(|e| post[e])
            .collect();

        ViewDiff::from_parts(inserted, deleted, updated, moved)
    }

    fn replace_baseline(&mut self, order: Vec<EntityRef>) {
        self.positions = order.iter().enumerate().map(|(pos, e)| (*e, pos)).collect();
        self.entities = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::format;
    use alloc::vec;
    use core::cell::RefCell;

    const CONVERSATION: EntityKind = EntityKind::new("conversation");
    const USER: EntityKind = EntityKind::new("user");

    fn c(id: u64) -> EntityRef {
        EntityRef::new(CONVERSATION, id)
    }

    #[derive(Clone, Copy, Default)]
    struct Conversation {
        last_modified: i64,
        archived: bool,
        broken: bool,
    }

    type Store = Rc<RefCell<BTreeMap<EntityRef, Conversation>>>;

    /// Non-archived conversations, most recently modified first.
    struct ActiveConversations {
        store: Store,
    }

    impl ActiveConversations {
        fn get(&self, entity: EntityRef) -> Result<Conversation, EvalError> {
            match self.store.borrow().get(&entity) {
                Some(conv) if conv.broken => Err(EvalError::new(entity, "broken")),
                Some(conv) => Ok(*conv),
                None => Err(EvalError::new(entity, format!("{} not in store", entity))),
            }
        }
    }

    impl ViewQuery for ActiveConversations {
        fn key(&self) -> ViewKey {
            ViewKey::new("conversations.active")
        }

        fn kind(&self) -> EntityKind {
            CONVERSATION
        }

        fn universe(&self) -> Vec<EntityRef> {
            self.store.borrow().keys().copied().collect()
        }

        fn matches(&self, entity: EntityRef) -> Result<bool, EvalError> {
            Ok(!self.get(entity)?.archived)
        }

        fn compare(&self, a: EntityRef, b: EntityRef) -> Result<Ordering, EvalError> {
            let a = self.get(a)?;
            let b = self.get(b)?;
            Ok(b.last_modified.cmp(&a.last_modified))
        }
    }

    fn setup(rows: &[(u64, i64)]) -> (Store, OrderedView) {
        let store: Store = Rc::new(RefCell::new(BTreeMap::new()));
        for &(id, last_modified) in rows {
            store.borrow_mut().insert(
                c(id),
                Conversation {
                    last_modified,
                    ..Default::default()
                },
            );
        }
        let mut view = OrderedView::new(Rc::new(ActiveConversations { store: store.clone() }));
        assert!(view.rebuild().is_empty());
        (store, view)
    }

    fn set(store: &Store, id: u64, f: impl FnOnce(&mut Conversation)) {
        f(store.borrow_mut().entry(c(id)).or_default());
    }

    #[test]
    fn test_rebuild_sorts_by_comparator() {
        let (_, view) = setup(&[(1, 30), (2, 90), (3, 1400)]);
        assert_eq!(view.entities(), &[c(3), c(2), c(1)]);
        assert_eq!(view.position_of(&c(1)), Some(2));
        assert_eq!(view.key().as_str(), "conversations.active");
    }

    #[test]
    fn test_rebuild_breaks_ties_by_identity() {
        let (_, view) = setup(&[(5, 10), (2, 10), (9, 10)]);
        assert_eq!(view.entities(), &[c(2), c(5), c(9)]);
    }

    #[test]
    fn test_reconcile_reports_move_not_update() {
        let (store, mut view) = setup(&[(1, 30), (2, 90), (3, 1400)]);

        set(&store, 2, |conv| conv.last_modified = 1_000_000);
        let result = view.reconcile(&ViewCommit::new().change(c(2)));

        assert!(result.failures.is_empty());
        assert_eq!(result.diff.moved(), &[MovedIndex::new(1, 0)]);
        assert!(result.diff.inserted().is_empty());
        assert!(result.diff.deleted().is_empty());
        assert!(result.diff.updated().is_empty());
        assert_eq!(view.entities(), &[c(2), c(3), c(1)]);
    }

    #[test]
    fn test_reconcile_update_in_place() {
        let (store, mut view) = setup(&[(1, 30), (2, 90), (3, 1400)]);

        // new sort key, same slot
        set(&store, 2, |conv| conv.last_modified = 100);
        let result = view.reconcile(&ViewCommit::new().change(c(2)));

        assert_eq!(result.diff.updated().iter().copied().collect::<Vec<_>>(), vec![1]);
        assert!(result.diff.moved().is_empty());
    }

    #[test]
    fn test_reconcile_insert_ahead_of_changed_member_is_update() {
        let (store, mut view) = setup(&[(1, 30), (2, 90), (3, 1400)]);

        set(&store, 9, |conv| conv.last_modified = 5000);
        let result = view.reconcile(&ViewCommit::new().insert(c(9)).change(c(2)));

        assert_eq!(result.diff.inserted().iter().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(result.diff.updated().iter().copied().collect::<Vec<_>>(), vec![2]);
        assert!(result.diff.moved().is_empty());
        assert_eq!(view.entities(), &[c(9), c(3), c(2), c(1)]);
    }

    #[test]
    fn test_reconcile_touch_without_content_change_is_silent() {
        let (_, mut view) = setup(&[(1, 30), (2, 90)]);
        let result = view.reconcile(&ViewCommit::new().touch(c(1)));
        assert!(result.diff.is_empty());
    }

    #[test]
    fn test_reconcile_insert_and_update_same_commit() {
        let (store, mut view) = setup(&[(1, 30), (2, 100)]);

        set(&store, 3, |conv| conv.last_modified = 50);
        let result = view.reconcile(&ViewCommit::new().insert(c(3)).change(c(3)));

        assert_eq!(result.diff.inserted().iter().copied().collect::<Vec<_>>(), vec![1]);
        assert!(result.diff.updated().is_empty());
        assert!(result.diff.moved().is_empty());
        assert_eq!(view.entities(), &[c(2), c(3), c(1)]);
    }

    #[test]
    fn test_reconcile_archive_deletes_pre_position() {
        let (store, mut view) = setup(&[(1, 30), (2, 90), (3, 1400)]);

        set(&store, 3, |conv| conv.archived = true);
        let result = view.reconcile(&ViewCommit::new().change(c(3)));

        assert_eq!(result.diff.deleted().iter().copied().collect::<Vec<_>>(), vec![0]);
        assert!(result.diff.updated().is_empty());
        assert!(result.diff.moved().is_empty());
        assert_eq!(view.entities(), &[c(2), c(1)]);
    }

    #[test]
    fn test_reconcile_delete_from_store() {
        let (store, mut view) = setup(&[(1, 30), (2, 90)]);

        store.borrow_mut().remove(&c(1));
        let result = view.reconcile(&ViewCommit::new().delete(c(1)));

        assert_eq!(result.diff.deleted().iter().copied().collect::<Vec<_>>(), vec![1]);
        assert!(result.failures.is_empty());
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_reconcile_ignores_other_kinds() {
        let (_, mut view) = setup(&[(1, 30)]);
        let user = EntityRef::new(USER, 1);
        let result = view.reconcile(&ViewCommit::new().insert(user).change(user));
        assert!(result.diff.is_empty());
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_reconcile_evaluation_failure_excludes_entity() {
        let (store, mut view) = setup(&[(1, 30), (2, 90)]);

        set(&store, 3, |conv| {
            conv.last_modified = 60;
            conv.broken = true;
        });
        set(&store, 4, |conv| conv.last_modified = 70);
        let result = view.reconcile(&ViewCommit::new().insert(c(3)).insert(c(4)));

        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].entity, c(3));
        assert_eq!(view.entities(), &[c(2), c(4), c(1)]);
        assert_eq!(result.diff.inserted().iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_reconcile_comparator_failure_on_member_excludes_member() {
        let (store, mut view) = setup(&[(1, 30), (2, 90), (3, 1400)]);

        // c(2) breaks without being reported; placing c(4) trips over it
        set(&store, 2, |conv| conv.broken = true);
        set(&store, 4, |conv| conv.last_modified = 80);
        let result = view.reconcile(&ViewCommit::new().insert(c(4)));

        assert!(result.failures.iter().any(|f| f.entity == c(2)));
        assert!(!view.contains(&c(2)));
        assert!(view.contains(&c(4)));
        assert!(result.diff.deleted().contains(&1));
    }

    #[test]
    fn test_reconcile_leave_and_rejoin() {
        let (store, mut view) = setup(&[(1, 30)]);

        set(&store, 1, |conv| conv.archived = true);
        let first = view.reconcile(&ViewCommit::new().change(c(1)));
        assert_eq!(first.diff.deleted().len(), 1);
        assert!(view.is_empty());

        set(&store, 1, |conv| conv.archived = false);
        let second = view.reconcile(&ViewCommit::new().change(c(1)));
        assert_eq!(second.diff.inserted().iter().copied().collect::<Vec<_>>(), vec![0]);
        assert!(second.diff.updated().is_empty());
    }
}

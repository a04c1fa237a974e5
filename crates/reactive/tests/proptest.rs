//! Property-based tests for change aggregation.

mod common;

use common::*;
use proptest::prelude::*;
use ripple_reactive::{
    aggregate, aspects_for_keys, collect, ChangeInfo, DependencyGraph, EntityRef, RawChange,
};

const KEYS: &[&str] = &[
    "displayName",
    "userDefinedName",
    "lastModifiedDate",
    "estimatedUnreadCount",
    "isArchived",
    "accentColorValue",
    "remoteIdentifier",
];

#[derive(Clone, Debug)]
enum Update {
    Conversation { id: u64, key: usize },
    User { id: u64, name: bool },
}

fn update_strategy() -> impl Strategy<Value = Update> {
    prop_oneof![
        (0u64..8, 0..KEYS.len()).prop_map(|(id, key)| Update::Conversation { id, key }),
        (0u64..4, any::<bool>()).prop_map(|(id, name)| Update::User { id, name }),
    ]
}

fn build(updates: &[Update]) -> RawChange {
    updates
        .iter()
        .fold(RawChange::builder(), |builder, update| match *update {
            Update::Conversation { id, key } => builder.update(conv(id), [KEYS[key]]),
            Update::User { id, name } => {
                builder.update(user(id), [if name { "name" } else { "accentColorValue" }])
            }
        })
        .build()
}

/// Every conversation has user `id % 4` as a participant.
fn graph() -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for id in 0..8 {
        graph.register_dependency(conv(id), user(id % 4), "participant");
    }
    graph
}

fn run(updates: &[Update]) -> Vec<ChangeInfo> {
    let map = aspects();
    let collected = collect(&build(updates), &mut graph(), &map);
    aggregate(&collected, &map, true)
}

proptest! {
    /// Property: the order in which a commit's updates were recorded does not
    /// change the notifications.
    #[test]
    fn aggregation_is_order_independent(
        (updates, shuffled) in prop::collection::vec(update_strategy(), 0..24)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        prop_assert_eq!(run(&updates), run(&shuffled));
    }

    /// Property: every notification has aspects, they are exactly the aspects
    /// of its keys, and notifications come out in entity order.
    #[test]
    fn notifications_match_their_keys(updates in prop::collection::vec(update_strategy(), 0..24)) {
        let map = aspects();
        let infos = run(&updates);

        for info in &infos {
            prop_assert!(!info.changed_aspects().is_empty());
            let expected = aspects_for_keys(&map, info.entity().kind(), info.changed_keys());
            prop_assert_eq!(info.changed_aspects(), &expected);
        }
        let entities: Vec<EntityRef> = infos.iter().map(ChangeInfo::entity).collect();
        let mut sorted = entities.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(entities, sorted);
    }

    /// Property: recording the same update twice changes nothing.
    #[test]
    fn repeated_updates_are_idempotent(updates in prop::collection::vec(update_strategy(), 0..24)) {
        let doubled: Vec<Update> = updates.iter().chain(updates.iter()).cloned().collect();
        prop_assert_eq!(run(&updates), run(&doubled));
    }
}

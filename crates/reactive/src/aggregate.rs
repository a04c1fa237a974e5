//! Entity change aggregation.
//!
//! Maps the collected keys of every affected entity to aspects and emits one
//! `ChangeInfo` per entity with at least one changed aspect.

use crate::aspect::AspectMap;
use crate::change_info::ChangeInfo;
use crate::collect::CollectedChanges;
use ripple_core::{AspectSet, EntityKind, KeySet};

/// Union of the aspects of every key in `keys`.
pub fn aspects_for_keys(map: &AspectMap, kind: EntityKind, keys: &KeySet) -> AspectSet {
    keys.iter()
        .flat_map(|key| map.aspects_for(kind, key))
        .collect()
}

/// Builds the `ChangeInfo`s of one commit, sorted by entity.
///
/// Entities inserted by the commit get an insertion notification carrying
/// every aspect of their kind when `notify_inserted` is set, and nothing
/// otherwise. Deleted entities never get one.
pub fn aggregate(
    collected: &CollectedChanges,
    map: &AspectMap,
    notify_inserted: bool,
) -> Vec<ChangeInfo> {
    let mut infos: Vec<ChangeInfo> = Vec::with_capacity(collected.affected.len());

    for (entity, keys) in &collected.affected {
        if collected.inserted.contains(entity) || collected.deleted.contains(entity) {
            continue;
        }
        let aspects = aspects_for_keys(map, entity.kind(), keys);
        if aspects.is_empty() {
            continue;
        }
        infos.push(ChangeInfo::new(*entity, aspects, keys.clone()));
    }

    if notify_inserted {
        for entity in &collected.inserted {
            let aspects = map.all_aspects(entity.kind());
            if aspects.is_empty() {
                continue;
            }
            infos.push(ChangeInfo::insertion(
                *entity,
                aspects,
                map.all_keys(entity.kind()),
            ));
        }
    }

    infos.sort_by_key(ChangeInfo::entity);
    infos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::RelationSpec;
    use ripple_core::EntityRef;

    const CONVERSATION: EntityKind = EntityKind::new("conversation");
    const USER: EntityKind = EntityKind::new("user");

    fn conv(id: u64) -> EntityRef {
        EntityRef::new(CONVERSATION, id)
    }

    fn map() -> AspectMap {
        AspectMap::builder()
            .aspects(CONVERSATION, "displayName", ["nameChanged"])
            .aspects(CONVERSATION, "userDefinedName", ["nameChanged"])
            .aspects(CONVERSATION, "estimatedUnreadCount", ["unreadCountChanged"])
            .aspects(CONVERSATION, "otherActiveParticipants", ["participantsChanged"])
            .aspects(USER, "name", ["nameChanged"])
            .relation(
                RelationSpec::new("participant", CONVERSATION, USER)
                    .membership_keys(["otherActiveParticipants", "displayName"]),
            )
            .build()
            .unwrap()
    }

    fn keys(items: &[&str]) -> KeySet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_aspects_for_keys_union() {
        let aspects = aspects_for_keys(
            &map(),
            CONVERSATION,
            &keys(&["displayName", "userDefinedName", "estimatedUnreadCount"]),
        );
        assert_eq!(aspects, keys(&["nameChanged", "unreadCountChanged"]));
    }

    #[test]
    fn test_aggregate_drops_empty_aspects() {
        let mut collected = CollectedChanges::new();
        collected.add_keys(conv(1), keys(&["accentColorValue"]));
        collected.add_keys(conv(2), keys(&["estimatedUnreadCount"]));

        let infos = aggregate(&collected, &map(), true);
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].entity(), conv(2));
        assert!(infos[0].has_changed("unreadCountChanged"));
    }

    #[test]
    fn test_aggregate_sorted_by_entity() {
        let mut collected = CollectedChanges::new();
        collected.add_keys(conv(3), keys(&["displayName"]));
        collected.add_keys(conv(1), keys(&["displayName"]));
        collected.inserted.insert(conv(2));

        let infos = aggregate(&collected, &map(), true);
        let entities: Vec<_> = infos.iter().map(ChangeInfo::entity).collect();
        assert_eq!(entities, vec![conv(1), conv(2), conv(3)]);
        assert!(infos[1].is_insertion());
        assert_eq!(
            infos[1].changed_aspects(),
            &keys(&["nameChanged", "participantsChanged", "unreadCountChanged"])
        );
    }

    #[test]
    fn test_aggregate_inserted_without_notification() {
        let mut collected = CollectedChanges::new();
        collected.inserted.insert(conv(2));
        collected.add_keys(conv(2), keys(&["displayName"]));

        assert!(aggregate(&collected, &map(), false).is_empty());
    }

    #[test]
    fn test_aggregate_membership_keys() {
        let mut collected = CollectedChanges::new();
        collected.add_keys(conv(1), keys(&["otherActiveParticipants", "displayName"]));

        let infos = aggregate(&collected, &map(), true);
        assert_eq!(infos.len(), 1);
        assert_eq!(
            infos[0].changed_aspects(),
            &keys(&["nameChanged", "participantsChanged"])
        );
        assert_eq!(
            infos[0].changed_keys(),
            &keys(&["displayName", "otherActiveParticipants"])
        );
    }
}

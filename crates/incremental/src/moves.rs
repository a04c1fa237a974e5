//! Move detection.
//!
//! A member counts as moved only when its order relative to the other
//! surviving members changed. Members the commit did not touch keep their
//! relative order, so they anchor the comparison: a re-placed member is moved
//! if the number of anchors in front of it changed, or if it swapped places
//! with another re-placed member between the same two anchors.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use ripple_core::EntityRef;

/// Marks the elements of one longest strictly increasing subsequence.
pub(crate) fn longest_increasing(seq: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, &value) in seq.iter().enumerate() {
        let pos = tails.partition_point(|&t| seq[t] < value);
        if pos > 0 {
            prev[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut keep = vec![false; seq.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        keep[i] = true;
        cursor = prev[i];
    }
    keep
}

/// Returns the re-placed members whose relative position changed.
///
/// `replaced` holds members that were touched by the commit and are present
/// in both `before` and `after`. Every other member of `before` that is still
/// in `after` is an anchor.
pub(crate) fn moved_members(
    before: &[EntityRef],
    after: &[EntityRef],
    replaced: &HashSet<EntityRef>,
) -> HashSet<EntityRef> {
    let in_after: HashSet<EntityRef> = after.iter().copied().collect();
    let in_before: HashSet<EntityRef> = before.iter().copied().collect();

    // member -> (anchors in front of it, pre-commit position)
    let mut pre: HashMap<EntityRef, (usize, usize)> = HashMap::with_capacity(replaced.len());
    let mut anchors = 0;
    for (pos, entity) in before.iter().enumerate() {
        if replaced.contains(entity) {
            pre.insert(*entity, (anchors, pos));
        } else if in_after.contains(entity) {
            anchors += 1;
        }
    }

    let mut moved = HashSet::new();
    let mut buckets: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut bucket_members: BTreeMap<usize, Vec<EntityRef>> = BTreeMap::new();
    let mut anchors = 0;
    for entity in after {
        match pre.get(entity) {
            Some(&(rank, pos)) => {
                if rank == anchors {
                    buckets.entry(rank).or_default().push(pos);
                    bucket_members.entry(rank).or_default().push(*entity);
                } else {
                    moved.insert(*entity);
                }
            }
            None if in_before.contains(entity) => anchors += 1,
            // joined with this commit, not an anchor
            None => {}
        }
    }

    for (rank, positions) in &buckets {
        if positions.len() < 2 {
            continue;
        }
        let keep = longest_increasing(positions);
        for (entity, kept) in bucket_members[rank].iter().zip(keep) {
            if !kept {
                moved.insert(*entity);
            }
        }
    }

    moved
}

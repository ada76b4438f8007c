//! Legacy first-fit allocator, kept as a baseline.
//!
//! Every (requester, slot) candidate pair is ordered by weight descending
//! (then requester id, then slot) and taken if both sides are still free.
//! A pair that loses its slot to an equal-weight holder is recorded as a
//! [`Conflict`]. The result is only ever reported, never written back.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use slotgrid_core::{RequesterId, SlotId};
use tracing::debug;

use crate::candidate::Pool;
use crate::optimizer::{Assignment, Matching};

/// A slot contested by requesters of equal weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub slot: SlotId,
    pub weight: u32,
    /// The holder first, then every equal-weight requester that lost it.
    pub requesters: Vec<RequesterId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GreedyOutcome {
    pub matching: Matching,
    pub conflicts: Vec<Conflict>,
}

/// Run the first-fit baseline over the pool's eligible candidates.
pub fn allocate(pool: &Pool) -> GreedyOutcome {
    let mut pairs: Vec<(&RequesterId, u32, DateTime<Utc>)> = pool
        .eligible()
        .into_iter()
        .flat_map(|c| c.slots.iter().map(move |s| (&c.requester, c.weight, *s)))
        .collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)).then_with(|| a.2.cmp(&b.2)));

    let mut matching = Matching::empty(pool.partition);
    let mut holders: BTreeMap<DateTime<Utc>, (&RequesterId, u32)> = BTreeMap::new();
    let mut assigned: HashSet<&RequesterId> = HashSet::new();
    let mut conflicts: Vec<Conflict> = Vec::new();

    for (requester, weight, at) in pairs {
        if assigned.contains(requester) {
            continue;
        }
        let slot = SlotId::new(at, pool.partition);
        if let Some(&(holder, held_weight)) = holders.get(&at) {
            if held_weight == weight {
                match conflicts
                    .iter_mut()
                    .find(|c| c.slot == slot && c.weight == weight)
                {
                    Some(conflict) => {
                        if !conflict.requesters.contains(requester) {
                            conflict.requesters.push(requester.clone());
                        }
                    }
                    None => conflicts.push(Conflict {
                        slot,
                        weight,
                        requesters: vec![holder.clone(), requester.clone()],
                    }),
                }
            }
            continue;
        }
        holders.insert(at, (requester, weight));
        assigned.insert(requester);
        matching
            .assignments
            .insert(requester.clone(), Assignment { slot, weight });
    }

    debug!(
        partition = %pool.partition,
        assigned = matching.len(),
        total_weight = matching.total_weight(),
        conflicts = conflicts.len(),
        "greedy baseline allocated"
    );
    GreedyOutcome {
        matching,
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;
    use chrono::TimeZone;
    use slotgrid_core::PartitionTag;
    use std::collections::BTreeSet;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 4, h, m, 0).unwrap()
    }

    fn make_candidate(requester: &str, weight: u32, slots: &[DateTime<Utc>]) -> Candidate {
        Candidate {
            requester: requester.to_string(),
            weight,
            slots: slots.iter().copied().collect::<BTreeSet<_>>(),
            created_at: at(0, 0),
        }
    }

    #[test]
    fn first_fit_is_suboptimal_on_contested_slot() {
        let (x, y) = (at(8, 0), at(8, 30));
        let pool = Pool::new(
            PartitionTag::Main,
            vec![
                make_candidate("A", 80, &[x, y]),
                make_candidate("B", 79, &[x]),
                make_candidate("C", 45, &[y]),
            ],
        );

        let outcome = allocate(&pool);

        assert_eq!(outcome.matching.total_weight(), 125);
        assert_eq!(outcome.matching.get("A").unwrap().slot.at, x);
        assert_eq!(outcome.matching.get("C").unwrap().slot.at, y);
        assert!(!outcome.matching.contains("B"));
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn equal_weights_on_one_slot_are_reported() {
        let x = at(9, 0);
        let pool = Pool::new(
            PartitionTag::Main,
            vec![
                make_candidate("carol", 30, &[x]),
                make_candidate("alice", 30, &[x]),
                make_candidate("bob", 30, &[x]),
                make_candidate("dave", 10, &[x]),
            ],
        );

        let outcome = allocate(&pool);

        assert_eq!(outcome.matching.len(), 1);
        assert!(outcome.matching.contains("alice"));
        assert_eq!(
            outcome.conflicts,
            vec![Conflict {
                slot: SlotId::new(x, PartitionTag::Main),
                weight: 30,
                requesters: vec!["alice".into(), "bob".into(), "carol".into()],
            }]
        );
    }

    #[test]
    fn empty_pool() {
        let outcome = allocate(&Pool::new(PartitionTag::Secondary, Vec::new()));
        assert!(outcome.matching.is_empty());
        assert!(outcome.conflicts.is_empty());
    }
}

//! Optimal vs greedy at booking-day scale: 205 requesters on a 48-slot grid.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use proptest::prelude::*;
use proptest::sample::subsequence;
use slotgrid_core::{PartitionTag, SlotGrid};
use slotgrid_placement::{Candidate, Pool, allocate_greedy, optimize};

/// Weight tiers of a realistic booking day: (count, weight range).
const TIERS: [(usize, std::ops::RangeInclusive<u32>); 4] =
    [(20, 100..=200), (50, 50..=99), (85, 25..=49), (50, 20..=24)];

fn grid_slots() -> Vec<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(2025, 12, 4).unwrap();
    SlotGrid::half_hourly(date).slots()
}

fn arb_requester(weights: std::ops::RangeInclusive<u32>) -> impl Strategy<Value = (u32, Vec<DateTime<Utc>>)> {
    (weights, subsequence(grid_slots(), 3..=10))
}

fn arb_day() -> impl Strategy<Value = Vec<Candidate>> {
    let tiers: Vec<_> = TIERS
        .iter()
        .map(|(count, weights)| prop::collection::vec(arb_requester(weights.clone()), *count))
        .collect();
    tiers.prop_map(|tiers| {
        tiers
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(i, (weight, slots))| Candidate {
                requester: format!("player-{i:03}"),
                weight,
                slots: slots.into_iter().collect::<BTreeSet<_>>(),
                created_at: DateTime::<Utc>::UNIX_EPOCH,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn optimal_never_worse_than_greedy(candidates in arb_day()) {
        prop_assert_eq!(candidates.len(), 205);
        let pool = Pool::new(PartitionTag::Main, candidates);

        let optimal = optimize(&pool);
        let greedy = allocate_greedy(&pool);

        prop_assert!(optimal.total_weight() >= greedy.matching.total_weight());
        prop_assert!(optimal.len() <= 48);

        let mut slots = HashSet::new();
        for (requester, assignment) in &optimal.assignments {
            let candidate = pool
                .candidates()
                .iter()
                .find(|c| &c.requester == requester)
                .unwrap();
            prop_assert!(candidate.slots.contains(&assignment.slot.at));
            prop_assert!(slots.insert(assignment.slot));
        }
    }
}

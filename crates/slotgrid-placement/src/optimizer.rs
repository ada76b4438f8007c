//! Optimal assignment for one pool.
//!
//! Builds the valuation matrix over the pool's eligible candidates, solves
//! it with the Hungarian method, and keeps only real (feasible, positive)
//! pairs. Weights live on rows only, so a maximum-cardinality solution over
//! the sentinel-padded matrix is also a maximum-weight matching once the
//! sentinel pairs are dropped.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use slotgrid_core::{PartitionTag, RequesterId, SlotId};
use tracing::{debug, info, warn};

use crate::candidate::Pool;
use crate::hungarian;
use crate::matrix::ValuationMatrix;

/// One requester's slot in a matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub slot: SlotId,
    pub weight: u32,
}

/// A one-to-one set of requester → slot pairs for one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Matching {
    pub partition: PartitionTag,
    pub assignments: BTreeMap<RequesterId, Assignment>,
}

impl Matching {
    pub fn empty(partition: PartitionTag) -> Self {
        Self {
            partition,
            assignments: BTreeMap::new(),
        }
    }

    pub fn total_weight(&self) -> u64 {
        self.assignments.values().map(|a| u64::from(a.weight)).sum()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn get(&self, requester: &str) -> Option<&Assignment> {
        self.assignments.get(requester)
    }

    pub fn contains(&self, requester: &str) -> bool {
        self.assignments.contains_key(requester)
    }

    /// Requester → slot instant, the shape the store writes back.
    pub fn slot_instants(&self) -> BTreeMap<RequesterId, DateTime<Utc>> {
        self.assignments
            .iter()
            .map(|(requester, a)| (requester.clone(), a.slot.at))
            .collect()
    }
}

/// Compute the value-maximizing matching for `pool`.
///
/// Among equally valued matchings the one covering smaller requester ids is
/// preferred. An empty pool yields an empty matching.
pub fn optimize(pool: &Pool) -> Matching {
    let eligible = pool.eligible();
    let matrix = ValuationMatrix::build(&eligible);
    if matrix.rows() == 0 {
        debug!(partition = %pool.partition, "empty pool, nothing to optimize");
        return Matching::empty(pool.partition);
    }

    let values = match matrix.tie_broken_values() {
        Some(values) => values,
        None => {
            warn!(
                partition = %pool.partition,
                rows = matrix.rows(),
                "weights too large for tie-break scaling, solving unscaled"
            );
            matrix.values()
        }
    };
    let solution = hungarian::solve(&values, matrix.cols());

    let mut matching = Matching::empty(pool.partition);
    for (row, col) in solution.into_iter().enumerate() {
        let Some(col) = col else { continue };
        if !matrix.is_feasible(row, col) || matrix.value(row, col) <= 0 {
            continue;
        }
        let requester = matrix.requester(row).clone();
        let slot = SlotId::new(matrix.slot(col), pool.partition);
        debug!(%requester, %slot, weight = matrix.weight(row), "assigned");
        matching.assignments.insert(
            requester,
            Assignment {
                slot,
                weight: matrix.weight(row),
            },
        );
    }

    info!(
        partition = %pool.partition,
        rows = matrix.rows(),
        slots = matrix.cols(),
        assigned = matching.len(),
        total_weight = matching.total_weight(),
        "pool optimized"
    );
    matching
}

//! Result materializer — writes a run's outcome back to the store.
//!
//! Assignments are replaced per pool, never merged: the store's
//! `replace_assignments` clears the pool's previous assignments and
//! reservations and writes the new ones in a single transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use slotgrid_core::PartitionTag;
use slotgrid_placement::{Matching, PriorityEntry};
use slotgrid_state::{SelectionState, SelectionStatus, StateStore};
use tracing::{debug, info};

use crate::error::SchedulerResult;

/// Replace the stored assignments of `matching.partition` with `matching`.
pub fn materialize(
    state: &StateStore,
    occurrence: &str,
    matching: &Matching,
    now: DateTime<Utc>,
) -> SchedulerResult<u32> {
    let written =
        state.replace_assignments(occurrence, matching.partition, &matching.slot_instants(), now)?;
    info!(
        %occurrence,
        partition = %matching.partition,
        written,
        total_weight = matching.total_weight(),
        "assignments materialized"
    );
    Ok(written)
}

/// Drop every stored assignment of one pool.
pub fn clear(
    state: &StateStore,
    occurrence: &str,
    partition: PartitionTag,
    now: DateTime<Utc>,
) -> SchedulerResult<()> {
    materialize(state, occurrence, &Matching::empty(partition), now)?;
    Ok(())
}

/// Write top-N statuses onto the registrations. Returns the number changed.
pub fn apply_priority(
    state: &StateStore,
    occurrence: &str,
    entries: &[PriorityEntry],
    now: DateTime<Utc>,
) -> SchedulerResult<u32> {
    let statuses: HashMap<&str, SelectionStatus> = entries
        .iter()
        .map(|e| (e.requester.as_str(), e.status))
        .collect();
    let changed = state.update_registrations(occurrence, |reg| {
        let status = statuses
            .get(reg.requester.as_str())
            .copied()
            .unwrap_or_default();
        if reg.status == status {
            return false;
        }
        debug!(requester = %reg.requester, ?status, "selection status");
        reg.status = status;
        reg.updated_at = now;
        true
    })?;
    Ok(changed)
}

/// Mark the occurrence's selection completed (one-way).
pub fn complete(
    state: &StateStore,
    occurrence: &str,
    now: DateTime<Utc>,
) -> SchedulerResult<SelectionState> {
    let selection = state.mark_completed(occurrence, now)?;
    info!(%occurrence, completed_at = ?selection.completed_at, "selection completed");
    Ok(selection)
}

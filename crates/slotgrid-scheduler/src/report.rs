//! Serializable summaries of runs, simulations, and stored status.

use chrono::{DateTime, Utc};
use serde::Serialize;
use slotgrid_core::{AllocationStrategy, OccurrenceId, PartitionTag, RequesterId};
use slotgrid_placement::{Conflict, Matching, Pool, PriorityEntry};
use slotgrid_state::{Registration, Reservation, SelectionState, SelectionStatus};

/// Outcome of one optimization phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub partition: PartitionTag,
    pub pool_size: usize,
    /// Candidates dropped up front (zero weight or no usable slots).
    pub excluded: usize,
    pub assigned: usize,
    pub total_weight: u64,
    /// Pool members left without a slot, by requester id.
    pub unassigned: Vec<RequesterId>,
}

impl PhaseReport {
    pub fn new(pool: &Pool, matching: &Matching) -> Self {
        Self {
            partition: pool.partition,
            pool_size: pool.len(),
            excluded: pool.excluded(),
            assigned: matching.len(),
            total_weight: matching.total_weight(),
            unassigned: pool
                .candidates()
                .iter()
                .filter(|c| !matching.contains(&c.requester))
                .map(|c| c.requester.clone())
                .collect(),
        }
    }
}

/// Outcome of a top-N priority selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityReport {
    pub selected: usize,
    pub waitlisted: usize,
}

impl PriorityReport {
    pub fn new(entries: &[PriorityEntry]) -> Self {
        let waitlisted = entries
            .iter()
            .filter(|e| matches!(e.status, SelectionStatus::Waitlist { .. }))
            .count();
        Self {
            selected: entries.len() - waitlisted,
            waitlisted,
        }
    }
}

/// Outcome of one allocation run over an occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub occurrence: OccurrenceId,
    pub strategy: AllocationStrategy,
    /// One entry per optimization phase; empty for top-N runs.
    pub phases: Vec<PhaseReport>,
    pub priority: Option<PriorityReport>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn total_weight(&self) -> u64 {
        self.phases.iter().map(|p| p.total_weight).sum()
    }

    pub fn assigned(&self) -> usize {
        self.phases.iter().map(|p| p.assigned).sum()
    }
}

/// Result of a ready-gated run check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadyCheck {
    pub selection: SelectionState,
    /// Present only when the gate was open and a run happened.
    pub report: Option<RunReport>,
}

/// One phase of a dry run: optimal and greedy over the same pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedPhase {
    pub optimal: PhaseReport,
    pub greedy: PhaseReport,
    pub conflicts: Vec<Conflict>,
}

/// A dry run comparing the engine with the greedy baseline. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    pub occurrence: OccurrenceId,
    pub phases: Vec<SimulatedPhase>,
}

/// Everything stored for one occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccurrenceStatus {
    pub occurrence: OccurrenceId,
    pub selection: Option<SelectionState>,
    pub registrations: Vec<Registration>,
    pub reservations: Vec<Reservation>,
}

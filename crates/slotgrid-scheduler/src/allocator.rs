//! Allocator — runs an occurrence's strategy and writes the result.
//!
//! Runs over the same occurrence are serialized by a per-occurrence lock,
//! and the CPU-bound work (matching plus the store transactions) executes
//! on tokio's blocking pool.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use slotgrid_core::config::OccurrenceConfig;
use slotgrid_core::{AllocationStrategy, OccurrenceId, PartitionTag, SlotgridConfig};
use slotgrid_placement::{Pool, allocate_greedy, optimize, rank_top_n};
use slotgrid_state::{Registration, SelectionState, StateStore};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::error::{SchedulerError, SchedulerResult};
use crate::intake::Intake;
use crate::materializer;
use crate::partitioner::{Partitioner, retag_for_main, retag_for_secondary};
use crate::report::{
    OccurrenceStatus, PhaseReport, PriorityReport, ReadyCheck, RunReport, SimulatedPhase,
    Simulation,
};

pub struct Allocator {
    state: StateStore,
    config: Arc<SlotgridConfig>,
    /// Per-occurrence run locks.
    locks: Arc<RwLock<HashMap<OccurrenceId, Arc<Mutex<()>>>>>,
}

impl Allocator {
    pub fn new(state: StateStore, config: Arc<SlotgridConfig>) -> Self {
        Self {
            state,
            config,
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn config(&self) -> &SlotgridConfig {
        &self.config
    }

    fn occurrence(&self, occurrence: &str) -> SchedulerResult<&OccurrenceConfig> {
        self.config
            .occurrence(occurrence)
            .ok_or_else(|| SchedulerError::OccurrenceNotFound(occurrence.to_string()))
    }

    async fn lock_for(&self, occurrence: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(occurrence) {
                return Arc::clone(lock);
            }
        }
        let mut locks = self.locks.write().await;
        Arc::clone(locks.entry(occurrence.to_string()).or_default())
    }

    /// Accept a registration. Holds the occurrence's run lock, so a
    /// registration never lands between a run's phases.
    pub async fn register(
        &self,
        occurrence: &str,
        requester: &str,
        weight: u32,
        candidate_slots: Value,
        list: PartitionTag,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Registration> {
        self.occurrence(occurrence)?;
        let lock = self.lock_for(occurrence).await;
        let _guard = lock.lock().await;
        Intake::new(self.state.clone(), Arc::clone(&self.config))
            .register(occurrence, requester, weight, candidate_slots, list, now)
    }

    /// Run the occurrence's strategy now, regardless of its gate.
    ///
    /// Safe to repeat: each pool's previous assignments are replaced.
    pub async fn run(&self, occurrence: &str, now: DateTime<Utc>) -> SchedulerResult<RunReport> {
        self.occurrence(occurrence)?;
        let lock = self.lock_for(occurrence).await;
        let _guard = lock.lock().await;
        self.run_locked(occurrence, now).await
    }

    /// Run only if `ready_at` has passed and the selection is not completed.
    pub async fn run_if_ready(
        &self,
        occurrence: &str,
        now: DateTime<Utc>,
    ) -> SchedulerResult<ReadyCheck> {
        self.occurrence(occurrence)?;
        let lock = self.lock_for(occurrence).await;
        let _guard = lock.lock().await;

        let selection = self
            .state
            .get_selection_state(occurrence)?
            .unwrap_or_else(|| SelectionState::new(occurrence));
        if !selection.is_due(now) {
            debug!(%occurrence, ready_at = ?selection.ready_at, completed = selection.completed, "not due");
            return Ok(ReadyCheck {
                selection,
                report: None,
            });
        }

        let report = self.run_locked(occurrence, now).await?;
        let selection = self
            .state
            .get_selection_state(occurrence)?
            .unwrap_or_else(|| SelectionState::new(occurrence));
        Ok(ReadyCheck {
            selection,
            report: Some(report),
        })
    }

    /// Check every configured occurrence's gate. Failures are logged and do
    /// not stop the remaining occurrences.
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<RunReport> {
        let mut reports = Vec::new();
        for occ in &self.config.occurrences {
            match self.run_if_ready(&occ.id, now).await {
                Ok(ReadyCheck {
                    report: Some(report),
                    ..
                }) => reports.push(report),
                Ok(_) => {}
                Err(e) => error!(occurrence = %occ.id, error = %e, "scheduled run failed"),
            }
        }
        info!(ran = reports.len(), "tick complete");
        reports
    }

    async fn run_locked(&self, occurrence: &str, now: DateTime<Utc>) -> SchedulerResult<RunReport> {
        let occ = self.occurrence(occurrence)?.clone();
        let strategy = self.config.strategy_for(&occ);
        let slot_minutes = self.config.grid_for(&occ)?.slot_minutes();
        let state = self.state.clone();

        tokio::task::spawn_blocking(move || execute(&state, &occ, strategy, slot_minutes, now))
            .await
            .map_err(|e| SchedulerError::Worker(e.to_string()))?
    }

    /// Dry run: optimal and greedy over the pools a run would form. Writes
    /// nothing.
    pub fn simulate(&self, occurrence: &str) -> SchedulerResult<Simulation> {
        let occ = self.occurrence(occurrence)?;
        let slot_minutes = self.config.grid_for(occ)?.slot_minutes();
        let now = Utc::now();

        let mut registrations = self.state.list_registrations(occurrence)?;
        for reg in registrations.iter_mut() {
            retag_for_main(reg, now);
        }
        let main_pool = Pool::from_registrations(PartitionTag::Main, &registrations, slot_minutes);
        let main = optimize(&main_pool);
        let mut phases = vec![simulate_phase(&main_pool)];

        if occ.dual_list {
            for reg in registrations.iter_mut() {
                retag_for_secondary(reg, &main, now);
            }
            let secondary_pool =
                Pool::from_registrations(PartitionTag::Secondary, &registrations, slot_minutes);
            phases.push(simulate_phase(&secondary_pool));
        }

        Ok(Simulation {
            occurrence: occurrence.to_string(),
            phases,
        })
    }

    /// Everything stored for an occurrence.
    pub fn status(&self, occurrence: &str) -> SchedulerResult<OccurrenceStatus> {
        self.occurrence(occurrence)?;
        Ok(OccurrenceStatus {
            occurrence: occurrence.to_string(),
            selection: self.state.get_selection_state(occurrence)?,
            registrations: self.state.list_registrations(occurrence)?,
            reservations: self.state.list_reservations(occurrence)?,
        })
    }
}

fn simulate_phase(pool: &Pool) -> SimulatedPhase {
    let optimal = optimize(pool);
    let greedy = allocate_greedy(pool);
    SimulatedPhase {
        optimal: PhaseReport::new(pool, &optimal),
        greedy: PhaseReport::new(pool, &greedy.matching),
        conflicts: greedy.conflicts,
    }
}

/// One full run over an occurrence. Runs on the blocking pool.
fn execute(
    state: &StateStore,
    occ: &OccurrenceConfig,
    strategy: AllocationStrategy,
    slot_minutes: u32,
    now: DateTime<Utc>,
) -> SchedulerResult<RunReport> {
    info!(occurrence = %occ.id, strategy = strategy.label(), dual_list = occ.dual_list, "run started");

    let mut phases = Vec::new();
    let mut priority = None;
    match strategy {
        AllocationStrategy::OptimalMatching => {
            let partitioner = Partitioner::new(state, &occ.id, slot_minutes);

            let main_pool = partitioner.main_pool(now)?;
            let main = optimize(&main_pool);
            materializer::materialize(state, &occ.id, &main, now)?;
            phases.push(PhaseReport::new(&main_pool, &main));

            if occ.dual_list {
                let secondary_pool = partitioner.secondary_pool(&main, now)?;
                let secondary = optimize(&secondary_pool);
                materializer::materialize(state, &occ.id, &secondary, now)?;
                phases.push(PhaseReport::new(&secondary_pool, &secondary));
            } else {
                materializer::clear(state, &occ.id, PartitionTag::Secondary, now)?;
            }
        }
        AllocationStrategy::TopNPriority { n } => {
            let registrations = state.list_registrations(&occ.id)?;
            let entries = rank_top_n(&registrations, n);
            materializer::apply_priority(state, &occ.id, &entries, now)?;
            priority = Some(PriorityReport::new(&entries));
        }
    }

    let selection = materializer::complete(state, &occ.id, now)?;
    let report = RunReport {
        occurrence: occ.id.clone(),
        strategy,
        phases,
        priority,
        completed_at: selection.completed_at,
    };
    info!(
        occurrence = %occ.id,
        assigned = report.assigned(),
        total_weight = report.total_weight(),
        "run finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;
    use std::time::Duration;

    const OCC: &str = "2025-12-04";

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, d, h, m, 0).unwrap()
    }

    fn sample_allocator() -> Allocator {
        let date = NaiveDate::from_ymd_opt(2025, 12, 4).unwrap();
        let config = SlotgridConfig::scaffold(date, false);
        Allocator::new(StateStore::open_in_memory().unwrap(), Arc::new(config))
    }

    #[tokio::test]
    async fn register_waits_for_a_run_in_progress() {
        let alloc = Arc::new(sample_allocator());
        alloc
            .register(OCC, "alice", 40, json!(["2025-12-04T08:00:00Z"]), PartitionTag::Main, at(1, 9, 0))
            .await
            .unwrap();

        let lock = alloc.lock_for(OCC).await;
        let guard = lock.lock().await;

        let late = tokio::spawn({
            let alloc = Arc::clone(&alloc);
            async move {
                alloc
                    .register(OCC, "bob", 90, json!(["2025-12-04T08:00:00Z"]), PartitionTag::Main, at(2, 9, 0))
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!late.is_finished());

        // Stands in for the run that holds the lock and completes.
        alloc.state.mark_completed(OCC, at(2, 9, 0)).unwrap();
        drop(guard);

        let err = late.await.unwrap().unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyCompleted(_)));
        assert!(alloc.state.get_registration(OCC, "bob").unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_occurrence_does_not_allocate_a_lock() {
        let alloc = sample_allocator();

        let run = alloc.run("2025-12-05", at(2, 9, 0)).await.unwrap_err();
        let register = alloc
            .register("2025-12-05", "alice", 40, json!([]), PartitionTag::Main, at(1, 9, 0))
            .await
            .unwrap_err();

        assert!(matches!(run, SchedulerError::OccurrenceNotFound(_)));
        assert!(matches!(register, SchedulerError::OccurrenceNotFound(_)));
        assert!(alloc.locks.read().await.is_empty());
    }
}

//! Intake — validates and stores registrations.
//!
//! A requester holds one registration per occurrence, in one list.
//! Re-registering in the same list before the run overwrites the weight
//! and candidate slots; once the occurrence's selection is completed,
//! registrations are frozen. The first registration of an occurrence arms
//! its `ready_at` gate.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use slotgrid_core::{PartitionTag, SlotgridConfig};
use slotgrid_placement::parse_candidate_slots;
use slotgrid_state::{RegisterOutcome, Registration, StateStore};
use tracing::info;

use crate::error::{SchedulerError, SchedulerResult};

#[derive(Clone)]
pub struct Intake {
    state: StateStore,
    config: Arc<SlotgridConfig>,
}

impl Intake {
    pub fn new(state: StateStore, config: Arc<SlotgridConfig>) -> Self {
        Self { state, config }
    }

    /// Store (or overwrite) a requester's registration.
    pub fn register(
        &self,
        occurrence: &str,
        requester: &str,
        weight: u32,
        candidate_slots: Value,
        list: PartitionTag,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Registration> {
        let occ = self
            .config
            .occurrence(occurrence)
            .ok_or_else(|| SchedulerError::OccurrenceNotFound(occurrence.to_string()))?;

        let requester = requester.trim();
        if requester.is_empty() {
            return Err(SchedulerError::Intake("requester name is required".into()));
        }
        if requester.contains('/') {
            return Err(SchedulerError::Intake(format!(
                "requester name {requester:?} must not contain '/'"
            )));
        }
        if list == PartitionTag::Secondary && !occ.dual_list {
            return Err(SchedulerError::Intake(format!(
                "occurrence {occurrence} has no secondary list"
            )));
        }

        let grid = self.config.grid_for(occ)?;
        let slots = parse_candidate_slots(&candidate_slots, grid.slot_minutes()).ok_or_else(|| {
            SchedulerError::Intake("candidate slots must be a list of grid-aligned times".into())
        })?;
        if let Some(off_day) = slots.iter().find(|at| !grid.contains(at)) {
            return Err(SchedulerError::Intake(format!(
                "slot {off_day} is not on {}",
                grid.date()
            )));
        }

        let delay = i64::try_from(self.config.selection.ready_delay_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        let ready_at = now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let candidate = Registration::new(occurrence, requester, weight, candidate_slots, list, now);

        let (registration, selection) = match self.state.register(candidate, ready_at)? {
            RegisterOutcome::Stored {
                registration,
                selection,
            } => (registration, selection),
            RegisterOutcome::Completed => {
                return Err(SchedulerError::AlreadyCompleted(occurrence.to_string()));
            }
            RegisterOutcome::OtherList(existing) => {
                return Err(SchedulerError::Intake(format!(
                    "{requester} is already registered in the {existing} list"
                )));
            }
        };

        info!(
            %occurrence,
            %requester,
            weight,
            list = %list,
            slots = slots.len(),
            ready_at = ?selection.ready_at,
            "registration accepted"
        );
        Ok(registration)
    }
}

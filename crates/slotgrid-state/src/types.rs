//! Domain types for the slotgrid state store.
//!
//! These types represent registrations, the reservation records written
//! back after an optimization run, and each occurrence's selection state.
//! All types are serializable to/from JSON for storage in redb tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use slotgrid_core::{OccurrenceId, PartitionTag, RequesterId, SlotId};

// ── Registration ──────────────────────────────────────────────────

/// One requester's declared interest in an occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Registration {
    pub occurrence: OccurrenceId,
    pub requester: RequesterId,
    /// Declared value. Zero excludes the registration from optimization.
    pub weight: u32,
    /// Candidate slots exactly as supplied at intake (expected: array of
    /// slot strings). Parsed lazily so that bad data only affects this
    /// registration.
    pub candidate_slots: serde_json::Value,
    /// The list the requester registered into. Never changed after intake.
    pub requested_partition: PartitionTag,
    /// The pool this registration currently feeds. Only the partitioner
    /// changes it.
    pub partition: PartitionTag,
    /// Slot assigned by the last optimization run of `partition`.
    pub assigned_slot: Option<DateTime<Utc>>,
    /// Outcome of a top-N priority selection.
    #[serde(default)]
    pub status: SelectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Selection outcome for the top-N priority strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelectionStatus {
    #[default]
    Pending,
    Selected,
    Waitlist {
        position: u32,
    },
}

impl Registration {
    pub fn new(
        occurrence: &str,
        requester: &str,
        weight: u32,
        candidate_slots: serde_json::Value,
        list: PartitionTag,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            occurrence: occurrence.to_string(),
            requester: requester.to_string(),
            weight,
            candidate_slots,
            requested_partition: list,
            partition: list,
            assigned_slot: None,
            status: SelectionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the composite key for the registrations table.
    pub fn table_key(&self) -> String {
        registration_key(&self.occurrence, &self.requester)
    }

    /// The slot identity this registration holds, if any.
    pub fn assigned_slot_id(&self) -> Option<SlotId> {
        self.assigned_slot
            .map(|at| SlotId::new(at, self.partition))
    }
}

pub fn registration_key(occurrence: &str, requester: &str) -> String {
    format!("{occurrence}/{requester}")
}

pub(crate) fn registration_prefix(occurrence: &str) -> String {
    format!("{occurrence}/")
}

// ── Reservation ───────────────────────────────────────────────────

/// Mirrored record of one assignment, one per slot identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub occurrence: OccurrenceId,
    pub slot: SlotId,
    pub requester: RequesterId,
    pub weight: u32,
    pub reserved_at: DateTime<Utc>,
}

impl Reservation {
    /// Build the composite key for the reservations table.
    pub fn table_key(&self) -> String {
        reservation_key(&self.occurrence, &self.slot)
    }

    pub fn partition(&self) -> PartitionTag {
        self.slot.partition
    }
}

pub fn reservation_key(occurrence: &str, slot: &SlotId) -> String {
    format!(
        "{}{}",
        reservation_prefix(occurrence, slot.partition),
        slot.at.to_rfc3339()
    )
}

pub(crate) fn reservation_prefix(occurrence: &str, partition: PartitionTag) -> String {
    format!("{occurrence}:{partition}:")
}

// ── Selection state ───────────────────────────────────────────────

/// Per-occurrence gate for the external trigger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionState {
    pub occurrence: OccurrenceId,
    /// Earliest time the selection may run.
    pub ready_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SelectionState {
    pub fn new(occurrence: &str) -> Self {
        Self {
            occurrence: occurrence.to_string(),
            ready_at: None,
            completed: false,
            completed_at: None,
        }
    }

    /// Whether a run is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.ready_at.is_some_and(|ready| now >= ready)
    }
}

/// Result of [`StateStore::register`](crate::StateStore::register).
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// The registration was inserted or merged.
    Stored {
        registration: Registration,
        selection: SelectionState,
    },
    /// The occurrence's selection is completed; nothing was written.
    Completed,
    /// The requester already holds a registration in another list.
    OtherList(PartitionTag),
}

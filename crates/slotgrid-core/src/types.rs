//! Shared types used across slotgrid crates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of one event occurrence (e.g. `2025-12-04`).
pub type OccurrenceId = String;

/// Opaque requester key, unique per occurrence.
pub type RequesterId = String;

/// Which allocation pool a registration belongs to.
///
/// Each partition has its own independent slot grid: a `main` slot and a
/// `secondary` slot at the same instant never contend.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PartitionTag {
    #[default]
    Main,
    Secondary,
}

impl PartitionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionTag::Main => "main",
            PartitionTag::Secondary => "secondary",
        }
    }
}

impl fmt::Display for PartitionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A slot's identity: its instant on the grid plus the partition it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId {
    pub at: DateTime<Utc>,
    pub partition: PartitionTag,
}

impl SlotId {
    pub fn new(at: DateTime<Utc>, partition: PartitionTag) -> Self {
        Self { at, partition }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.at.to_rfc3339(), self.partition)
    }
}

/// How an occurrence's registrations are turned into a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationStrategy {
    /// Legacy mode: the first `n` main-list registrations by weight (then
    /// registration time) are selected, the rest are waitlisted. No slots
    /// are assigned.
    TopNPriority { n: u32 },
    /// Value-maximizing one-to-one matching of registrations to slots.
    OptimalMatching,
}

impl AllocationStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            AllocationStrategy::TopNPriority { .. } => "top-n-priority",
            AllocationStrategy::OptimalMatching => "optimal-matching",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slot_id_display_carries_partition() {
        let at = Utc.with_ymd_and_hms(2025, 12, 2, 8, 0, 0).unwrap();
        let main = SlotId::new(at, PartitionTag::Main);
        let secondary = SlotId::new(at, PartitionTag::Secondary);

        assert_eq!(main.to_string(), "2025-12-02T08:00:00+00:00_main");
        assert_ne!(main, secondary);
    }

    #[test]
    fn strategy_serializes_with_kind_tag() {
        let rendered = toml::to_string(&AllocationStrategy::TopNPriority { n: 20 }).unwrap();
        assert!(rendered.contains("kind = \"top_n_priority\""));
        assert!(rendered.contains("n = 20"));
        assert_eq!(AllocationStrategy::OptimalMatching.label(), "optimal-matching");
    }
}

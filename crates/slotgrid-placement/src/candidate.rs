//! Conversion between stored registrations and pool candidates.
//!
//! Bridges `slotgrid_state::Registration` (raw JSON candidate slots) to the
//! engine's [`Candidate`] (a parsed, de-duplicated set of instants).

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::Value;
use slotgrid_core::{PartitionTag, RequesterId, parse_slot};
use slotgrid_state::Registration;
use tracing::warn;

/// A registration as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub requester: RequesterId,
    pub weight: u32,
    pub slots: BTreeSet<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Candidate {
    /// Zero weight or an empty slot set excludes a candidate from matching.
    pub fn is_eligible(&self) -> bool {
        self.weight > 0 && !self.slots.is_empty()
    }
}

/// Parse a stored candidate-slot value.
///
/// Accepts a JSON array of slot strings; duplicates collapse. `null` is an
/// empty set. Returns `None` if the value is not an array of strings or any
/// element is not an aligned slot.
pub fn parse_candidate_slots(raw: &Value, slot_minutes: u32) -> Option<BTreeSet<DateTime<Utc>>> {
    match raw {
        Value::Null => Some(BTreeSet::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().and_then(|s| parse_slot(s, slot_minutes)))
            .collect(),
        _ => None,
    }
}

/// Convert a [`Registration`] into a [`Candidate`].
///
/// Malformed candidate data degrades to an empty set, which excludes the
/// registration without failing the run.
pub fn registration_to_candidate(reg: &Registration, slot_minutes: u32) -> Candidate {
    let slots = parse_candidate_slots(&reg.candidate_slots, slot_minutes).unwrap_or_else(|| {
        warn!(
            occurrence = %reg.occurrence,
            requester = %reg.requester,
            "unparseable candidate slots, treating as empty"
        );
        BTreeSet::new()
    });
    Candidate {
        requester: reg.requester.clone(),
        weight: reg.weight,
        slots,
        created_at: reg.created_at,
    }
}

/// The working set of one optimization run: every candidate of one
/// partition, ordered by requester id.
#[derive(Debug, Clone)]
pub struct Pool {
    pub partition: PartitionTag,
    candidates: Vec<Candidate>,
}

impl Pool {
    pub fn new(partition: PartitionTag, mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| a.requester.cmp(&b.requester));
        Self {
            partition,
            candidates,
        }
    }

    /// Build a pool from the registrations currently tagged `partition`.
    pub fn from_registrations(
        partition: PartitionTag,
        registrations: &[Registration],
        slot_minutes: u32,
    ) -> Self {
        let candidates = registrations
            .iter()
            .filter(|reg| reg.partition == partition)
            .map(|reg| registration_to_candidate(reg, slot_minutes))
            .collect();
        Self::new(partition, candidates)
    }

    /// Every candidate, eligible or not.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Candidates with weight > 0 and at least one slot, by requester id.
    pub fn eligible(&self) -> Vec<&Candidate> {
        self.candidates.iter().filter(|c| c.is_eligible()).collect()
    }

    /// Number of candidates excluded up front.
    pub fn excluded(&self) -> usize {
        self.candidates.iter().filter(|c| !c.is_eligible()).count()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 4, h, m, 0).unwrap()
    }

    fn sample_registration(requester: &str, weight: u32, slots: Value) -> Registration {
        Registration::new("thu", requester, weight, slots, PartitionTag::Main, at(0, 0))
    }

    #[test]
    fn parses_and_collapses_duplicates() {
        let raw = json!([
            "2025-12-04T08:00:00Z",
            "2025-12-04T08:00:00+00:00",
            "2025-12-04T08:30:00"
        ]);
        let slots = parse_candidate_slots(&raw, 30).unwrap();
        assert_eq!(slots.into_iter().collect::<Vec<_>>(), vec![at(8, 0), at(8, 30)]);
    }

    #[test]
    fn null_is_empty_set() {
        assert_eq!(parse_candidate_slots(&Value::Null, 30), Some(BTreeSet::new()));
    }

    #[test]
    fn rejects_non_array_and_bad_elements() {
        assert!(parse_candidate_slots(&json!("2025-12-04T08:00:00Z"), 30).is_none());
        assert!(parse_candidate_slots(&json!([1, 2]), 30).is_none());
        assert!(parse_candidate_slots(&json!(["2025-12-04T08:00:00Z", "soon"]), 30).is_none());
        assert!(parse_candidate_slots(&json!(["2025-12-04T08:10:00Z"]), 30).is_none());
    }

    #[test]
    fn malformed_registration_degrades_to_ineligible() {
        let reg = sample_registration("alice", 40, json!({"slot": "08:00"}));
        let candidate = registration_to_candidate(&reg, 30);

        assert_eq!(candidate.weight, 40);
        assert!(candidate.slots.is_empty());
        assert!(!candidate.is_eligible());
    }

    #[test]
    fn zero_weight_is_ineligible() {
        let reg = sample_registration("alice", 0, json!(["2025-12-04T08:00:00Z"]));
        assert!(!registration_to_candidate(&reg, 30).is_eligible());
    }

    #[test]
    fn pool_filters_partition_and_sorts() {
        let mut other = sample_registration("aaron", 10, json!(["2025-12-04T09:00:00Z"]));
        other.partition = PartitionTag::Secondary;
        let regs = vec![
            sample_registration("zed", 10, json!(["2025-12-04T08:00:00Z"])),
            sample_registration("bob", 0, json!(["2025-12-04T08:30:00Z"])),
            sample_registration("amy", 5, json!(["2025-12-04T08:00:00Z"])),
            other,
        ];

        let pool = Pool::from_registrations(PartitionTag::Main, &regs, 30);

        assert_eq!(pool.len(), 3);
        assert_eq!(pool.excluded(), 1);
        let eligible: Vec<&str> = pool.eligible().iter().map(|c| c.requester.as_str()).collect();
        assert_eq!(eligible, vec!["amy", "zed"]);
    }
}

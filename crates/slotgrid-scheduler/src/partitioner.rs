//! Partitioner — decides which registrations feed which pool.
//!
//! Phase 1 sees every registration in the list it was registered into, so
//! the main pool is the same on every run. Phase 2 (dual-list occurrences
//! only) re-tags every registration left unmatched by the Phase 1 matching
//! as secondary. These re-tags are the only partition changes after intake.

use chrono::{DateTime, Utc};
use slotgrid_core::PartitionTag;
use slotgrid_placement::{Matching, Pool};
use slotgrid_state::{Registration, StateStore};
use tracing::info;

use crate::error::SchedulerResult;

/// Restore the registered list. Returns true if the tag changed.
pub fn retag_for_main(reg: &mut Registration, now: DateTime<Utc>) -> bool {
    if reg.partition == reg.requested_partition {
        return false;
    }
    reg.partition = reg.requested_partition;
    reg.updated_at = now;
    true
}

/// Move a registration unmatched in Phase 1 to the secondary pool.
/// Matched registrations are never moved. Returns true if the tag changed.
pub fn retag_for_secondary(reg: &mut Registration, main: &Matching, now: DateTime<Utc>) -> bool {
    if main.contains(&reg.requester) || reg.partition == PartitionTag::Secondary {
        return false;
    }
    reg.partition = PartitionTag::Secondary;
    reg.updated_at = now;
    true
}

/// Store-backed partitioner for one occurrence.
pub struct Partitioner<'a> {
    state: &'a StateStore,
    occurrence: &'a str,
    slot_minutes: u32,
}

impl<'a> Partitioner<'a> {
    pub fn new(state: &'a StateStore, occurrence: &'a str, slot_minutes: u32) -> Self {
        Self {
            state,
            occurrence,
            slot_minutes,
        }
    }

    /// Phase 1: reset every partition tag and build the main pool.
    pub fn main_pool(&self, now: DateTime<Utc>) -> SchedulerResult<Pool> {
        let reset = self
            .state
            .update_registrations(self.occurrence, |reg| retag_for_main(reg, now))?;
        let registrations = self.state.list_registrations(self.occurrence)?;
        let pool = Pool::from_registrations(PartitionTag::Main, &registrations, self.slot_minutes);
        info!(
            occurrence = %self.occurrence,
            reset,
            pool_size = pool.len(),
            "main pool formed"
        );
        Ok(pool)
    }

    /// Phase 2: re-tag Phase 1 leftovers and build the secondary pool.
    pub fn secondary_pool(&self, main: &Matching, now: DateTime<Utc>) -> SchedulerResult<Pool> {
        let moved = self
            .state
            .update_registrations(self.occurrence, |reg| retag_for_secondary(reg, main, now))?;
        let registrations = self.state.list_registrations(self.occurrence)?;
        let pool =
            Pool::from_registrations(PartitionTag::Secondary, &registrations, self.slot_minutes);
        info!(
            occurrence = %self.occurrence,
            moved,
            pool_size = pool.len(),
            "secondary pool formed"
        );
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use slotgrid_placement::optimize;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 4, h, m, 0).unwrap()
    }

    fn make_registration(requester: &str, weight: u32, slots: &[&str], list: PartitionTag) -> Registration {
        Registration::new("thu", requester, weight, json!(slots), list, at(0, 0))
    }

    fn seeded_store() -> StateStore {
        let store = StateStore::open_in_memory().unwrap();
        for reg in [
            make_registration("alice", 50, &["2025-12-04T08:00:00Z"], PartitionTag::Main),
            make_registration("bob", 40, &["2025-12-04T08:00:00Z"], PartitionTag::Main),
            make_registration("carol", 30, &["2025-12-04T09:00:00Z"], PartitionTag::Secondary),
        ] {
            store.put_registration(&reg).unwrap();
        }
        store
    }

    #[test]
    fn main_pool_uses_registered_list() {
        let store = seeded_store();
        let mut moved = store.get_registration("thu", "carol").unwrap().unwrap();
        moved.partition = PartitionTag::Main;
        store.put_registration(&moved).unwrap();

        let pool = Partitioner::new(&store, "thu", 30).main_pool(at(12, 0)).unwrap();

        let names: Vec<&str> = pool.candidates().iter().map(|c| c.requester.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        let carol = store.get_registration("thu", "carol").unwrap().unwrap();
        assert_eq!(carol.partition, PartitionTag::Secondary);
    }

    #[test]
    fn secondary_pool_takes_main_leftovers() {
        let store = seeded_store();
        let partitioner = Partitioner::new(&store, "thu", 30);
        let main = optimize(&partitioner.main_pool(at(12, 0)).unwrap());
        assert!(main.contains("alice"));

        let pool = partitioner.secondary_pool(&main, at(12, 0)).unwrap();

        let names: Vec<&str> = pool.candidates().iter().map(|c| c.requester.as_str()).collect();
        assert_eq!(names, vec!["bob", "carol"]);
        let alice = store.get_registration("thu", "alice").unwrap().unwrap();
        assert_eq!(alice.partition, PartitionTag::Main);
        let bob = store.get_registration("thu", "bob").unwrap().unwrap();
        assert_eq!(bob.partition, PartitionTag::Secondary);
        assert_eq!(bob.requested_partition, PartitionTag::Main);
    }

    #[test]
    fn retag_helpers_report_changes() {
        let mut reg = make_registration("dan", 1, &[], PartitionTag::Main);
        let main = Matching::empty(PartitionTag::Main);

        assert!(!retag_for_main(&mut reg, at(1, 0)));
        assert!(retag_for_secondary(&mut reg, &main, at(1, 0)));
        assert!(!retag_for_secondary(&mut reg, &main, at(2, 0)));
        assert_eq!(reg.updated_at, at(1, 0));
        assert!(retag_for_main(&mut reg, at(3, 0)));
        assert_eq!(reg.partition, PartitionTag::Main);
    }

    #[test]
    fn empty_occurrence_gives_empty_pools() {
        let store = StateStore::open_in_memory().unwrap();
        let partitioner = Partitioner::new(&store, "none", 30);
        let main = partitioner.main_pool(at(0, 0)).unwrap();
        assert!(main.is_empty());
        let secondary = partitioner
            .secondary_pool(&Matching::empty(PartitionTag::Main), at(0, 0))
            .unwrap();
        assert!(secondary.is_empty());
    }
}

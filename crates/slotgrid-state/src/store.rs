//! StateStore — redb-backed persistence for slotgrid.
//!
//! Provides typed operations over registrations, reservations, and
//! selection state. All values are JSON-serialized into redb's `&[u8]`
//! value columns. The store supports both on-disk and in-memory backends
//! (the latter for testing).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

fn encode<T: Serialize>(value: &T) -> StateResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(map_err!(Serialize))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StateResult<T> {
    serde_json::from_slice(bytes).map_err(map_err!(Deserialize))
}

/// Decode every entry whose key starts with `prefix`.
fn scan_prefix<T, R>(table: &R, prefix: &str) -> StateResult<Vec<(String, T)>>
where
    T: DeserializeOwned,
    R: ReadableTable<&'static str, &'static [u8]>,
{
    let mut results = Vec::new();
    for entry in table.range(prefix..).map_err(map_err!(Read))? {
        let (key, value) = entry.map_err(map_err!(Read))?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        results.push((key.to_string(), decode(value.value())?));
    }
    Ok(results)
}

fn put_value<T: Serialize>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    value: &T,
) -> StateResult<()> {
    let bytes = encode(value)?;
    table
        .insert(key, bytes.as_slice())
        .map_err(map_err!(Write))?;
    Ok(())
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
        txn.open_table(RESERVATIONS).map_err(map_err!(Table))?;
        txn.open_table(SELECTION_STATE).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Registrations ──────────────────────────────────────────────

    /// Insert or overwrite a registration.
    pub fn put_registration(&self, reg: &Registration) -> StateResult<()> {
        let key = reg.table_key();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
            put_value(&mut table, &key, reg)?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "registration stored");
        Ok(())
    }

    /// Get one requester's registration for an occurrence.
    pub fn get_registration(
        &self,
        occurrence: &str,
        requester: &str,
    ) -> StateResult<Option<Registration>> {
        let key = registration_key(occurrence, requester);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    /// List all registrations of an occurrence, ordered by requester key.
    pub fn list_registrations(&self, occurrence: &str) -> StateResult<Vec<Registration>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
        let entries = scan_prefix(&table, &registration_prefix(occurrence))?;
        Ok(entries.into_iter().map(|(_, reg)| reg).collect())
    }

    /// Insert a registration, or merge into the existing one, and arm the
    /// occurrence's `ready_at` if unset, all in one write transaction.
    ///
    /// A merge only replaces `weight`, `candidate_slots` and `updated_at`;
    /// the assignment, current partition and status are left to the run.
    /// Nothing is written when the selection is completed or the
    /// requester is registered in a different list.
    pub fn register(
        &self,
        candidate: Registration,
        ready_at: DateTime<Utc>,
    ) -> StateResult<RegisterOutcome> {
        let occurrence = candidate.occurrence.clone();
        let key = candidate.table_key();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let outcome;
        {
            let mut states = txn.open_table(SELECTION_STATE).map_err(map_err!(Table))?;
            let existing_state: Option<SelectionState> =
                match states.get(occurrence.as_str()).map_err(map_err!(Read))? {
                    Some(guard) => Some(decode(guard.value())?),
                    None => None,
                };
            if existing_state.as_ref().is_some_and(|s| s.completed) {
                return Ok(RegisterOutcome::Completed);
            }

            let mut registrations = txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
            let existing: Option<Registration> =
                match registrations.get(key.as_str()).map_err(map_err!(Read))? {
                    Some(guard) => Some(decode(guard.value())?),
                    None => None,
                };
            let registration = match existing {
                Some(existing) if existing.requested_partition != candidate.requested_partition => {
                    return Ok(RegisterOutcome::OtherList(existing.requested_partition));
                }
                Some(mut existing) => {
                    existing.weight = candidate.weight;
                    existing.candidate_slots = candidate.candidate_slots;
                    existing.updated_at = candidate.updated_at;
                    existing
                }
                None => candidate,
            };
            put_value(&mut registrations, &key, &registration)?;

            let mut selection =
                existing_state.unwrap_or_else(|| SelectionState::new(&occurrence));
            if selection.ready_at.is_none() {
                selection.ready_at = Some(ready_at);
                put_value(&mut states, &occurrence, &selection)?;
            }
            outcome = RegisterOutcome::Stored {
                registration,
                selection,
            };
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "registration stored");
        Ok(outcome)
    }

    /// Apply `apply` to every registration of an occurrence in a single
    /// write transaction. `apply` returns true when it changed the record;
    /// only changed records are written back. Returns the number changed.
    pub fn update_registrations<F>(&self, occurrence: &str, mut apply: F) -> StateResult<u32>
    where
        F: FnMut(&mut Registration) -> bool,
    {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let mut changed = 0;
        {
            let mut table = txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
            let entries: Vec<(String, Registration)> =
                scan_prefix(&table, &registration_prefix(occurrence))?;
            for (key, mut reg) in entries {
                if apply(&mut reg) {
                    put_value(&mut table, &key, &reg)?;
                    changed += 1;
                }
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%occurrence, changed, "registrations updated");
        Ok(changed)
    }

    // ── Assignments ────────────────────────────────────────────────

    /// Replace a pool's assignments with `assignments` (requester → slot).
    ///
    /// Within one write transaction: removes every reservation of
    /// `(occurrence, partition)`, clears `assigned_slot` on every
    /// registration currently in `partition`, then writes the new
    /// assignment onto each registration and mirrors it as a
    /// [`Reservation`]. Fails (and writes nothing) if a requester is not in
    /// the pool or two requesters share a slot. Returns the number written.
    pub fn replace_assignments(
        &self,
        occurrence: &str,
        partition: PartitionTag,
        assignments: &BTreeMap<RequesterId, DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> StateResult<u32> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let cleared;
        {
            let mut registrations = txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
            let mut reservations = txn.open_table(RESERVATIONS).map_err(map_err!(Table))?;

            let stale: Vec<(String, Reservation)> =
                scan_prefix(&reservations, &reservation_prefix(occurrence, partition))?;
            for (key, _) in &stale {
                reservations.remove(key.as_str()).map_err(map_err!(Write))?;
            }
            cleared = stale.len();

            let mut pool: BTreeMap<RequesterId, Registration> = BTreeMap::new();
            let entries: Vec<(String, Registration)> =
                scan_prefix(&registrations, &registration_prefix(occurrence))?;
            for (key, mut reg) in entries {
                if reg.partition != partition {
                    continue;
                }
                if reg.assigned_slot.take().is_some() {
                    reg.updated_at = now;
                    put_value(&mut registrations, &key, &reg)?;
                }
                pool.insert(reg.requester.clone(), reg);
            }

            for (requester, at) in assignments {
                let reg = pool.get_mut(requester).ok_or_else(|| {
                    StateError::NotFound(format!(
                        "registration {} in {partition} pool",
                        registration_key(occurrence, requester)
                    ))
                })?;
                let reservation = Reservation {
                    occurrence: occurrence.to_string(),
                    slot: SlotId::new(*at, partition),
                    requester: requester.clone(),
                    weight: reg.weight,
                    reserved_at: now,
                };
                let key = reservation.table_key();
                if reservations.get(key.as_str()).map_err(map_err!(Read))?.is_some() {
                    return Err(StateError::SlotTaken(key));
                }
                put_value(&mut reservations, &key, &reservation)?;

                reg.assigned_slot = Some(*at);
                reg.updated_at = now;
                put_value(&mut registrations, &reg.table_key(), &*reg)?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            %occurrence,
            %partition,
            cleared,
            written = assignments.len(),
            "pool assignments replaced"
        );
        Ok(assignments.len() as u32)
    }

    // ── Reservations ───────────────────────────────────────────────

    /// List an occurrence's reservations across both partitions.
    pub fn list_reservations(&self, occurrence: &str) -> StateResult<Vec<Reservation>> {
        let mut all = self.list_reservations_for_partition(occurrence, PartitionTag::Main)?;
        all.extend(self.list_reservations_for_partition(occurrence, PartitionTag::Secondary)?);
        Ok(all)
    }

    /// List the reservations of one pool, ordered by slot.
    pub fn list_reservations_for_partition(
        &self,
        occurrence: &str,
        partition: PartitionTag,
    ) -> StateResult<Vec<Reservation>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESERVATIONS).map_err(map_err!(Table))?;
        let entries = scan_prefix(&table, &reservation_prefix(occurrence, partition))?;
        Ok(entries.into_iter().map(|(_, res)| res).collect())
    }

    // ── Selection state ────────────────────────────────────────────

    pub fn get_selection_state(&self, occurrence: &str) -> StateResult<Option<SelectionState>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SELECTION_STATE).map_err(map_err!(Table))?;
        match table.get(occurrence).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Set `ready_at` unless one is already recorded. Returns the state.
    pub fn set_ready_if_unset(
        &self,
        occurrence: &str,
        ready_at: DateTime<Utc>,
    ) -> StateResult<SelectionState> {
        self.modify_selection_state(occurrence, |state| {
            if state.ready_at.is_none() {
                state.ready_at = Some(ready_at);
            }
        })
    }

    /// Mark the occurrence's selection as completed. One-way: an already
    /// completed state keeps its first `completed_at`.
    pub fn mark_completed(
        &self,
        occurrence: &str,
        at: DateTime<Utc>,
    ) -> StateResult<SelectionState> {
        let state = self.modify_selection_state(occurrence, |state| {
            if !state.completed {
                state.completed = true;
                state.completed_at = Some(at);
            }
        })?;
        debug!(%occurrence, completed_at = ?state.completed_at, "selection completed");
        Ok(state)
    }

    /// Read-modify-write of a selection state inside one write transaction.
    fn modify_selection_state<F>(&self, occurrence: &str, modify: F) -> StateResult<SelectionState>
    where
        F: FnOnce(&mut SelectionState),
    {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let state;
        {
            let mut table = txn.open_table(SELECTION_STATE).map_err(map_err!(Table))?;
            let existing: Option<SelectionState> = match table.get(occurrence).map_err(map_err!(Read))? {
                Some(guard) => Some(decode(guard.value())?),
                None => None,
            };
            let mut current = existing.unwrap_or_else(|| SelectionState::new(occurrence));
            modify(&mut current);
            put_value(&mut table, occurrence, &current)?;
            state = current;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(state)
    }
}

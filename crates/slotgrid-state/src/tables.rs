//! redb table definitions for the slotgrid state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain types).

use redb::TableDefinition;

/// Registrations keyed by `{occurrence}/{requester}`.
pub const REGISTRATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("registrations");

/// Reservations keyed by `{occurrence}:{partition}:{slot_rfc3339}`.
///
/// One key per slot identity, so a slot can never hold two reservations.
pub const RESERVATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("reservations");

/// Selection state keyed by `{occurrence}`.
pub const SELECTION_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("selection_state");

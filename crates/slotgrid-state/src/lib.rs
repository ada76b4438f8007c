//! slotgrid-state — registration store for slotgrid.
//!
//! Backed by [redb](https://docs.rs/redb), holds registrations, the
//! reservation records mirrored from each optimization run, and the
//! per-occurrence selection state.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Composite keys (`{occurrence}/{requester}`,
//! `{occurrence}:{partition}:{slot}`) enable prefix scans per occurrence
//! and per pool.
//!
//! Pool replacement ([`StateStore::replace_assignments`]) runs inside one
//! write transaction. redb admits a single writer at a time, so the clear
//! and the rewrite of a pool are never interleaved with another writer.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;

//! Slotgrid assignment engine — optimal matching of requesters to slots.
//!
//! This crate is a pure computation over in-memory pools. It never touches
//! the store; `slotgrid-scheduler` reads registrations, builds pools, and
//! materializes the results.
//!
//! # Components
//!
//! - **`candidate`** — Conversion of stored registrations into pool candidates
//! - **`matrix`** — Requester × slot valuation matrix with infeasibility sentinel
//! - **`hungarian`** — Square assignment solver (Hungarian method, O(n³))
//! - **`optimizer`** — Value-maximizing matching for one pool
//! - **`greedy`** — Legacy first-fit baseline with tie (conflict) detection
//! - **`priority`** — Top-N priority selection with waitlist ranks

pub mod candidate;
pub mod greedy;
pub mod hungarian;
pub mod matrix;
pub mod optimizer;
pub mod priority;

pub use candidate::{Candidate, Pool, parse_candidate_slots, registration_to_candidate};
pub use greedy::{Conflict, GreedyOutcome, allocate as allocate_greedy};
pub use matrix::ValuationMatrix;
pub use optimizer::{Assignment, Matching, optimize};
pub use priority::{PriorityEntry, rank_top_n};

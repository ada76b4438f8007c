//! slotgrid-scheduler — turns stored registrations into a selection.
//!
//! Reads registrations from `slotgrid-state`, forms pools, runs the
//! occurrence's strategy from `slotgrid-placement`, and writes the results
//! back. The scheduler:
//!
//! - Accepts registrations and arms each occurrence's `ready_at` gate
//! - Partitions registrations into the main and secondary pools
//! - Runs optimal matching (or top-N priority) per occurrence
//! - Replaces each pool's stored assignments in one transaction
//! - Marks the occurrence's selection as completed
//!
//! # Architecture
//!
//! ```text
//! Allocator
//!   ├── Intake (validate + store registrations, arm ready_at)
//!   ├── per-occurrence run lock
//!   └── blocking worker
//!       ├── Partitioner (reset / re-tag partitions, build pools)
//!       ├── optimize / rank_top_n
//!       └── Materializer (replace assignments, mark completed)
//! ```

pub mod allocator;
pub mod error;
pub mod intake;
pub mod materializer;
pub mod partitioner;
pub mod report;

pub use allocator::Allocator;
pub use error::{SchedulerError, SchedulerResult};
pub use intake::Intake;
pub use partitioner::Partitioner;
pub use report::{
    OccurrenceStatus, PhaseReport, PriorityReport, ReadyCheck, RunReport, SimulatedPhase, Simulation,
};

pub mod config;
pub mod error;
pub mod grid;
pub mod types;

pub use config::SlotgridConfig;
pub use error::{ConfigError, ConfigResult};
pub use grid::{SlotGrid, parse_slot};
pub use types::*;

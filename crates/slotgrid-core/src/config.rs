//! slotgrid.toml configuration parser.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::grid::{self, DEFAULT_SLOT_MINUTES, SlotGrid};
use crate::types::AllocationStrategy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotgridConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub occurrences: Vec<OccurrenceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("slotgrid.redb"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_strategy")]
    pub strategy: StrategyKind,
    #[serde(default = "default_top_n")]
    pub top_n: u32,
    /// Delay between an occurrence's first registration and its run.
    #[serde(default = "default_ready_delay_secs")]
    pub ready_delay_secs: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            top_n: default_top_n(),
            ready_delay_secs: default_ready_delay_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            slot_minutes: default_slot_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceConfig {
    pub id: String,
    pub date: NaiveDate,
    /// Run a second (secondary-list) optimization over leftovers.
    #[serde(default)]
    pub dual_list: bool,
    /// Overrides `[selection].strategy` for this occurrence.
    pub strategy: Option<StrategyKind>,
}

/// Strategy name as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    OptimalMatching,
    TopNPriority,
}

fn default_strategy() -> StrategyKind {
    StrategyKind::OptimalMatching
}

fn default_top_n() -> u32 {
    20
}

fn default_ready_delay_secs() -> u64 {
    24 * 60 * 60
}

fn default_slot_minutes() -> u32 {
    DEFAULT_SLOT_MINUTES
}

impl SlotgridConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.is_file() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: SlotgridConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a config with a single occurrence on `date`.
    pub fn scaffold(date: NaiveDate, dual_list: bool) -> Self {
        SlotgridConfig {
            occurrences: vec![OccurrenceConfig {
                id: date.format("%Y-%m-%d").to_string(),
                date,
                dual_list,
                strategy: None,
            }],
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        grid::validate_slot_minutes(self.grid.slot_minutes)?;
        if self.selection.top_n == 0 {
            return Err(ConfigError::Invalid("selection.top_n must be positive".into()));
        }
        let mut seen = HashSet::new();
        for occ in &self.occurrences {
            if occ.id.is_empty() || occ.id.contains(['/', ':']) {
                return Err(ConfigError::Invalid(format!(
                    "occurrence id {:?} must be non-empty and contain no '/' or ':'",
                    occ.id
                )));
            }
            if !seen.insert(occ.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate occurrence id {:?}",
                    occ.id
                )));
            }
        }
        Ok(())
    }

    pub fn occurrence(&self, id: &str) -> Option<&OccurrenceConfig> {
        self.occurrences.iter().find(|o| o.id == id)
    }

    /// Resolve the strategy for an occurrence, applying its override.
    pub fn strategy_for(&self, occ: &OccurrenceConfig) -> AllocationStrategy {
        match occ.strategy.unwrap_or(self.selection.strategy) {
            StrategyKind::OptimalMatching => AllocationStrategy::OptimalMatching,
            StrategyKind::TopNPriority => AllocationStrategy::TopNPriority {
                n: self.selection.top_n,
            },
        }
    }

    pub fn grid_for(&self, occ: &OccurrenceConfig) -> ConfigResult<SlotGrid> {
        SlotGrid::new(occ.date, self.grid.slot_minutes)
    }
}

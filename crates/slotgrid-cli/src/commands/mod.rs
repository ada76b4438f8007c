pub mod init;
pub mod register;
pub mod run;
pub mod simulate;
pub mod status;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use slotgrid_core::SlotgridConfig;
use slotgrid_scheduler::{Allocator, PhaseReport};
use slotgrid_state::StateStore;

/// Load the config and open its store.
pub fn open_allocator(config_path: &Path) -> anyhow::Result<Allocator> {
    let config = SlotgridConfig::load_or_default(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let state = StateStore::open(&config.store.path)
        .with_context(|| format!("opening store {}", config.store.path.display()))?;
    Ok(Allocator::new(state, Arc::new(config)))
}

/// One-paragraph text rendering of a phase.
pub fn format_phase(label: &str, phase: &PhaseReport) -> String {
    let mut out = format!(
        "  {label} [{}]: {} of {} assigned, total weight {}",
        phase.partition,
        phase.assigned,
        phase.pool_size - phase.excluded,
        phase.total_weight,
    );
    if phase.excluded > 0 {
        out.push_str(&format!(", {} excluded", phase.excluded));
    }
    if !phase.unassigned.is_empty() {
        out.push_str(&format!("\n    without slots: {}", phase.unassigned.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotgrid_core::PartitionTag;

    #[test]
    fn phase_text_lists_leftovers() {
        let phase = PhaseReport {
            partition: PartitionTag::Main,
            pool_size: 4,
            excluded: 1,
            assigned: 2,
            total_weight: 159,
            unassigned: vec!["C".into(), "Z".into()],
        };
        let text = format_phase("optimal", &phase);
        assert!(text.contains("optimal [main]: 2 of 3 assigned, total weight 159, 1 excluded"));
        assert!(text.contains("without slots: C, Z"));
    }
}

use std::path::Path;

use slotgrid_scheduler::Simulation;

use super::{format_phase, open_allocator};

pub fn simulate(config_path: &Path, occurrence: &str, format: &str) -> anyhow::Result<()> {
    let allocator = open_allocator(config_path)?;
    let simulation = allocator.simulate(occurrence)?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&simulation)?),
        _ => println!("{}", format_simulation(&simulation)),
    }
    Ok(())
}

fn format_simulation(sim: &Simulation) -> String {
    let mut lines = vec![format!("Simulation for {} (nothing written)", sim.occurrence)];
    for phase in &sim.phases {
        lines.push(format_phase("optimal", &phase.optimal));
        lines.push(format_phase("greedy ", &phase.greedy));
        let gain = phase.optimal.total_weight.saturating_sub(phase.greedy.total_weight);
        lines.push(format!("  optimal gains {gain} over greedy"));
        for conflict in &phase.conflicts {
            lines.push(format!(
                "  tie at {} (weight {}): {}",
                conflict.slot,
                conflict.weight,
                conflict.requesters.join(", ")
            ));
        }
    }
    lines.join("\n")
}

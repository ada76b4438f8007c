use std::path::Path;

use chrono::Utc;
use slotgrid_scheduler::RunReport;

use super::{format_phase, open_allocator};

pub async fn run(config_path: &Path, occurrence: &str, format: &str) -> anyhow::Result<()> {
    let allocator = open_allocator(config_path)?;
    let report = allocator.run(occurrence, Utc::now()).await?;
    print_report(&report, format)
}

pub async fn tick(config_path: &Path) -> anyhow::Result<()> {
    let allocator = open_allocator(config_path)?;
    let reports = allocator.tick(Utc::now()).await;
    if reports.is_empty() {
        println!("No occurrence is due.");
    }
    for report in &reports {
        print_report(report, "text")?;
    }
    Ok(())
}

fn print_report(report: &RunReport, format: &str) -> anyhow::Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(report)?),
        _ => println!("{}", format_report(report)),
    }
    Ok(())
}

fn format_report(report: &RunReport) -> String {
    let mut lines = vec![format!(
        "Occurrence {} ({})",
        report.occurrence,
        report.strategy.label()
    )];
    for phase in &report.phases {
        lines.push(format_phase("phase", phase));
    }
    if let Some(priority) = &report.priority {
        lines.push(format!(
            "  selected {}, waitlisted {}",
            priority.selected, priority.waitlisted
        ));
    }
    if let Some(at) = report.completed_at {
        lines.push(format!("  completed at {}", at.to_rfc3339()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotgrid_core::AllocationStrategy;
    use slotgrid_scheduler::PriorityReport;

    #[test]
    fn text_report_for_top_n() {
        let report = RunReport {
            occurrence: "2025-12-01".into(),
            strategy: AllocationStrategy::TopNPriority { n: 20 },
            phases: Vec::new(),
            priority: Some(PriorityReport {
                selected: 20,
                waitlisted: 3,
            }),
            completed_at: None,
        };
        let text = format_report(&report);
        assert!(text.starts_with("Occurrence 2025-12-01 (top-n-priority)"));
        assert!(text.contains("selected 20, waitlisted 3"));
    }
}

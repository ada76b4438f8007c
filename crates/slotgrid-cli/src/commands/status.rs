use std::path::Path;

use slotgrid_scheduler::OccurrenceStatus;
use slotgrid_state::SelectionStatus;

use super::open_allocator;

pub fn status(config_path: &Path, occurrence: &str, format: &str) -> anyhow::Result<()> {
    let allocator = open_allocator(config_path)?;
    let status = allocator.status(occurrence)?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        _ => println!("{}", format_status(&status)),
    }
    Ok(())
}

fn format_status(status: &OccurrenceStatus) -> String {
    let mut lines = vec![format!("Occurrence {}", status.occurrence)];
    match &status.selection {
        Some(sel) if sel.completed => lines.push(format!(
            "  selection completed{}",
            sel.completed_at
                .map(|at| format!(" at {}", at.to_rfc3339()))
                .unwrap_or_default()
        )),
        Some(sel) => lines.push(format!(
            "  selection pending, ready at {}",
            sel.ready_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "-".into())
        )),
        None => lines.push("  no registrations yet".into()),
    }

    for reg in &status.registrations {
        let outcome = match (reg.assigned_slot_id(), reg.status) {
            (Some(slot), _) => format!("→ {slot}"),
            (None, SelectionStatus::Selected) => "selected".into(),
            (None, SelectionStatus::Waitlist { position }) => format!("waitlist #{position}"),
            (None, SelectionStatus::Pending) => "-".into(),
        };
        lines.push(format!(
            "  {:<20} {:>6}  {:<9} {}",
            reg.requester, reg.weight, reg.requested_partition.as_str(), outcome
        ));
    }
    lines.push(format!("  {} reservation(s)", status.reservations.len()));
    lines.join("\n")
}

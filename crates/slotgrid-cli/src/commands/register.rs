use std::path::Path;

use chrono::Utc;
use slotgrid_core::PartitionTag;

use super::open_allocator;

pub async fn register(
    config_path: &Path,
    occurrence: &str,
    requester: &str,
    weight: u32,
    slots: Vec<String>,
    secondary: bool,
) -> anyhow::Result<()> {
    let allocator = open_allocator(config_path)?;
    let list = if secondary {
        PartitionTag::Secondary
    } else {
        PartitionTag::Main
    };
    let slots: Vec<String> = slots
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let reg = allocator
        .register(
            occurrence,
            requester,
            weight,
            serde_json::json!(slots),
            list,
            Utc::now(),
        )
        .await?;
    println!(
        "✓ {} registered for {} ({} list, weight {})",
        reg.requester, reg.occurrence, reg.requested_partition, reg.weight
    );
    Ok(())
}

use std::path::Path;

use chrono::NaiveDate;
use slotgrid_core::SlotgridConfig;

pub fn init(config_path: &Path, date: NaiveDate, dual_list: bool) -> anyhow::Result<()> {
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }
    let config = SlotgridConfig::scaffold(date, dual_list);
    std::fs::write(config_path, config.to_toml_string()?)?;
    println!("✓ Generated {}", config_path.display());
    Ok(())
}

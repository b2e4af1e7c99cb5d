use std::path::Path;

use anyhow::bail;
use nodepool_core::WorkerConfig;

pub fn init(owner: &str, region: &str, output: &Path) -> anyhow::Result<()> {
    if output.exists() {
        bail!("{} already exists", output.display());
    }
    let config = WorkerConfig::scaffold(owner, region);
    config.validate()?;
    std::fs::write(output, config.to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}

use std::path::Path;

use anyhow::{Context, anyhow};

use nodepool_core::{FloatingPoolRequest, WorkerConfig};
use nodepool_placement::select_floating_pool;

use super::Workspace;

/// Resolve one pool's image, falling back to the owner's persisted status.
pub fn resolve_image(data_dir: &Path, config_path: &Path, pool_name: &str) -> anyhow::Result<()> {
    let config = WorkerConfig::from_file(config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let pool = config
        .worker
        .pool(pool_name)
        .ok_or_else(|| anyhow!("no pool named {pool_name}"))?;

    let ws = Workspace::open(data_dir)?;
    let prior = ws.store.get_status(&config.worker.owner_id)?.unwrap_or_default();

    let image = nodepool_images::resolve_image(
        &pool.machine_image,
        &config.worker.region,
        &config.profile,
        &prior.machine_images,
    )?;
    println!("{}", serde_json::to_string_pretty(&image)?);
    Ok(())
}

pub fn floating_pool(
    config_path: &Path,
    name: Option<String>,
    domain: Option<String>,
) -> anyhow::Result<()> {
    let config = WorkerConfig::from_file(config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;

    let request = match (name, &config.worker.floating_pool) {
        (Some(name), _) => FloatingPoolRequest { name, domain },
        (None, Some(requested)) => FloatingPoolRequest {
            name: requested.name.clone(),
            domain: domain.or_else(|| requested.domain.clone()),
        },
        (None, None) => return Err(anyhow!("no floating pool requested; pass --name")),
    };

    let pool = select_floating_pool(&config.profile.floating_pools, &request, &config.worker.region)?;
    println!("{}", pool.name);
    Ok(())
}

use std::path::Path;

use anyhow::Context;
use tracing::info;

use nodepool_core::WorkerConfig;
use nodepool_worker::{WorkerDelegate, WorkerPlan};

use super::Workspace;

pub fn reconcile(data_dir: &Path, config_path: &Path, dry_run: bool, format: &str) -> anyhow::Result<()> {
    let config = WorkerConfig::from_file(config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let owner = config.worker.owner_id.clone();

    let ws = Workspace::open(data_dir)?;
    let prior = ws.store.get_status(&owner)?.unwrap_or_default();
    let delegate = WorkerDelegate::new(owner.as_str(), ws.backend.clone());

    let outcome = delegate.reconcile(&config, &prior);
    let calls = ws.backend.calls();
    info!(
        owner = %owner,
        create = calls.create,
        delete = calls.delete,
        get = calls.get,
        list = calls.list,
        dry_run,
        "backend calls"
    );

    if !dry_run {
        ws.store.put_status(&owner, &outcome.status)?;
        ws.save_backend()?;
    }

    let plan = outcome.plan?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&plan)?),
        _ => print!("{}", format_plan(&plan)),
    }
    Ok(())
}

pub fn delete(data_dir: &Path, owner: &str) -> anyhow::Result<()> {
    let ws = Workspace::open(data_dir)?;
    let prior = ws.store.require_status(owner)?;
    let delegate = WorkerDelegate::new(owner, ws.backend.clone());

    let outcome = delegate.delete(&prior);
    ws.save_backend()?;
    match outcome.plan {
        Ok(_) => {
            ws.store.delete_status(owner)?;
            println!("✓ Deleted {owner}");
            Ok(())
        }
        Err(e) => {
            ws.store.put_status(owner, &outcome.status)?;
            Err(e.into())
        }
    }
}

pub fn status(data_dir: &Path, owner: Option<&str>) -> anyhow::Result<()> {
    let ws = Workspace::open(data_dir)?;
    match owner {
        Some(owner) => {
            let status = ws.store.require_status(owner)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        None => {
            for owner in ws.store.list_owners()? {
                println!("{owner}");
            }
        }
    }
    Ok(())
}

fn format_plan(plan: &WorkerPlan) -> String {
    let mut out = String::new();
    for d in &plan.deployments {
        out.push_str(&format!(
            "{:<40} {:<12} min={:<3} max={:<3} surge={:<4} unavailable={:<4} image={}",
            d.class_name,
            d.zone,
            d.minimum,
            d.maximum,
            d.max_surge.to_string(),
            d.max_unavailable.to_string(),
            d.image.reference.as_str(),
        ));
        if let Some(group) = &d.affinity_group_id {
            out.push_str(&format!(" group={group}"));
        }
        out.push('\n');
    }
    if let Some(pool) = &plan.floating_pool {
        out.push_str(&format!("floating pool: {pool}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodepool_state::StatusStore;

    fn write_request(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("worker.toml");
        let config = WorkerConfig::scaffold("shoot--dev", "eu01");
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();
        path
    }

    #[test]
    fn reconcile_persists_status_and_backend() {
        let dir = tempfile::tempdir().unwrap();
        let request = write_request(dir.path());
        let data = dir.path().join("data");

        reconcile(&data, &request, false, "json").unwrap();
        assert!(data.join("backend.json").exists());

        let ws = Workspace::open(&data).unwrap();
        let status = ws.store.require_status("shoot--dev").unwrap();
        assert_eq!(status.affinity_groups.len(), 1);
        assert_eq!(ws.backend.groups().len(), 1);
        drop(ws);

        // A second pass reuses the recorded group.
        reconcile(&data, &request, false, "text").unwrap();
        let ws = Workspace::open(&data).unwrap();
        assert_eq!(ws.backend.groups().len(), 1);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let request = write_request(dir.path());
        let data = dir.path().join("data");

        reconcile(&data, &request, true, "text").unwrap();
        assert!(!data.join("backend.json").exists());
        let store = StatusStore::open(&data.join("status.redb")).unwrap();
        assert!(store.get_status("shoot--dev").unwrap().is_none());
    }

    #[test]
    fn delete_drops_groups_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let request = write_request(dir.path());
        let data = dir.path().join("data");

        reconcile(&data, &request, false, "json").unwrap();
        delete(&data, "shoot--dev").unwrap();

        let ws = Workspace::open(&data).unwrap();
        assert!(ws.backend.groups().is_empty());
        assert!(ws.store.get_status("shoot--dev").unwrap().is_none());
        drop(ws);

        assert!(delete(&data, "shoot--dev").is_err());
    }
}

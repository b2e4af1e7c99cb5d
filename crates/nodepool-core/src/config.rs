//! Worker request file parser.
//!
//! A request file carries the desired worker spec and the provider
//! section of the cloud profile:
//!
//! ```toml
//! [worker]
//! owner_id = "shoot--dev--alpha"
//! region = "eu01"
//!
//! [[worker.pools]]
//! name = "workers"
//! ...
//!
//! [[profile.machine_images]]
//! name = "flatcar"
//! ...
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::profile::{CloudProfileConfig, FlavorRegion, ImageCandidate, ImageFlavor, MachineImages};
use crate::types::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub worker: WorkerSpec,
    #[serde(default)]
    pub profile: CloudProfileConfig,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("owner id must not be empty")]
    EmptyOwner,
    #[error("duplicate pool name: {0}")]
    DuplicatePool(String),
    #[error("pool {0} has no zones")]
    NoZones(String),
    #[error("pool {pool}: maximum {maximum} is below minimum {minimum}")]
    InvalidBounds { pool: String, minimum: u32, maximum: u32 },
    #[error("pool {pool}: invalid percentage {value:?}")]
    InvalidPercent { pool: String, value: String },
}

impl WorkerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WorkerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the invariants the engine relies on: unique pool names,
    /// at least one zone per pool, sane bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker.owner_id.trim().is_empty() {
            return Err(ConfigError::EmptyOwner);
        }

        let mut seen = HashSet::new();
        for pool in &self.worker.pools {
            if !seen.insert(pool.name.as_str()) {
                return Err(ConfigError::DuplicatePool(pool.name.clone()));
            }
            if pool.zones.is_empty() {
                return Err(ConfigError::NoZones(pool.name.clone()));
            }
            if pool.maximum < pool.minimum {
                return Err(ConfigError::InvalidBounds {
                    pool: pool.name.clone(),
                    minimum: pool.minimum,
                    maximum: pool.maximum,
                });
            }
            for value in [&pool.max_surge, &pool.max_unavailable] {
                if let IntOrPercent::Percent(p) = value {
                    let valid = p
                        .strip_suffix('%')
                        .is_some_and(|n| n.parse::<u32>().is_ok_and(|n| n <= 100));
                    if !valid {
                        return Err(ConfigError::InvalidPercent {
                            pool: pool.name.clone(),
                            value: p.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Scaffold a request with one pool and a matching capability image.
    pub fn scaffold(owner_id: &str, region: &str) -> Self {
        let mut capabilities = Capabilities::new();
        capabilities.insert(
            ARCHITECTURE_CAPABILITY.to_string(),
            vec![DEFAULT_ARCHITECTURE.to_string()],
        );

        WorkerConfig {
            worker: WorkerSpec {
                owner_id: owner_id.to_string(),
                region: region.to_string(),
                terminating: false,
                floating_pool: None,
                pools: vec![WorkerPool {
                    name: "workers".to_string(),
                    machine_type: "c1.2".to_string(),
                    machine_image: ImageRequest {
                        name: "flatcar".to_string(),
                        version: "1.0.0".to_string(),
                        architecture: None,
                        capabilities: None,
                    },
                    zones: vec![format!("{region}-1")],
                    minimum: 1,
                    maximum: 3,
                    max_surge: IntOrPercent::one(),
                    max_unavailable: IntOrPercent::zero(),
                    affinity_policy: Some("soft-anti-affinity".to_string()),
                    labels: Vec::new(),
                    annotations: BTreeMap::new(),
                    taints: Vec::new(),
                    volume: None,
                    user_data_secret: None,
                }],
            },
            profile: CloudProfileConfig {
                machine_images: vec![MachineImages {
                    name: "flatcar".to_string(),
                    versions: vec![ImageCandidate::Capability(
                        crate::profile::CapabilityImageVersion {
                            version: "1.0.0".to_string(),
                            flavors: vec![ImageFlavor {
                                capabilities,
                                regions: vec![FlavorRegion {
                                    name: region.to_string(),
                                    id: "00000000-0000-0000-0000-000000000000".to_string(),
                                }],
                            }],
                        },
                    )],
                }],
                capabilities: Vec::new(),
                floating_pools: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaffold_round_trips_through_toml() {
        let config = WorkerConfig::scaffold("shoot--dev--alpha", "eu01");
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("shoot--dev--alpha"));
        assert!(toml_str.contains("format = \"capability\""));

        let parsed: WorkerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.worker, config.worker);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal() {
        let toml_str = r#"
[worker]
owner_id = "shoot--dev--alpha"
region = "eu01"
"#;
        let config: WorkerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.worker.region, "eu01");
        assert!(config.worker.pools.is_empty());
        assert!(!config.worker.terminating);
        assert!(config.profile.machine_images.is_empty());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker.toml");
        let config = WorkerConfig::scaffold("owner", "eu02");
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = WorkerConfig::from_file(&path).unwrap();
        assert_eq!(loaded.worker.owner_id, "owner");
        assert!(WorkerConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_validate_rejects_duplicates_and_bad_bounds() {
        let mut config = WorkerConfig::scaffold("owner", "eu01");
        let pool = config.worker.pools[0].clone();
        config.worker.pools.push(pool);
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicatePool("workers".to_string()))
        );

        let mut config = WorkerConfig::scaffold("owner", "eu01");
        config.worker.pools[0].minimum = 5;
        config.worker.pools[0].maximum = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBounds { .. })
        ));

        let mut config = WorkerConfig::scaffold("owner", "eu01");
        config.worker.pools[0].zones.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoZones("workers".to_string())));

        let mut config = WorkerConfig::scaffold("owner", "eu01");
        config.worker.pools[0].max_surge = IntOrPercent::Percent("120%".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPercent { .. })
        ));

        let mut config = WorkerConfig::scaffold(" ", "eu01");
        config.worker.owner_id = " ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyOwner));
    }
}

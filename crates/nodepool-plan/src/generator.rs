//! Deployment plan generator.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use nodepool_core::{IntOrPercent, Taint, WorkerPool, WorkerSpec};
use nodepool_placement::distribute_pool;
use nodepool_state::{DependencySet, MachineImage, PoolName};

use crate::error::{PlanError, PlanResult};
use crate::hash::{CanonicalPoolHash, PoolHasher, class_hash};
use crate::machine_class::machine_class_params;

/// Desired deployment for one (pool, zone).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentDescriptor {
    /// `{owner}-{pool}-z{zone_index + 1}`.
    pub name: String,
    /// `{name}-{class hash}`.
    pub class_name: String,
    pub pool_name: String,
    pub zone: String,
    pub zone_index: usize,
    pub minimum: u32,
    pub maximum: u32,
    pub max_surge: IntOrPercent,
    pub max_unavailable: IntOrPercent,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub taints: Vec<Taint>,
    pub image: MachineImage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity_group_id: Option<String>,
    pub machine_class: serde_json::Value,
}

/// [`generate_plan_with`] using [`CanonicalPoolHash`].
pub fn generate_plan(
    request: &WorkerSpec,
    images: &BTreeMap<PoolName, MachineImage>,
    dependencies: &DependencySet,
) -> PlanResult<Vec<DeploymentDescriptor>> {
    generate_plan_with(&CanonicalPoolHash, request, images, dependencies)
}

/// One descriptor per (pool, zone), pools in request order and zones in
/// list order.
///
/// `images` maps pool names to resolved images. A pool that requests an
/// affinity policy must have a record in `dependencies`.
pub fn generate_plan_with(
    hasher: &dyn PoolHasher,
    request: &WorkerSpec,
    images: &BTreeMap<PoolName, MachineImage>,
    dependencies: &DependencySet,
) -> PlanResult<Vec<DeploymentDescriptor>> {
    let mut plan = Vec::new();

    for pool in &request.pools {
        let image = images.get(&pool.name).ok_or_else(|| PlanError::MissingImage {
            pool: pool.name.clone(),
        })?;
        let group_id = affinity_group_id(pool, dependencies)?;

        let hash = class_hash(hasher, pool, image, group_id);
        for share in distribute_pool(pool) {
            let name = format!("{}-{}-z{}", request.owner_id, pool.name, share.zone_index + 1);
            let machine_class = machine_class_params(
                &request.owner_id,
                &request.region,
                &share.zone,
                pool,
                image,
                group_id,
            );
            plan.push(DeploymentDescriptor {
                class_name: format!("{name}-{hash}"),
                name,
                pool_name: pool.name.clone(),
                zone: share.zone,
                zone_index: share.zone_index,
                minimum: share.minimum,
                maximum: share.maximum,
                max_surge: share.max_surge,
                max_unavailable: share.max_unavailable,
                labels: pool.label_map(),
                annotations: pool.annotations.clone(),
                taints: pool.taints.clone(),
                image: image.clone(),
                affinity_group_id: group_id.map(String::from),
                machine_class,
            });
        }
        debug!(pool = %pool.name, zones = pool.zones.len(), class_hash = %hash, "pool planned");
    }

    Ok(plan)
}

/// The affinity group a pool's machines join. Pools without a policy join
/// none, whatever the dependency set says.
fn affinity_group_id<'a>(
    pool: &WorkerPool,
    dependencies: &'a DependencySet,
) -> PlanResult<Option<&'a str>> {
    let Some(policy) = pool.requested_policy() else {
        return Ok(None);
    };
    dependencies
        .get(&pool.name)
        .map(|d| Some(d.group_id.as_str()))
        .ok_or_else(|| PlanError::MissingAffinityGroup {
            pool: pool.name.clone(),
            policy: policy.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodepool_core::{ImageRequest, NodeLabel};
    use nodepool_state::{AffinityGroupDependency, ImageRef};

    fn pool(name: &str, zones: &[&str], minimum: u32, maximum: u32) -> WorkerPool {
        WorkerPool {
            name: name.to_string(),
            machine_type: "c1.2".to_string(),
            machine_image: ImageRequest {
                name: "flatcar".to_string(),
                version: "2.0".to_string(),
                architecture: None,
                capabilities: None,
            },
            zones: zones.iter().map(|z| z.to_string()).collect(),
            minimum,
            maximum,
            max_surge: IntOrPercent::Int(1),
            max_unavailable: IntOrPercent::Percent("25%".to_string()),
            affinity_policy: None,
            labels: vec![NodeLabel {
                key: "team".to_string(),
                value: "infra".to_string(),
                rolling: false,
            }],
            annotations: Default::default(),
            taints: Vec::new(),
            volume: None,
            user_data_secret: None,
        }
    }

    fn spec(pools: Vec<WorkerPool>) -> WorkerSpec {
        WorkerSpec {
            owner_id: "shoot--dev".to_string(),
            region: "eu01".to_string(),
            terminating: false,
            floating_pool: None,
            pools,
        }
    }

    fn images(pools: &[&str], id: &str) -> BTreeMap<PoolName, MachineImage> {
        pools
            .iter()
            .map(|p| {
                (
                    p.to_string(),
                    MachineImage {
                        name: "flatcar".to_string(),
                        version: "2.0".to_string(),
                        reference: ImageRef::Id(id.to_string()),
                        architecture: Some("amd64".to_string()),
                        capabilities: None,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn one_descriptor_per_zone() {
        let request = spec(vec![pool("workers", &["eu01-1", "eu01-2"], 5, 10)]);
        let plan = generate_plan(&request, &images(&["workers"], "img-1"), &DependencySet::new()).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].name, "shoot--dev-workers-z1");
        assert_eq!(plan[1].name, "shoot--dev-workers-z2");
        assert_eq!((plan[0].minimum, plan[0].maximum), (3, 5));
        assert_eq!((plan[1].minimum, plan[1].maximum), (2, 5));
        assert_eq!(plan[1].max_unavailable, IntOrPercent::Percent("25%".to_string()));
        assert_eq!(plan[0].labels["team"], "infra");
        assert!(plan[0].affinity_group_id.is_none());

        let hash = plan[0].class_name.rsplit('-').next().unwrap();
        assert_eq!(hash.len(), 5);
        assert_eq!(plan[0].class_name, format!("shoot--dev-workers-z1-{hash}"));
        assert_eq!(plan[1].class_name, format!("shoot--dev-workers-z2-{hash}"));
    }

    #[test]
    fn even_split() {
        let request = spec(vec![pool("workers", &["a", "b"], 30, 30)]);
        let plan = generate_plan(&request, &images(&["workers"], "img-1"), &DependencySet::new()).unwrap();
        let mins: Vec<u32> = plan.iter().map(|d| d.minimum).collect();
        assert_eq!(mins, vec![15, 15]);
    }

    #[test]
    fn affinity_group_flows_into_descriptor() {
        let mut p = pool("workers", &["eu01-1"], 1, 1);
        p.affinity_policy = Some("soft-anti-affinity".to_string());
        let request = spec(vec![p]);
        let deps = DependencySet::from_records([AffinityGroupDependency {
            pool_name: "workers".to_string(),
            group_id: "sg-1".to_string(),
            group_name: "shoot--dev-workers-abcde".to_string(),
        }]);

        let plan = generate_plan(&request, &images(&["workers"], "img-1"), &deps).unwrap();
        assert_eq!(plan[0].affinity_group_id.as_deref(), Some("sg-1"));
        assert_eq!(plan[0].machine_class["serverGroupId"], "sg-1");
    }

    #[test]
    fn missing_affinity_group_is_an_error() {
        let mut p = pool("workers", &["eu01-1"], 1, 1);
        p.affinity_policy = Some("affinity".to_string());
        let request = spec(vec![p]);

        let err = generate_plan(&request, &images(&["workers"], "img-1"), &DependencySet::new()).unwrap_err();
        assert_eq!(
            err,
            PlanError::MissingAffinityGroup {
                pool: "workers".to_string(),
                policy: "affinity".to_string()
            }
        );
    }

    #[test]
    fn missing_image_is_an_error() {
        let request = spec(vec![pool("workers", &["eu01-1"], 1, 1)]);
        let err = generate_plan(&request, &BTreeMap::new(), &DependencySet::new()).unwrap_err();
        assert!(matches!(err, PlanError::MissingImage { pool } if pool == "workers"));
    }

    #[test]
    fn stale_record_ignored_without_policy() {
        let request = spec(vec![pool("workers", &["eu01-1"], 1, 1)]);
        let deps = DependencySet::from_records([AffinityGroupDependency {
            pool_name: "workers".to_string(),
            group_id: "sg-1".to_string(),
            group_name: "n".to_string(),
        }]);
        let plan = generate_plan(&request, &images(&["workers"], "img-1"), &deps).unwrap();
        assert!(plan[0].affinity_group_id.is_none());
    }

    #[test]
    fn class_name_follows_image_not_labels() {
        let request = spec(vec![pool("workers", &["eu01-1"], 1, 1)]);
        let base = generate_plan(&request, &images(&["workers"], "img-1"), &DependencySet::new()).unwrap();

        let mut relabeled = request.clone();
        relabeled.pools[0].labels[0].value = "platform".to_string();
        let same = generate_plan(&relabeled, &images(&["workers"], "img-1"), &DependencySet::new()).unwrap();
        assert_eq!(same[0].class_name, base[0].class_name);
        assert_eq!(same[0].labels["team"], "platform");

        let bumped = generate_plan(&request, &images(&["workers"], "img-2"), &DependencySet::new()).unwrap();
        assert_ne!(bumped[0].class_name, base[0].class_name);
        assert_eq!(bumped[0].name, base[0].name);
    }

    #[test]
    fn custom_pool_hasher() {
        struct Fixed;
        impl PoolHasher for Fixed {
            fn pool_hash(&self, _pool: &WorkerPool) -> String {
                "fixed".to_string()
            }
        }

        let request = spec(vec![pool("workers", &["eu01-1"], 1, 1)]);
        let imgs = images(&["workers"], "img-1");
        let mut other = request.clone();
        other.pools[0].machine_type = "c1.8".to_string();

        let a = generate_plan_with(&Fixed, &request, &imgs, &DependencySet::new()).unwrap();
        let b = generate_plan_with(&Fixed, &other, &imgs, &DependencySet::new()).unwrap();
        assert_eq!(a[0].class_name, b[0].class_name);

        let c = generate_plan(&other, &imgs, &DependencySet::new()).unwrap();
        assert_ne!(a[0].class_name, c[0].class_name);
    }
}

//! Worker delegate: one reconciliation pass per call.
//!
//! Order within a pass:
//!
//! 1. Validate the request.
//! 2. Rebuild the dependency set from the prior status and reconcile
//!    affinity groups pool by pool.
//! 3. Resolve every pool's machine image.
//! 4. Select the floating pool, when one is requested.
//! 5. Generate the deployment plan.
//!
//! Each step records its results in the outgoing status before the next
//! one runs, so a failure part-way still hands back everything done.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use nodepool_affinity::{AffinityReconciler, GroupBackend};
use nodepool_core::{WorkerConfig, WorkerSpec};
use nodepool_images::resolve_image;
use nodepool_placement::select_floating_pool;
use nodepool_plan::{CanonicalPoolHash, DeploymentDescriptor, PoolHasher, generate_plan_with};
use nodepool_state::{DependencySet, MachineImage, PoolName, WorkerStatus};

use crate::error::{WorkerError, WorkerResult};

/// What a successful pass produces for the orchestrator to apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkerPlan {
    pub deployments: Vec<DeploymentDescriptor>,
    /// Name pattern of the selected floating pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floating_pool: Option<String>,
}

/// Result of one pass. `status` is always populated and should be
/// persisted whatever `plan` says.
#[derive(Debug)]
pub struct PassOutcome {
    pub status: WorkerStatus,
    pub plan: WorkerResult<WorkerPlan>,
}

impl PassOutcome {
    fn failed(status: WorkerStatus, error: impl Into<WorkerError>) -> Self {
        let error = error.into();
        warn!(error = %error, "reconciliation pass failed");
        Self {
            status,
            plan: Err(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.plan.is_ok()
    }
}

/// Runs passes for a single owner.
pub struct WorkerDelegate {
    affinity: AffinityReconciler,
    hasher: Box<dyn PoolHasher + Send + Sync>,
}

impl WorkerDelegate {
    pub fn new(owner_id: impl Into<String>, backend: Arc<dyn GroupBackend>) -> Self {
        Self {
            affinity: AffinityReconciler::new(owner_id, backend),
            hasher: Box::new(CanonicalPoolHash),
        }
    }

    /// Replace the structural pool hash used in class names.
    pub fn with_pool_hasher(mut self, hasher: impl PoolHasher + Send + Sync + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    pub fn owner_id(&self) -> &str {
        self.affinity.owner_id()
    }

    /// Run one pass of `config` against the last persisted status.
    pub fn reconcile(&self, config: &WorkerConfig, prior: &WorkerStatus) -> PassOutcome {
        let spec = &config.worker;
        let mut status = prior.clone();

        if spec.owner_id != self.owner_id() {
            return PassOutcome::failed(
                status,
                WorkerError::Invariant(format!(
                    "request for owner {} handed to delegate for {}",
                    spec.owner_id,
                    self.owner_id()
                )),
            );
        }
        if let Err(e) = config.validate() {
            return PassOutcome::failed(status, e);
        }

        let mut deps = DependencySet::from_status(prior);
        let affinity = self.affinity.reconcile(&spec.pools, spec.terminating, &mut deps);
        status.affinity_groups = deps.to_sorted_vec();
        if let Err(e) = affinity {
            return PassOutcome::failed(status, e);
        }

        if spec.terminating {
            info!(owner = %spec.owner_id, "owner terminating, nothing to plan");
            return PassOutcome {
                status,
                plan: Ok(WorkerPlan::default()),
            };
        }

        let images = match self.resolve_images(config, prior, &mut status) {
            Ok(images) => images,
            Err(e) => return PassOutcome::failed(status, e),
        };

        let floating_pool = match &spec.floating_pool {
            Some(request) => {
                match select_floating_pool(&config.profile.floating_pools, request, &spec.region) {
                    Ok(pool) => Some(pool.name.clone()),
                    Err(e) => return PassOutcome::failed(status, e),
                }
            }
            None => None,
        };

        let deployments = match generate_plan_with(&*self.hasher, spec, &images, &deps) {
            Ok(deployments) => deployments,
            Err(e) => return PassOutcome::failed(status, e),
        };

        info!(
            owner = %spec.owner_id,
            pools = spec.pools.len(),
            deployments = deployments.len(),
            affinity_groups = status.affinity_groups.len(),
            "reconciliation pass complete"
        );
        PassOutcome {
            status,
            plan: Ok(WorkerPlan {
                deployments,
                floating_pool,
            }),
        }
    }

    /// Tear down everything the owner holds on the backend.
    pub fn delete(&self, prior: &WorkerStatus) -> PassOutcome {
        let mut status = prior.clone();
        let mut deps = DependencySet::from_status(prior);

        let cleanup = self.affinity.cleanup(&mut deps);
        status.affinity_groups = deps.to_sorted_vec();
        if let Err(e) = cleanup {
            return PassOutcome::failed(status, e);
        }

        status.machine_images.clear();
        info!(owner = %self.owner_id(), "worker deleted");
        PassOutcome {
            status,
            plan: Ok(WorkerPlan::default()),
        }
    }

    /// Resolve each pool's image, recording every success in `status`.
    /// Unused records are pruned only once every pool has resolved.
    fn resolve_images(
        &self,
        config: &WorkerConfig,
        prior: &WorkerStatus,
        status: &mut WorkerStatus,
    ) -> WorkerResult<BTreeMap<PoolName, MachineImage>> {
        let WorkerSpec { region, pools, .. } = &config.worker;
        let mut images = BTreeMap::new();

        for pool in pools {
            let image = resolve_image(
                &pool.machine_image,
                region,
                &config.profile,
                &prior.machine_images,
            )?;
            status.upsert_machine_image(image.clone());
            images.insert(pool.name.clone(), image);
        }

        let in_use: Vec<MachineImage> = images.values().cloned().collect();
        status.retain_machine_images(&in_use);
        Ok(images)
    }
}

//! Affinity group reconciler.
//!
//! Per pool, against the record held in the caller's dependency set:
//!
//! | record | backend                          | action                 |
//! |--------|----------------------------------|------------------------|
//! | none   | -                                | create, record         |
//! | some   | not found                        | create, record         |
//! | some   | name and policy as expected      | nothing                |
//! | some   | name or policy drifted           | create, replace record |
//! | some   | pool absent or policy withdrawn  | delete, drop record    |
//!
//! A drifted group is left in place when its replacement is created; the
//! sweep that ends every pass deletes untracked groups named
//! `{owner}-{pool}-{hash}` for a pool of this owner. The pool set is the
//! request's pools plus the pools recorded before the pass, so a group of
//! another owner whose id merely extends this one is never touched.
//!
//! The dependency set is mutated as each step succeeds. When a backend
//! call fails the pass stops there and the set still holds everything
//! completed before the failure, ready to be persisted.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use nodepool_core::WorkerPool;
use nodepool_state::{AffinityGroupDependency, DependencySet};

use crate::backend::{BackendError, Group, GroupBackend};
use crate::error::AffinityResult;
use crate::naming::{group_name, owned_pool};

pub struct AffinityReconciler {
    owner_id: String,
    backend: Arc<dyn GroupBackend>,
}

impl AffinityReconciler {
    pub fn new(owner_id: impl Into<String>, backend: Arc<dyn GroupBackend>) -> Self {
        Self {
            owner_id: owner_id.into(),
            backend,
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Bring the backend in line with `pools`.
    ///
    /// When `terminating` is set every tracked group is deleted instead,
    /// as by [`cleanup`](Self::cleanup).
    pub fn reconcile(
        &self,
        pools: &[WorkerPool],
        terminating: bool,
        deps: &mut DependencySet,
    ) -> AffinityResult<()> {
        let mut known = known_pools(deps);
        known.extend(pools.iter().map(|p| p.name.clone()));

        if terminating {
            return self.cleanup_pools(&known, deps);
        }

        for pool in pools {
            match pool.requested_policy() {
                Some(policy) => self.ensure_group(pool, policy, deps)?,
                None => self.release(&pool.name, deps)?,
            }
        }

        let absent: Vec<String> = deps
            .pool_names()
            .into_iter()
            .filter(|name| !pools.iter().any(|p| &p.name == name))
            .collect();
        for pool_name in absent {
            self.release(&pool_name, deps)?;
        }

        self.sweep(&known, deps)
    }

    /// Delete every tracked group, clear the set, then sweep.
    pub fn cleanup(&self, deps: &mut DependencySet) -> AffinityResult<()> {
        let known = known_pools(deps);
        self.cleanup_pools(&known, deps)
    }

    /// Delete untracked groups this owner generated for one of `pools`.
    pub fn sweep(&self, pools: &BTreeSet<String>, deps: &DependencySet) -> AffinityResult<()> {
        let orphans: Vec<Group> = self
            .backend
            .list_groups()?
            .into_iter()
            .filter(|g| {
                owned_pool(&self.owner_id, &g.name).is_some_and(|pool| pools.contains(pool))
                    && !deps.contains_group_id(&g.id)
            })
            .collect();

        for group in orphans {
            self.delete(&group.id)?;
            info!(group = %group.id, name = %group.name, "orphaned affinity group deleted");
        }
        Ok(())
    }

    fn cleanup_pools(
        &self,
        known: &BTreeSet<String>,
        deps: &mut DependencySet,
    ) -> AffinityResult<()> {
        for pool_name in deps.pool_names() {
            self.release(&pool_name, deps)?;
        }
        self.sweep(known, deps)?;
        info!(owner = %self.owner_id, "affinity groups cleaned up");
        Ok(())
    }

    fn ensure_group(
        &self,
        pool: &WorkerPool,
        policy: &str,
        deps: &mut DependencySet,
    ) -> AffinityResult<()> {
        let expected = group_name(&self.owner_id, &pool.name, policy);

        let Some(dep) = deps.get(&pool.name) else {
            return self.create(pool, &expected, policy, deps);
        };

        match self.backend.get_group(&dep.group_id) {
            Ok(group) if group.name == expected && group.policy == policy => {
                debug!(pool = %pool.name, group = %group.id, "affinity group up to date");
                if dep.group_name != group.name {
                    deps.upsert(AffinityGroupDependency {
                        pool_name: pool.name.clone(),
                        group_id: group.id,
                        group_name: group.name,
                    });
                }
                Ok(())
            }
            Ok(group) => {
                info!(
                    pool = %pool.name,
                    group = %group.id,
                    policy = %group.policy,
                    wanted = policy,
                    "affinity group drifted, replacing"
                );
                self.create(pool, &expected, policy, deps)
            }
            Err(BackendError::NotFound(id)) => {
                warn!(pool = %pool.name, group = %id, "recorded affinity group is gone, recreating");
                self.create(pool, &expected, policy, deps)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn create(
        &self,
        pool: &WorkerPool,
        name: &str,
        policy: &str,
        deps: &mut DependencySet,
    ) -> AffinityResult<()> {
        let group = self.backend.create_group(name, policy)?;
        info!(pool = %pool.name, group = %group.id, name, policy, "affinity group created");
        deps.upsert(AffinityGroupDependency {
            pool_name: pool.name.clone(),
            group_id: group.id,
            group_name: group.name,
        });
        Ok(())
    }

    /// Delete the group recorded for `pool_name`, if any, and drop the record.
    fn release(&self, pool_name: &str, deps: &mut DependencySet) -> AffinityResult<()> {
        let Some(dep) = deps.get(pool_name) else {
            return Ok(());
        };
        let group_id = dep.group_id.clone();
        self.delete(&group_id)?;
        deps.remove(pool_name);
        info!(pool = pool_name, group = %group_id, "affinity group released");
        Ok(())
    }

    /// Delete a group; an already-missing group counts as deleted.
    fn delete(&self, group_id: &str) -> AffinityResult<()> {
        match self.backend.delete_group(group_id) {
            Ok(()) => Ok(()),
            Err(BackendError::NotFound(_)) => {
                debug!(group = group_id, "affinity group already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Pools recorded in `deps`, captured before the pass mutates it.
fn known_pools(deps: &DependencySet) -> BTreeSet<String> {
    deps.pool_names().into_iter().collect()
}

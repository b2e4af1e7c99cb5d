//! DependencySet: in-memory set of affinity group records.
//!
//! Keyed by pool name in a `BTreeMap` so that extraction for persistence
//! is sorted without an extra pass. Lookups by group id rebuild a small
//! index from the primary map instead of maintaining a second map in
//! lockstep; pool counts are small.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::types::{AffinityGroupDependency, WorkerStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    by_pool: BTreeMap<String, AffinityGroupDependency>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the set from persisted records. Later duplicates win.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = AffinityGroupDependency>,
    {
        let mut set = Self::new();
        for record in records {
            if let Some(prev) = set.upsert(record) {
                debug!(pool = %prev.pool_name, group = %prev.group_id, "duplicate dependency record replaced");
            }
        }
        set
    }

    /// Rebuild the set from the affinity groups in `status`.
    pub fn from_status(status: &WorkerStatus) -> Self {
        Self::from_records(status.affinity_groups.iter().cloned())
    }

    /// Insert or replace the record for its pool. Returns the replaced
    /// record, if any.
    pub fn upsert(&mut self, dep: AffinityGroupDependency) -> Option<AffinityGroupDependency> {
        self.by_pool.insert(dep.pool_name.clone(), dep)
    }

    pub fn get(&self, pool_name: &str) -> Option<&AffinityGroupDependency> {
        self.by_pool.get(pool_name)
    }

    /// Remove the record for `pool_name`.
    pub fn remove(&mut self, pool_name: &str) -> Option<AffinityGroupDependency> {
        self.by_pool.remove(pool_name)
    }

    /// Group id → pool name, rebuilt from the primary map.
    pub fn id_index(&self) -> HashMap<&str, &str> {
        self.by_pool
            .values()
            .map(|d| (d.group_id.as_str(), d.pool_name.as_str()))
            .collect()
    }

    pub fn find_by_group_id(&self, group_id: &str) -> Option<&AffinityGroupDependency> {
        let pool = *self.id_index().get(group_id)?;
        self.by_pool.get(pool)
    }

    pub fn contains_group_id(&self, group_id: &str) -> bool {
        self.by_pool.values().any(|d| d.group_id == group_id)
    }

    /// Pool names in sorted order.
    pub fn pool_names(&self) -> Vec<String> {
        self.by_pool.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AffinityGroupDependency> {
        self.by_pool.values()
    }

    pub fn len(&self) -> usize {
        self.by_pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pool.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_pool.clear();
    }

    /// Records sorted by pool name, ready for persistence.
    pub fn to_sorted_vec(&self) -> Vec<AffinityGroupDependency> {
        self.by_pool.values().cloned().collect()
    }
}

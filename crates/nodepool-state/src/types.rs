//! Persisted worker status types.
//!
//! The status is the only state that survives between reconciliation
//! passes. It is rebuilt into working structures at the start of a pass
//! and written back, sorted, at the end.

use serde::{Deserialize, Serialize};

use nodepool_core::{Capabilities, DEFAULT_ARCHITECTURE};

/// Name of a worker pool; the key of every per-pool record.
pub type PoolName = String;

/// Backend identifier of an affinity group.
pub type GroupId = String;

// ── Affinity groups ───────────────────────────────────────────────

/// Tracks the affinity group created for one pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AffinityGroupDependency {
    pub pool_name: PoolName,
    pub group_id: GroupId,
    pub group_name: String,
}

// ── Machine images ────────────────────────────────────────────────

/// Concrete reference to a provisionable image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImageRef {
    /// Region-scoped image id.
    Id(String),
    /// Global image name, valid in every region.
    Image(String),
}

impl ImageRef {
    /// The id or name, whichever this is.
    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Id(id) => id,
            ImageRef::Image(name) => name,
        }
    }
}

/// A resolved machine image, as recorded in the worker status.
///
/// Records written before architectures existed carry neither
/// `architecture` nor `capabilities`; they are treated as the default
/// architecture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MachineImage {
    pub name: String,
    pub version: String,
    #[serde(flatten)]
    pub reference: ImageRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
}

impl MachineImage {
    /// The recorded architecture with the platform default applied.
    pub fn architecture_or_default(&self) -> &str {
        self.architecture.as_deref().unwrap_or(DEFAULT_ARCHITECTURE)
    }

    /// Whether two records describe the same image slot (same name,
    /// version, and architecture or capability set).
    pub fn same_slot(&self, other: &MachineImage) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.architecture_or_default() == other.architecture_or_default()
            && self.capabilities == other.capabilities
    }
}

// ── Worker status ─────────────────────────────────────────────────

/// Provider status persisted on the worker resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerStatus {
    #[serde(default)]
    pub machine_images: Vec<MachineImage>,
    /// Sorted by pool name.
    #[serde(default)]
    pub affinity_groups: Vec<AffinityGroupDependency>,
}

impl WorkerStatus {
    /// Insert `image`, replacing any record for the same slot.
    pub fn upsert_machine_image(&mut self, image: MachineImage) {
        match self.machine_images.iter_mut().find(|m| m.same_slot(&image)) {
            Some(existing) => *existing = image,
            None => self.machine_images.push(image),
        }
    }

    /// Drop image records not in `in_use` and sort the rest.
    pub fn retain_machine_images(&mut self, in_use: &[MachineImage]) {
        self.machine_images
            .retain(|m| in_use.iter().any(|u| u.same_slot(m)));
        self.machine_images.sort_by(|a, b| {
            (&a.name, &a.version, a.architecture_or_default())
                .cmp(&(&b.name, &b.version, b.architecture_or_default()))
        });
    }
}

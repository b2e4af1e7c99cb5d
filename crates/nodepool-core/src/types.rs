//! Desired-state types shared across nodepool crates.
//!
//! These are supplied fresh by the orchestrator on every reconciliation
//! pass and are never mutated by the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Architecture assumed when a pool or image record predates the
/// architecture field.
pub const DEFAULT_ARCHITECTURE: &str = "amd64";

/// Capability dimension that carries the CPU architecture.
pub const ARCHITECTURE_CAPABILITY: &str = "architecture";

/// Capability dimension name → ordered list of accepted values.
pub type Capabilities = BTreeMap<String, Vec<String>>;

// ── Worker ────────────────────────────────────────────────────────

/// The desired worker specification for one owner (cluster).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerSpec {
    /// Stable owner identifier. Scopes every generated name.
    pub owner_id: String,
    pub region: String,
    /// Set when the owning resource carries a deletion marker.
    #[serde(default)]
    pub terminating: bool,
    #[serde(default)]
    pub floating_pool: Option<FloatingPoolRequest>,
    #[serde(default)]
    pub pools: Vec<WorkerPool>,
}

impl WorkerSpec {
    /// Look up a pool by name.
    pub fn pool(&self, name: &str) -> Option<&WorkerPool> {
        self.pools.iter().find(|p| p.name == name)
    }
}

/// Floating IP pool requested for the owner's network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloatingPoolRequest {
    /// Name or glob pattern of the pool.
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
}

// ── Pool ──────────────────────────────────────────────────────────

/// A named group of homogeneous nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerPool {
    pub name: String,
    pub machine_type: String,
    pub machine_image: ImageRequest,
    /// Availability zones, in the order used for zone indices.
    pub zones: Vec<String>,
    pub minimum: u32,
    pub maximum: u32,
    #[serde(default = "IntOrPercent::one")]
    pub max_surge: IntOrPercent,
    #[serde(default = "IntOrPercent::zero")]
    pub max_unavailable: IntOrPercent,
    /// Opaque backend placement policy (e.g. "soft-anti-affinity").
    #[serde(default)]
    pub affinity_policy: Option<String>,
    #[serde(default)]
    pub labels: Vec<NodeLabel>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub taints: Vec<Taint>,
    #[serde(default)]
    pub volume: Option<Volume>,
    /// Name of the secret carrying the machine user data.
    #[serde(default)]
    pub user_data_secret: Option<String>,
}

impl WorkerPool {
    /// The affinity policy, if the pool requests one. Blank policies count
    /// as no request.
    pub fn requested_policy(&self) -> Option<&str> {
        self.affinity_policy
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Labels flagged as rolling, sorted by key.
    pub fn rolling_labels(&self) -> Vec<&NodeLabel> {
        let mut labels: Vec<&NodeLabel> = self.labels.iter().filter(|l| l.rolling).collect();
        labels.sort_by(|a, b| a.key.cmp(&b.key));
        labels
    }

    /// All labels as a key/value map (later duplicates win).
    pub fn label_map(&self) -> BTreeMap<String, String> {
        self.labels
            .iter()
            .map(|l| (l.key.clone(), l.value.clone()))
            .collect()
    }
}

/// Requested machine image coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRequest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub capabilities: Option<Capabilities>,
}

impl ImageRequest {
    /// The requested architecture with the platform default applied.
    ///
    /// Falls back to the first value of the `architecture` capability when
    /// only a capability set was given.
    pub fn architecture_or_default(&self) -> &str {
        if let Some(arch) = self.architecture.as_deref() {
            return arch;
        }
        self.capabilities
            .as_ref()
            .and_then(|c| c.get(ARCHITECTURE_CAPABILITY))
            .and_then(|values| values.first())
            .map(String::as_str)
            .unwrap_or(DEFAULT_ARCHITECTURE)
    }
}

/// A node label. Rolling labels force a new machine generation when they
/// change; the rest are applied in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeLabel {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub rolling: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    pub effect: String,
}

/// Root disk settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Volume {
    /// Size in GiB.
    pub size: u32,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

// ── Counts ────────────────────────────────────────────────────────

/// Either an absolute count or a percentage string such as `"25%"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum IntOrPercent {
    Int(u32),
    Percent(String),
}

impl IntOrPercent {
    pub fn one() -> Self {
        IntOrPercent::Int(1)
    }

    pub fn zero() -> Self {
        IntOrPercent::Int(0)
    }

    pub fn is_percent(&self) -> bool {
        matches!(self, IntOrPercent::Percent(_))
    }
}

impl fmt::Display for IntOrPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntOrPercent::Int(n) => write!(f, "{n}"),
            IntOrPercent::Percent(p) => f.write_str(p),
        }
    }
}

//! nodepool-plan: deployment plan generation.
//!
//! Turns the desired pools, their resolved images and the affinity group
//! records into one [`DeploymentDescriptor`] per (pool, zone).
//!
//! # Components
//!
//! - **`hash`**: canonical pool hash and the class-name content hash
//! - **`machine_class`**: provider parameter map for a descriptor
//! - **`generator`**: `generate_plan`

pub mod error;
pub mod generator;
pub mod hash;
pub mod machine_class;

pub use error::{PlanError, PlanResult};
pub use generator::{DeploymentDescriptor, generate_plan, generate_plan_with};
pub use hash::{CanonicalPoolHash, PoolHasher, class_hash};
pub use machine_class::machine_class_params;

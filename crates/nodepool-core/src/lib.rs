pub mod config;
pub mod hash;
pub mod profile;
pub mod types;

pub use config::{ConfigError, WorkerConfig};
pub use profile::*;
pub use types::*;

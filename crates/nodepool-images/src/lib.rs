//! nodepool-images: machine image resolution.
//!
//! Turns a pool's abstract image request (name, version, architecture or
//! capability set) into a concrete image reference for one region.
//!
//! # Components
//!
//! - **`capabilities`**: default application and compatibility checks
//! - **`resolver`**: profile lookup (both schema generations) with the
//!   persisted status as fallback

pub mod capabilities;
pub mod error;
pub mod resolver;

pub use capabilities::{is_compatible, request_capabilities, with_defaults};
pub use error::{ImageError, ImageResult};
pub use resolver::{find_in_profile, find_in_status, resolve_image};

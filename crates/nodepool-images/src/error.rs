//! Image resolution errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("machine image {name}/{version} not found in region {region} for {requested}")]
    NotFound {
        name: String,
        version: String,
        region: String,
        /// Requested architecture or capability set, rendered for humans.
        requested: String,
    },
}

pub type ImageResult<T> = Result<T, ImageError>;

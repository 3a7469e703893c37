//! Spatial-subsystem error type.

use thiserror::Error;

/// Errors produced by `dt-spatial`. Programming errors (an oversized query
/// radius, a negative interaction radius) are `panic!`s, not variants here —
/// only configuration errors that a caller might reasonably recover from by
/// adjusting setup are represented.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("simulation space configuration error: {0}")]
    Config(String),
}

pub type SpatialResult<T> = Result<T, SpatialError>;

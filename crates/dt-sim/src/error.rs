//! `SimError` — the scheduler's failure taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// A `SimulationConfig` combination the scheduler cannot honor, caught
    /// once at build time.
    #[error("simulation configuration error: {0}")]
    Config(String),

    /// A downstream collaborator (environment rebuild) failed in a way that
    /// forecloses continuing the run.
    #[error("spatial environment error: {0}")]
    Spatial(#[from] dt_spatial::SpatialError),
}

pub type SimResult<T> = Result<T, SimError>;

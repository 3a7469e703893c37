//! Framework error type.
//!
//! Sub-crates define their own error enums scoped to their own failures and
//! either convert into `DtError` via `From` impls or wrap it as one variant —
//! whichever keeps error sites clean for that crate. Only configuration
//! errors and surfaced transient conditions ever appear as `Err` values;
//! programming-error invariant violations panic at the point of detection
//! (see `dt-core::log_fatal`).

use thiserror::Error;

/// The top-level error type for `dt-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum DtError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `dt-*` crates.
pub type DtResult<T> = Result<T, DtError>;

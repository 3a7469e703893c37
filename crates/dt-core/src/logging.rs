//! `tracing` wiring shared by every crate in the workspace.
//!
//! The core never decides *where* logs go (that's an application concern,
//! named out of scope) — it only emits structured spans/events and, here,
//! offers one convenience initializer so example binaries and tests don't
//! each reinvent a `tracing-subscriber` setup.

use tracing_subscriber::EnvFilter;

/// Install a process-wide `tracing` subscriber reading `RUST_LOG`
/// (default: `info`). Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

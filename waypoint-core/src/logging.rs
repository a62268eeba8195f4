//! Tracing initialization for binaries and tests.
//!
//! The library itself only emits `tracing` events; subscribers are the
//! embedding application's business. This helper exists for quick
//! wiring in tools and integration tests.

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber honoring `WAYPOINT_LOG` (falling
/// back to `info`). Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("WAYPOINT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

//! Logging setup for host applications.

use tracing_subscriber::EnvFilter;

/// Install a process-wide `tracing` subscriber with env-filter support.
///
/// Defaults to `quantum_quest=info` when `RUST_LOG` says nothing else.
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let filter = EnvFilter::from_default_env()
        .add_directive("quantum_quest=info".parse().expect("static directive parses"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .ok();
}

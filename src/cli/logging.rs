//! Logging setup for the command-line binary

use tracing_subscriber::EnvFilter;

/// Compact stderr logging. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "prompt_injector=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed by tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

//! Logging initialization.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. Call once at startup.
///
/// `RUST_LOG` wins; otherwise `-v` raises the level, otherwise `default_level`
/// (from config) applies. Output goes to stderr so stdout stays pure JSON.
pub fn init_logging(verbosity: u8, default_level: &str) {
    let fallback = match verbosity {
        0 => default_level,
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

//! Diagnostic tracing for the command-line tool.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary. Output goes to stderr so it never mixes with documents
//! printed on stdout.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. When unset, defaults to `warn`, or `debug` when
/// `verbose` is set.
///
/// # Example
/// ```bash
/// RUST_LOG=traverser=trace traverser scrub config.json --rules rules/
/// ```
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

//! Tracing subscriber setup.
//!
//! The filter comes from `PHPSENSE_LOG`, then `RUST_LOG`, using the usual
//! `RUST_LOG` syntax (`debug`, `phpsense::storage=trace`). Without either the
//! level is `debug` when `debug = true` in settings, `warn` otherwise.
//!
//! All output goes to stderr so it never mixes with command output.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PHPSENSE_LOG";

fn build_filter(debug: bool) -> EnvFilter {
    if let Ok(val) = std::env::var(LOG_ENV) {
        return EnvFilter::builder().parse_lossy(val);
    }
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(if debug { "phpsense=debug" } else { "warn" })
}

/// Install the global subscriber. Calling it again is a no-op.
pub fn init(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(debug))
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}

//! Diagnostics for the hwls binaries
//!
//! Logs go to stderr so rendered output on stdout stays parseable.
//! Filter with `HWLS_LOG`, e.g. `HWLS_LOG=debug lspci`.

use tracing_subscriber::EnvFilter;

pub const ENV_LOG: &str = "HWLS_LOG";
const DEFAULT_FILTER: &str = "warn";

pub fn init() {
    let filter =
        EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A subscriber may already be installed (tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

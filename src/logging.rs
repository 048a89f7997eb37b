//! Tracing subscriber setup for the binary.

use std::env;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "TSDEFGEN_LOG";

/// `TSDEFGEN_LOG`, then `RUST_LOG`, then `debug` or `warn` depending on the
/// `--debug` flag.
fn build_filter(debug: bool) -> EnvFilter {
    if let Ok(directives) = env::var(LOG_ENV) {
        return EnvFilter::builder().parse_lossy(directives);
    }
    if env::var_os("RUST_LOG").is_some() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(if debug { "debug" } else { "warn" })
}

/// Install the global fmt subscriber, writing to stderr. A second call is a
/// no-op.
pub fn init_tracing(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(debug))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

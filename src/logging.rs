//! Tracing subscriber setup for the `nrag` binary.
//!
//! Log output goes to stderr so command output on stdout stays parseable.
//! The filter is read from `NRAG_LOG` (e.g. `NRAG_LOG=news_rag_core=debug`)
//! and defaults to `warn`. `--verbose` overrides both with `debug`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "NRAG_LOG";

pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

//! Setup shared by the pagearc binaries

use tracing_subscriber::EnvFilter;

/// Default log level for the `-v`/`-q` flags; `RUST_LOG` overrides it
pub fn default_level(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

pub fn init_tracing(verbose: bool, quiet: bool) {
    let level = default_level(verbose, quiet);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();
}

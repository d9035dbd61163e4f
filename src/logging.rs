//! Tracing setup for the command-line front end.
//!
//! Log events go to stderr so stdout only carries command output and the
//! per-skip diagnostic lines.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::errors::{SmokeError, SmokeResult};

/// Maps `-v`/`-q` counts to a default filter directive.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over the flags.
pub fn init_logging(verbose: u8, quiet: bool) -> SmokeResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose, quiet)))
        .map_err(|e| SmokeError::config(format!("invalid log filter: {}", e)))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .try_init()
        .map_err(|e| SmokeError::config(format!("cannot install logger: {}", e)))
}

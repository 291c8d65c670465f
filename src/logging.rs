//! Logging setup for the taglist binary.

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "taglist=warn";
const VERBOSE_LOG_FILTER: &str = "taglist=debug";

/// Initialize tracing with stderr output.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` picks debug over warn.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_filter = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|err| anyhow!("Failed to initialize logging: {}", err))
}

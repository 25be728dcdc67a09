//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after the config is loaded. Logs go to
//! stderr so command output on stdout stays clean.

use anyhow::{anyhow, bail, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Set to `1` (or `true`) to force `debug` regardless of other settings.
pub const DEBUG_ENV: &str = "NANO_GRAPHRAG_DEBUG";

/// Initialise the global tracing subscriber.
///
/// Precedence: `NANO_GRAPHRAG_DEBUG`, then `RUST_LOG`, then `level`.
pub fn init(level: &str) -> Result<()> {
    let filter = if debug_forced() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| anyhow!("invalid log level '{level}': {e}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to set subscriber: {e}"))?;

    Ok(())
}

fn debug_forced() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Parse a log level string, rejecting unrecognised values.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    if level.is_empty() {
        bail!("log level must not be empty");
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("unrecognised log level: '{level}'"))
}

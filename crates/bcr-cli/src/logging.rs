//! Logging initialization for the demo binary.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`. `log_format` is either
/// `"pretty"` or `"compact"`.
pub fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    match log_format {
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .map_err(|e| anyhow!("failed to initialize pretty tracing subscriber: {e}")),
        "compact" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact().with_target(false))
            .try_init()
            .map_err(|e| anyhow!("failed to initialize compact tracing subscriber: {e}")),
        other => Err(anyhow!(
            "unknown log format '{other}', expected 'pretty' or 'compact'"
        )),
    }
}

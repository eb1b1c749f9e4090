use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Installs the stderr log subscriber. `RUST_LOG` wins over `HH_LOG`.
pub fn init() -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let value = std::env::var("HH_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
            EnvFilter::try_new(&value)
                .map_err(|err| anyhow!("invalid log filter '{}': {}", value, err))?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {}", err))
}

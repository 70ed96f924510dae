//! Client configuration from environment variables.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::error::ApiError;

pub const ENV_API_KEY: &str = "CUSTOMGPT_API_KEY";
pub const ENV_BASE_URL: &str = "CUSTOMGPT_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "CUSTOMGPT_TIMEOUT_MS";
pub const ENV_RETRY_ATTEMPTS: &str = "CUSTOMGPT_RETRY_ATTEMPTS";
pub const ENV_RETRY_DELAY_MS: &str = "CUSTOMGPT_RETRY_DELAY_MS";

#[derive(Debug, Error)]
pub enum EnvConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} must be a non-negative integer, got {value:?}")]
    NotANumber { name: &'static str, value: String },
    #[error(transparent)]
    Invalid(#[from] ApiError),
}

/// Build a [`ClientConfig`] from the process environment.
pub fn config_from_env() -> Result<ClientConfig, EnvConfigError> {
    config_from_lookup(|name| std::env::var(name).ok())
}

/// Build a [`ClientConfig`] from any variable lookup. Empty values count as unset.
pub fn config_from_lookup<F>(lookup: F) -> Result<ClientConfig, EnvConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let api_key = get(ENV_API_KEY).ok_or(EnvConfigError::Missing(ENV_API_KEY))?;
    let mut builder: ClientConfigBuilder = ClientConfig::builder(api_key.trim());

    if let Some(url) = get(ENV_BASE_URL) {
        builder = builder.base_url(url.trim());
    }
    if let Some(ms) = number(ENV_TIMEOUT_MS, get(ENV_TIMEOUT_MS))? {
        builder = builder.timeout(Duration::from_millis(ms));
    }
    if let Some(attempts) = number(ENV_RETRY_ATTEMPTS, get(ENV_RETRY_ATTEMPTS))? {
        let attempts = u32::try_from(attempts).map_err(|_| EnvConfigError::NotANumber {
            name: ENV_RETRY_ATTEMPTS,
            value: attempts.to_string(),
        })?;
        builder = builder.retry_attempts(attempts);
    }
    if let Some(ms) = number(ENV_RETRY_DELAY_MS, get(ENV_RETRY_DELAY_MS))? {
        builder = builder.retry_delay(Duration::from_millis(ms));
    }

    let config = builder.build()?;
    debug!(?config, "Loaded configuration from environment");
    Ok(config)
}

fn number(name: &'static str, value: Option<String>) -> Result<Option<u64>, EnvConfigError> {
    value
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| EnvConfigError::NotANumber { name, value })
        })
        .transpose()
}

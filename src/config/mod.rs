use crate::utils::error::{Result, StartError};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.start.payfort.com/";

/// Client settings for talking to the gateway. Only the API key is
/// required; retry tuning defaults to the values the gateway recommends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Extra attempts after a transport failure on token and verification
    /// creation calls.
    #[serde(default = "default_max_request_attempts")]
    pub max_request_attempts: u32,

    /// Delay between retry attempts and between verification polls.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_request_attempts() -> u32 {
    4
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl ClientConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: default_base_url(),
            max_request_attempts: default_max_request_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }

    /// Loads and validates a configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub(crate) fn parsed_base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| StartError::InvalidConfigValue {
            field: "base_url".to_string(),
            value: self.base_url.clone(),
            reason: e.to_string(),
        })
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("api_key", &self.api_key)?;
        validate_url("base_url", &self.base_url)?;
        validate_positive_number(
            "max_request_attempts",
            self.max_request_attempts as u64,
            1,
        )?;
        Ok(())
    }
}

//! Configuration types for gallery-fetch

use crate::error::{Error, Result};
use crate::types::LoadMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// HTTP transport settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Per-request timeout in seconds (None = transport default, no explicit timeout)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Batch fetching settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of requests in flight per coordinator (None = unbounded)
    ///
    /// Every fetch of a batch is started immediately either way; the cap only
    /// bounds how many are talking to the network at once.
    #[serde(default)]
    pub max_concurrent_fetches: Option<usize>,
}

/// Main configuration for [`ImageLoader`](crate::ImageLoader)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Ordered list of image URLs shown by the gallery
    #[serde(default)]
    pub urls: Vec<String>,

    /// How a gallery populates its cells (default: batch)
    #[serde(default)]
    pub mode: LoadMode,

    /// HTTP transport settings
    #[serde(default)]
    pub transport: TransportConfig,

    /// Batch fetching settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Capacity of the event broadcast channel (default: 1000)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            mode: LoadMode::default(),
            transport: TransportConfig::default(),
            batch: BatchConfig::default(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Config {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config '{}': {}", path.display(), e),
            ))
        })?;
        let config = Self::from_json_str(&data)?;
        tracing::debug!(path = %path.display(), urls = config.urls.len(), "loaded configuration");
        Ok(config)
    }

    /// Reject settings that would stall fetching or event delivery
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer == 0 {
            return Err(Error::config(
                "event_buffer",
                "event_buffer must be greater than zero",
            ));
        }
        if self.batch.max_concurrent_fetches == Some(0) {
            return Err(Error::config(
                "batch.max_concurrent_fetches",
                "max_concurrent_fetches must be greater than zero when set",
            ));
        }
        if self.transport.request_timeout == Some(Duration::ZERO) {
            return Err(Error::config(
                "transport.request_timeout",
                "request_timeout must be greater than zero when set",
            ));
        }
        Ok(())
    }
}

fn default_user_agent() -> String {
    format!("gallery-fetch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_event_buffer() -> usize {
    1000
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

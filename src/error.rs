//! Error types for gallery-fetch
//!
//! Errors only exist inside the transport, decoding and configuration layers.
//! At the fetch boundary every error collapses to [`FetchResult::Failure`]
//! and the cause is logged, so the presentation layer never sees these values
//! for individual images.
//!
//! [`FetchResult::Failure`]: crate::types::FetchResult::Failure

use thiserror::Error;

/// Result type alias for gallery-fetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gallery-fetch
#[derive(Debug, Error)]
pub enum Error {
    /// A resource locator could not be parsed as a URL
    #[error("invalid URL '{input}': {source}")]
    InvalidUrl {
        /// The rejected input
        input: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// Transport-level failure (DNS, connect, TLS, timeout, reset)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// The server answered 2xx with no body
    #[error("empty response body for {url}")]
    EmptyBody {
        /// Requested URL
        url: String,
    },

    /// The body was not a decodable image
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "event_buffer")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

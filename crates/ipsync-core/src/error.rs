//! Error types for ipsync
//!
//! Every component crate returns [`Error`]. Only startup errors (configuration,
//! reading or parsing the config file) are fatal;
//! the engine logs every other kind and moves on to the next cycle.

use thiserror::Error;

/// Result type alias for ipsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ipsync
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// No public-IP endpoint produced a usable address
    #[error("IP resolution failed: {0}")]
    Resolution(String),

    /// Reading the DNS record failed or the record does not exist
    #[error("DNS record lookup failed: {0}")]
    Lookup(String),

    /// Writing the DNS record failed
    #[error("DNS record update failed: {0}")]
    Update(String),

    /// Delivering a notification failed
    #[error("Notification failed: {0}")]
    Notify(String),

    /// HTTP client construction or transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Filesystem errors (configuration file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create an update error
    pub fn update(msg: impl Into<String>) -> Self {
        Self::Update(msg.into())
    }

    /// Create a notification error
    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether this error must stop the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Io(_) | Self::Json(_))
    }
}

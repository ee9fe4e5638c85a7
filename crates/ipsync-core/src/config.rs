//! Configuration types for ipsync
//!
//! The configuration is a single JSON document loaded once at startup.
//! It is immutable for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Public-IP echo services queried in order when `ip_endpoints` is not set
pub const DEFAULT_IP_ENDPOINTS: &[&str] = &[
    "https://api.ipify.org",
    "https://ifconfig.me/ip",
    "https://checkip.amazonaws.com",
];

/// Main ipsync configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Cloudflare API token with Zone:DNS:Edit permission
    #[serde(default, alias = "cloudflare_api_token")]
    pub api_token: String,

    /// Zone holding the managed record
    #[serde(default)]
    pub zone_id: String,

    /// Fully qualified name of the managed A record
    #[serde(default)]
    pub record_name: String,

    /// Seconds to sleep between two cycles
    #[serde(default = "default_poll_interval_seconds", alias = "check_interval")]
    pub poll_interval_seconds: u64,

    /// Telegram bot token (optional)
    #[serde(default)]
    pub telegram_bot_token: Option<String>,

    /// Single Telegram target chat (optional)
    #[serde(default)]
    pub telegram_chat_id: Option<ChatId>,

    /// Additional Telegram target chats
    #[serde(default)]
    pub telegram_chat_ids: Vec<ChatId>,

    /// Ordered list of plain-text "what is my IP" endpoints
    #[serde(default = "default_ip_endpoints")]
    pub ip_endpoints: Vec<String>,

    /// Reject private, loopback and link-local addresses from endpoints
    #[serde(default)]
    pub require_public_ip: bool,

    /// Timeout applied to every outbound HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log level: trace, debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl SyncConfig {
    /// Create a configuration for one record with every optional setting at its default
    pub fn new(
        api_token: impl Into<String>,
        zone_id: impl Into<String>,
        record_name: impl Into<String>,
    ) -> Self {
        Self {
            api_token: api_token.into(),
            zone_id: zone_id.into(),
            record_name: record_name.into(),
            poll_interval_seconds: default_poll_interval_seconds(),
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_chat_ids: Vec::new(),
            ip_endpoints: default_ip_endpoints(),
            require_public_ip: false,
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
        }
    }

    /// Load the configuration from a JSON file
    ///
    /// The result is not validated; call [`SyncConfig::validate`] before use.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Validate the configuration
    ///
    /// Must pass before any component is constructed: a configuration that
    /// fails here never leads to an outbound request.
    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(Error::config("api_token is required"));
        }

        if self.zone_id.trim().is_empty() {
            return Err(Error::config("zone_id is required"));
        }

        validate_domain_name(&self.record_name)?;

        if self.poll_interval_seconds == 0 {
            return Err(Error::config("poll_interval_seconds must be > 0"));
        }

        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be > 0"));
        }

        if self.ip_endpoints.is_empty() {
            return Err(Error::config("ip_endpoints must contain at least one URL"));
        }

        for url in &self.ip_endpoints {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(Error::config(format!(
                    "ip_endpoints entry must use HTTP or HTTPS scheme. Got: {url}"
                )));
            }
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(Error::config(format!(
                    "log_level '{other}' is not valid. Valid levels: trace, debug, info, warn, error"
                )));
            }
        }

        Ok(())
    }

    /// Telegram settings, if both a bot token and at least one chat are configured
    pub fn telegram(&self) -> Option<TelegramConfig> {
        let bot_token = self
            .telegram_bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())?;

        let chat_ids = self.chat_ids();
        if chat_ids.is_empty() {
            return None;
        }

        Some(TelegramConfig {
            bot_token: bot_token.to_string(),
            chat_ids,
        })
    }

    /// True when only half of the Telegram settings are present
    pub fn telegram_partially_configured(&self) -> bool {
        let has_token = self
            .telegram_bot_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        has_token != !self.chat_ids().is_empty()
    }

    /// All configured chats, `telegram_chat_id` first, without duplicates
    pub fn chat_ids(&self) -> Vec<ChatId> {
        let mut seen = HashSet::new();
        self.telegram_chat_id
            .iter()
            .chain(self.telegram_chat_ids.iter())
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect()
    }

    /// Sleep between two cycles
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Timeout for a single outbound request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// Secrets stay out of Debug output
impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("record_name", &self.record_name)
            .field("poll_interval_seconds", &self.poll_interval_seconds)
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("chat_ids", &self.chat_ids())
            .field("ip_endpoints", &self.ip_endpoints)
            .field("require_public_ip", &self.require_public_ip)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Telegram chat identifier: numeric id or `@channelusername`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    /// Numeric chat id (negative for groups and channels)
    Id(i64),
    /// Public channel username
    Username(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{id}"),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

/// Resolved Telegram notifier settings
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token
    pub bot_token: String,
    /// Target chats, never empty
    pub chat_ids: Vec<ChatId>,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<REDACTED>")
            .field("chat_ids", &self.chat_ids)
            .finish()
    }
}

/// Basic RFC 1035 checks on the record name
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("record_name is required"));
    }

    if domain.len() > 253 {
        return Err(Error::config(format!(
            "record_name too long: {} chars (max 253)",
            domain.len()
        )));
    }

    for (position, label) in domain.split('.').enumerate() {
        if label.is_empty() {
            return Err(Error::config(format!(
                "record_name has empty label: '{domain}'"
            )));
        }

        // wildcard records
        if position == 0 && label == "*" {
            continue;
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "record_name label too long: {} chars (max 63). Label: '{label}'",
                label.len()
            )));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::config(format!(
                "record_name label contains invalid characters. Label: '{label}'"
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "record_name label cannot start or end with hyphen. Label: '{label}'"
            )));
        }
    }

    Ok(())
}

fn default_poll_interval_seconds() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ip_endpoints() -> Vec<String> {
    DEFAULT_IP_ENDPOINTS.iter().map(|s| s.to_string()).collect()
}

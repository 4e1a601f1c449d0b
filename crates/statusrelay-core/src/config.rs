//! Configuration types for the status relay
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::messages::MARKDOWN_RESERVED;

/// Status endpoint polled by default
pub const DEFAULT_STATUS_URL: &str = "https://production.turnitindetect.org/maintenance-status";

/// Telegram Bot API base URL
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Main relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Status endpoint settings
    #[serde(default)]
    pub status: StatusSourceConfig,

    /// Monitor loop settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Subscriber store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Telegram transport settings
    pub telegram: TelegramConfig,
}

impl RelayConfig {
    /// Create a configuration with defaults and the given bot token
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            telegram: TelegramConfig::new(bot_token),
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.status.validate()?;
        self.monitor.validate()?;
        self.store.validate()?;
        self.telegram.validate()?;
        Ok(())
    }
}

/// Status endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSourceConfig {
    /// URL returning the JSON status document
    #[serde(default = "default_status_url")]
    pub url: String,

    /// HTTP timeout for a single fetch (in seconds)
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,

    /// Human-readable name of the monitored service, used in messages
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl StatusSourceConfig {
    /// Validate the status source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("Status URL cannot be empty"));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Status URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Status fetch timeout must be > 0"));
        }
        if self.service_name.trim().is_empty() {
            return Err(crate::Error::config("Service name cannot be empty"));
        }
        if let Some(c) = self.service_name.chars().find(|c| MARKDOWN_RESERVED.contains(c)) {
            return Err(crate::Error::config(format!(
                "Service name cannot contain Markdown character '{}'. Got: {}",
                c, self.service_name
            )));
        }
        Ok(())
    }
}

impl Default for StatusSourceConfig {
    fn default() -> Self {
        Self {
            url: default_status_url(),
            timeout_secs: default_fetch_timeout_secs(),
            service_name: default_service_name(),
        }
    }
}

/// Monitor loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Pause between the end of one poll cycle and the start of the next (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Capacity of the monitor event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl MonitorConfig {
    /// Validate the monitor configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Subscriber store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// JSON file store
    File {
        /// Path to the subscriber file
        path: String,
    },

    /// In-memory store (not persistent)
    Memory,
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.trim().is_empty() => {
                Err(crate::Error::config("Subscriber file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: "subscribers.json".to_string(),
        }
    }
}

/// Telegram Bot API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token
    /// ⚠️ NEVER log this value
    pub bot_token: String,

    /// API base URL (overridable for self-hosted Bot API servers)
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// `getUpdates` long-poll timeout (in seconds)
    #[serde(default = "default_long_poll_timeout_secs")]
    pub long_poll_timeout_secs: u64,

    /// Pause after a failed `getUpdates` call (in seconds)
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
}

impl TelegramConfig {
    /// Create a configuration with defaults and the given bot token
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: default_telegram_api_base(),
            long_poll_timeout_secs: default_long_poll_timeout_secs(),
            error_backoff_secs: default_error_backoff_secs(),
        }
    }

    /// Validate the Telegram configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.bot_token.is_empty() {
            return Err(crate::Error::config("Telegram bot token cannot be empty"));
        }
        // Bot tokens look like "<bot id>:<secret>"
        if !self.bot_token.contains(':') {
            return Err(crate::Error::config(
                "Telegram bot token is malformed (expected <id>:<secret>)",
            ));
        }
        if self.api_base.is_empty() {
            return Err(crate::Error::config("Telegram API base URL cannot be empty"));
        }
        if self.long_poll_timeout_secs == 0 {
            return Err(crate::Error::config("Long-poll timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

// Custom Debug implementation that hides the bot token
impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("long_poll_timeout_secs", &self.long_poll_timeout_secs)
            .field("error_backoff_secs", &self.error_backoff_secs)
            .finish()
    }
}

fn default_status_url() -> String {
    DEFAULT_STATUS_URL.to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_service_name() -> String {
    "Turnitin".to_string()
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_telegram_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}

fn default_long_poll_timeout_secs() -> u64 {
    30
}

fn default_error_backoff_secs() -> u64 {
    5
}

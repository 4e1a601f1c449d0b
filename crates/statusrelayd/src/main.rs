// # statusrelayd - Status Relay Daemon
//
// Thin integration layer: all monitoring, subscription and routing logic
// lives in statusrelay-core. This binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the HTTP status provider, Telegram client and subscriber store
// 4. Running the status monitor and command router until SIGTERM/SIGINT
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Status source
// - `STATUSRELAY_STATUS_URL`: URL of the JSON status document
// - `STATUSRELAY_SERVICE_NAME`: Name used in messages (default: Turnitin)
// - `STATUSRELAY_POLL_INTERVAL_SECS`: Poll interval, 1..=3600 (default: 1)
//
// ### Subscribers
// - `STATUSRELAY_STORE_TYPE`: Type of subscriber store (file, memory)
// - `STATUSRELAY_STORE_PATH`: Path to the subscriber file (for file store)
//
// ### Telegram
// - `STATUSRELAY_TELEGRAM_TOKEN`: Bot token (required)
// - `STATUSRELAY_TELEGRAM_API_BASE`: Bot API base URL
//
// ### Logging
// - `STATUSRELAY_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export STATUSRELAY_TELEGRAM_TOKEN=123456:your_bot_token
// export STATUSRELAY_STORE_PATH=/var/lib/statusrelay/subscribers.json
//
// statusrelayd
// ```

use anyhow::{Context, Result};
use statusrelay_core::{
    CommandRouter, FileSubscriberStore, MemorySubscriberStore, MessageCatalog, RelayConfig,
    StatusMonitor, StoreConfig, SubscriberStore, UpdateSource,
};
use statusrelay_provider_http::HttpStatusProvider;
use statusrelay_telegram::TelegramClient;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long the loops get to stop after a shutdown signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum RelayExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<RelayExitCode> for ExitCode {
    fn from(code: RelayExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    relay: RelayConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup("STATUSRELAY_TELEGRAM_TOKEN").unwrap_or_default();
        let mut relay = RelayConfig::new(token);

        if let Some(url) = lookup("STATUSRELAY_STATUS_URL") {
            relay.status.url = url;
        }
        if let Some(name) = lookup("STATUSRELAY_SERVICE_NAME") {
            relay.status.service_name = name;
        }
        if let Some(interval) = lookup("STATUSRELAY_POLL_INTERVAL_SECS") {
            relay.monitor.poll_interval_secs = interval.trim().parse().with_context(|| {
                format!(
                    "STATUSRELAY_POLL_INTERVAL_SECS must be a number of seconds. Got: {}",
                    interval
                )
            })?;
        }

        let store_type = lookup("STATUSRELAY_STORE_TYPE").unwrap_or_else(|| "file".to_string());
        relay.store = match store_type.as_str() {
            "file" => StoreConfig::File {
                path: lookup("STATUSRELAY_STORE_PATH")
                    .unwrap_or_else(|| "subscribers.json".to_string()),
            },
            "memory" => StoreConfig::Memory,
            other => anyhow::bail!(
                "STATUSRELAY_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                other
            ),
        };

        if let Some(api_base) = lookup("STATUSRELAY_TELEGRAM_API_BASE") {
            relay.telegram.api_base = api_base;
        }

        Ok(Self {
            relay,
            log_level: lookup("STATUSRELAY_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.relay.telegram.bot_token.is_empty() {
            anyhow::bail!(
                "STATUSRELAY_TELEGRAM_TOKEN is required. \
                Set it via: export STATUSRELAY_TELEGRAM_TOKEN=123456:your_bot_token"
            );
        }

        let interval = self.relay.monitor.poll_interval_secs;
        if !(1..=3600).contains(&interval) {
            anyhow::bail!(
                "STATUSRELAY_POLL_INTERVAL_SECS must be between 1 and 3600 seconds. Got: {}",
                interval
            );
        }

        self.relay.validate()?;

        if self.relay.status.url.starts_with("http://") {
            eprintln!(
                "WARNING: STATUSRELAY_STATUS_URL uses HTTP (not HTTPS). \
                      This is less secure. Consider using HTTPS."
            );
        }

        self.level()?;
        Ok(())
    }

    /// Parsed log level
    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "STATUSRELAY_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return RelayExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return RelayExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RelayExitCode::ConfigError.into();
    }

    info!("Starting statusrelayd daemon");
    info!("Configuration loaded: {:?}", config.relay);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RelayExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            RelayExitCode::RuntimeError
        } else {
            RelayExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Build the subscriber store named by the configuration
async fn open_store(config: &StoreConfig) -> Arc<dyn SubscriberStore> {
    match config {
        StoreConfig::File { path } => Arc::new(FileSubscriberStore::open(path).await),
        StoreConfig::Memory => {
            warn!("Using in-memory subscriber store; subscriptions are lost on restart");
            Arc::new(MemorySubscriberStore::new())
        }
    }
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let relay = config.relay;

    let store = open_store(&relay.store).await;
    info!("Loaded {} subscriber(s)", store.len().await);

    let provider = Arc::new(HttpStatusProvider::from_config(&relay.status)?);
    let telegram = Arc::new(TelegramClient::new(&relay.telegram)?);
    let messages = MessageCatalog::new(relay.status.service_name.clone());

    let (monitor, mut monitor_events) = StatusMonitor::new(
        provider.clone(),
        store.clone(),
        telegram.clone(),
        messages.clone(),
        &relay.monitor,
    )?;
    let router = CommandRouter::new(store.clone(), provider, telegram.clone(), messages);

    // Drain monitor events so the channel never fills up
    tokio::spawn(async move {
        while let Some(event) = monitor_events.recv().await {
            debug!("Monitor event: {:?}", event);
        }
    });

    let (monitor_stop_tx, monitor_stop_rx) = tokio::sync::oneshot::channel();
    let mut monitor_task = tokio::spawn(async move {
        monitor.run_with_shutdown(monitor_stop_rx).await;
    });

    let updates = telegram.watch();
    let (router_stop_tx, router_stop_rx) = tokio::sync::oneshot::channel();
    let mut router_task = tokio::spawn(async move {
        router.run_with_shutdown(updates, router_stop_rx).await;
    });

    info!("Monitoring {} every {}s", relay.status.url, relay.monitor.poll_interval_secs);

    tokio::select! {
        signal = wait_for_shutdown() => {
            info!("Received shutdown signal: {}", signal?);
        }
        result = &mut monitor_task => {
            anyhow::bail!("Status monitor stopped unexpectedly: {:?}", result);
        }
        result = &mut router_task => {
            anyhow::bail!("Command router stopped unexpectedly: {:?}", result);
        }
    }

    info!("Shutting down daemon");
    let _ = monitor_stop_tx.send(());
    let _ = router_stop_tx.send(());

    let stopped = tokio::time::timeout(SHUTDOWN_GRACE, async {
        let _ = monitor_task.await;
        let _ = router_task.await;
    })
    .await;
    if stopped.is_err() {
        warn!("Loops did not stop within {:?}", SHUTDOWN_GRACE);
    }

    if let Err(e) = store.flush().await {
        error!("Failed to flush subscribers on shutdown: {}", e);
    }

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("STATUSRELAY_TELEGRAM_TOKEN", "123:abc")]).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.relay.status.url, statusrelay_core::config::DEFAULT_STATUS_URL);
        assert_eq!(config.relay.status.service_name, "Turnitin");
        assert_eq!(config.relay.monitor.poll_interval_secs, 1);
        assert_eq!(
            config.relay.store,
            StoreConfig::File {
                path: "subscribers.json".to_string()
            }
        );
        assert_eq!(config.level().unwrap(), Level::INFO);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("STATUSRELAY_TELEGRAM_TOKEN", "123:abc"),
            ("STATUSRELAY_STATUS_URL", "https://status.example.com/maintenance"),
            ("STATUSRELAY_SERVICE_NAME", "Example"),
            ("STATUSRELAY_POLL_INTERVAL_SECS", "30"),
            ("STATUSRELAY_STORE_TYPE", "memory"),
            ("STATUSRELAY_LOG_LEVEL", "DEBUG"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.relay.status.service_name, "Example");
        assert_eq!(config.relay.monitor.poll_interval_secs, 30);
        assert_eq!(config.relay.store, StoreConfig::Memory);
        assert_eq!(config.level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let config = config_from(&[]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("STATUSRELAY_TELEGRAM_TOKEN"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("STATUSRELAY_POLL_INTERVAL_SECS", "soon")]).is_err());
        assert!(config_from(&[("STATUSRELAY_STORE_TYPE", "redis")]).is_err());

        let zero = config_from(&[
            ("STATUSRELAY_TELEGRAM_TOKEN", "123:abc"),
            ("STATUSRELAY_POLL_INTERVAL_SECS", "0"),
        ])
        .unwrap();
        assert!(zero.validate().is_err());

        let bad_level = config_from(&[
            ("STATUSRELAY_TELEGRAM_TOKEN", "123:abc"),
            ("STATUSRELAY_LOG_LEVEL", "loud"),
        ])
        .unwrap();
        assert!(bad_level.validate().is_err());

        let bad_url = config_from(&[
            ("STATUSRELAY_TELEGRAM_TOKEN", "123:abc"),
            ("STATUSRELAY_STATUS_URL", "ftp://example.com"),
        ])
        .unwrap();
        assert!(bad_url.validate().is_err());

        let markdown_name = config_from(&[
            ("STATUSRELAY_TELEGRAM_TOKEN", "123:abc"),
            ("STATUSRELAY_SERVICE_NAME", "Turnitin_EU"),
        ])
        .unwrap();
        assert!(markdown_name.validate().is_err());
    }
}

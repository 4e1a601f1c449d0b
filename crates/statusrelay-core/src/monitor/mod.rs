//! Status monitor
//!
//! The StatusMonitor is responsible for:
//! - Polling the StatusProvider at a fixed interval
//! - Tracking the last observed maintenance flag
//! - Detecting the maintenance → active edge
//! - Notifying every subscriber when that edge is seen
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐
//! │ StatusProvider │─── StatusDocument ───┐
//! └────────────────┘                      │
//!                                         ▼
//!                                ┌───────────────┐
//!                                │ StatusMonitor │
//!                                └───────────────┘
//!                                         │
//!         ┌───────────────────────────────┼───────────────────────────┐
//!         │                               │                           │
//!         ▼                               ▼                           ▼
//! ┌─────────────────┐         ┌────────────────────────┐     ┌─────────────┐
//! │ SubscriberStore │         │ NotificationDispatcher │     │   Events    │
//! │ (recipients)    │         │ (fan-out)              │     │  (observe)  │
//! └─────────────────┘         └────────────────────────┘     └─────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Fetch the status document; on failure log and stop here
//! 2. Feed `is_maintenance` into [`MonitorState`]
//! 3. On [`Transition::MaintenanceEnded`], notify all current subscribers
//! 4. Sleep for the poll interval
//!
//! The first successful fetch only establishes a baseline; it can never
//! notify. A failed fetch leaves the state untouched.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::config::MonitorConfig;
use crate::dispatcher::{DeliveryReport, NotificationDispatcher};
use crate::error::Result;
use crate::messages::MessageCatalog;
use crate::traits::{MessageTransport, StatusProvider, SubscriberStore};

/// What one observation did to the monitor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First observation since start; nothing to compare against
    Baseline,
    /// Same flag as last time
    Unchanged,
    /// Active → maintenance
    MaintenanceStarted,
    /// Maintenance → active; the only transition that notifies
    MaintenanceEnded,
}

impl Transition {
    /// Whether subscribers should be notified
    pub fn should_notify(self) -> bool {
        matches!(self, Transition::MaintenanceEnded)
    }
}

/// Edge-detection state
///
/// Held in memory only; a restart goes back to "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    last_observed_maintenance: Option<bool>,
}

impl MonitorState {
    /// Fresh state with no baseline
    pub fn new() -> Self {
        Self::default()
    }

    /// Last observed flag, `None` until the first successful fetch
    pub fn last_observed_maintenance(&self) -> Option<bool> {
        self.last_observed_maintenance
    }

    /// Record an observation and classify it against the previous one
    pub fn observe(&mut self, is_maintenance: bool) -> Transition {
        let transition = match (self.last_observed_maintenance, is_maintenance) {
            (None, _) => Transition::Baseline,
            (Some(true), false) => Transition::MaintenanceEnded,
            (Some(false), true) => Transition::MaintenanceStarted,
            (Some(_), _) => Transition::Unchanged,
        };
        self.last_observed_maintenance = Some(is_maintenance);
        transition
    }
}

/// Events emitted by the StatusMonitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Monitor loop started
    Started {
        poll_interval_secs: u64,
    },

    /// Status fetch failed; state untouched
    FetchFailed {
        error: String,
    },

    /// Status fetched and classified
    StatusObserved {
        is_maintenance: bool,
        transition: Transition,
    },

    /// Maintenance-ended notification fanned out
    NotificationDispatched {
        delivered: usize,
        failed: usize,
    },

    /// Monitor loop stopped
    Stopped {
        reason: String,
    },
}

/// Result of a single poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The fetch failed; nothing else happened
    FetchFailed,

    /// A document was fetched and classified
    Observed {
        is_maintenance: bool,
        transition: Transition,
        /// Present when the cycle notified subscribers
        delivery: Option<DeliveryReport>,
    },
}

impl CycleOutcome {
    /// Whether this cycle sent the maintenance-ended notification
    pub fn notified(&self) -> bool {
        matches!(self, CycleOutcome::Observed { delivery: Some(_), .. })
    }
}

/// Maintenance monitor
///
/// Runs an unbounded poll loop. Each cycle holds the state lock from fetch
/// to dispatch, so cycles never overlap even if `poll_once` is called from
/// several tasks.
///
/// ## Lifecycle
///
/// 1. Create with [`StatusMonitor::new()`]
/// 2. Start with [`StatusMonitor::run()`] (never returns)
/// 3. Or drive it with [`StatusMonitor::run_with_shutdown()`] / [`StatusMonitor::poll_once()`]
pub struct StatusMonitor {
    /// Status source
    provider: Arc<dyn StatusProvider>,

    /// Who gets notified
    store: Arc<dyn SubscriberStore>,

    /// Fan-out over the message transport
    dispatcher: NotificationDispatcher,

    /// Notification text
    messages: MessageCatalog,

    /// Pause after each cycle
    poll_interval: Duration,

    /// Edge-detection state
    state: Mutex<MonitorState>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<MonitorEvent>,
}

impl StatusMonitor {
    /// Create a new monitor
    ///
    /// # Returns
    ///
    /// A tuple of (monitor, event_receiver) where event_receiver yields monitor events
    pub fn new(
        provider: Arc<dyn StatusProvider>,
        store: Arc<dyn SubscriberStore>,
        transport: Arc<dyn MessageTransport>,
        messages: MessageCatalog,
        config: &MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<MonitorEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let monitor = Self {
            provider,
            store,
            dispatcher: NotificationDispatcher::new(transport),
            messages,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            state: Mutex::new(MonitorState::new()),
            event_tx: tx,
        };

        Ok((monitor, rx))
    }

    /// Run the monitor for the lifetime of the process
    pub async fn run(&self) {
        self.run_internal(None).await
    }

    /// Run the monitor until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// Shutdown is observed between cycles; an in-flight cycle completes.
    pub async fn run_with_shutdown(&self, shutdown_rx: oneshot::Receiver<()>) {
        self.run_internal(Some(shutdown_rx)).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) {
        info!(
            "Starting status monitor ({}, every {:?})",
            self.provider.provider_name(),
            self.poll_interval
        );
        self.emit_event(MonitorEvent::Started {
            poll_interval_secs: self.poll_interval.as_secs(),
        });

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(shutdown);

        loop {
            self.poll_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping status monitor");
                    self.emit_event(MonitorEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }
    }

    /// Execute exactly one poll cycle
    pub async fn poll_once(&self) -> CycleOutcome {
        let mut state = self.state.lock().await;

        let document = match self.provider.fetch().await {
            Ok(document) => document,
            Err(e) => {
                warn!("Error fetching status: {}", e);
                self.emit_event(MonitorEvent::FetchFailed {
                    error: e.to_string(),
                });
                return CycleOutcome::FetchFailed;
            }
        };

        if !document.maintenance_flag_present() {
            warn!("Status document has no is_maintenance field, treating it as maintenance");
        }

        let is_maintenance = document.is_maintenance();
        let transition = state.observe(is_maintenance);

        match transition {
            Transition::Baseline => {
                info!("Initial status: {}", status_label(is_maintenance));
            }
            Transition::MaintenanceStarted | Transition::MaintenanceEnded => {
                info!(
                    "Status changed: {} at {}",
                    status_label(is_maintenance),
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
                );
            }
            Transition::Unchanged => {
                trace!("Status unchanged: {}", status_label(is_maintenance));
            }
        }

        self.emit_event(MonitorEvent::StatusObserved {
            is_maintenance,
            transition,
        });

        let delivery = if transition.should_notify() {
            Some(self.notify_subscribers().await)
        } else {
            None
        };

        CycleOutcome::Observed {
            is_maintenance,
            transition,
            delivery,
        }
    }

    /// Last observed maintenance flag (`None` until the first successful fetch)
    pub async fn last_observed_maintenance(&self) -> Option<bool> {
        self.state.lock().await.last_observed_maintenance()
    }

    /// Send the maintenance-ended notification to every current subscriber
    async fn notify_subscribers(&self) -> DeliveryReport {
        let recipients = self.store.all().await;
        info!(
            "{} is now ACTIVE! Notifying {} subscriber(s)",
            self.messages.service_name(),
            recipients.len()
        );

        let report = self
            .dispatcher
            .deliver(&recipients, &self.messages.maintenance_ended())
            .await;

        info!(
            "Notification dispatch finished: {} delivered, {} failed",
            report.delivered.len(),
            report.failed.len()
        );
        self.emit_event(MonitorEvent::NotificationDispatched {
            delivered: report.delivered.len(),
            failed: report.failed.len(),
        });

        report
    }

    /// Emit a monitor event
    fn emit_event(&self, event: MonitorEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    "Monitor event channel full, dropping event. \
                     Consider increasing event_channel_capacity."
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Monitor event receiver dropped");
            }
        }
    }
}

fn status_label(is_maintenance: bool) -> &'static str {
    if is_maintenance { "MAINTENANCE" } else { "ACTIVE" }
}

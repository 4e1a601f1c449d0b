//! Notification dispatcher
//!
//! Delivers one message to many recipients, one send per recipient. A failed
//! send is logged with the recipient id and never stops the batch.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::traits::{MessageTransport, SubscriberId};

/// Outcome of one dispatch batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Recipients whose send succeeded
    pub delivered: Vec<SubscriberId>,
    /// Recipients whose send failed, with the error text
    pub failed: Vec<(SubscriberId, String)>,
}

impl DeliveryReport {
    /// Total number of attempted sends
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Best-effort fan-out over a [`MessageTransport`]
///
/// No retries, batching, rate limiting or deduplication: each entry in the
/// recipient list gets exactly one send attempt, in list order.
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn MessageTransport>,
}

impl NotificationDispatcher {
    /// Create a dispatcher over a transport
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self { transport }
    }

    /// Send `message` to every recipient
    pub async fn deliver(&self, recipients: &[SubscriberId], message: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for &recipient in recipients {
            match self
                .transport
                .send_message(recipient.chat_id(), message, None)
                .await
            {
                Ok(()) => {
                    debug!("Notification sent to user {}", recipient);
                    report.delivered.push(recipient);
                }
                Err(e) => {
                    warn!("Failed to send notification to user {}: {}", recipient, e);
                    report.failed.push((recipient, e.to_string()));
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("transport", &self.transport.transport_name())
            .finish()
    }
}

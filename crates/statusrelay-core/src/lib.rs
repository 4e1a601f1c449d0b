// # statusrelay-core
//
// Core library for the status relay: watch a service's maintenance flag and
// tell subscribers when the service comes back.
//
// ## Architecture Overview
//
// - **StatusProvider**: Trait for fetching the status document
// - **SubscriberStore**: Trait for the persistent subscriber set
// - **MessageTransport**: Trait for sending/editing messages
// - **UpdateSource**: Trait for streaming inbound commands and button presses
// - **StatusMonitor**: Poll loop with maintenance → active edge detection
// - **NotificationDispatcher**: Best-effort fan-out to subscribers
// - **CommandRouter**: Handles /start, /status, /subscribe, /unsubscribe and buttons
//
// ## Design Principles
//
// 1. **Edge-triggered**: One notification per maintenance → active flip
// 2. **Fail toward silence**: Missing or unreadable status never notifies
// 3. **Log and continue**: No runtime error stops either loop
// 4. **Library-First**: Everything but env parsing lives here

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod messages;
pub mod monitor;
pub mod router;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{MonitorConfig, RelayConfig, StatusSourceConfig, StoreConfig, TelegramConfig};
pub use dispatcher::{DeliveryReport, NotificationDispatcher};
pub use error::{Error, Result};
pub use messages::MessageCatalog;
pub use monitor::{CycleOutcome, MonitorEvent, MonitorState, StatusMonitor, Transition};
pub use router::CommandRouter;
pub use store::{FileSubscriberStore, MemorySubscriberStore};
pub use traits::{
    InboundEvent, MessageTransport, StatusDocument, StatusProvider, SubscriberId, SubscriberStore,
    UpdateSource,
};

//! Core traits for the status relay
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`StatusProvider`]: Fetch the monitored service's status document
//! - [`MessageTransport`]: Send, edit and acknowledge messages
//! - [`UpdateSource`]: Stream inbound commands and button presses
//! - [`SubscriberStore`]: Persistent set of notification subscribers

pub mod message_transport;
pub mod status_provider;
pub mod subscriber_store;
pub mod update_source;

pub use message_transport::{ChatId, InlineButton, InlineKeyboard, MessageId, MessageTransport};
pub use status_provider::{LastMaintenance, StatusDocument, StatusProvider, parse_timestamp};
pub use subscriber_store::{SubscriberId, SubscriberStore};
pub use update_source::{ButtonAction, Command, InboundEvent, UpdateSource};

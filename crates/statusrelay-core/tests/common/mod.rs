//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles for the provider and
//! transport traits.

#![allow(dead_code)]

use statusrelay_core::error::{Error, Result};
use statusrelay_core::traits::{
    ChatId, InlineKeyboard, MessageId, MessageTransport, StatusDocument, StatusProvider,
};
use statusrelay_core::{MessageCatalog, MonitorConfig, MonitorEvent, StatusMonitor, SubscriberStore};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// One scripted fetch result
#[derive(Debug, Clone)]
pub enum Step {
    /// Document with the given maintenance flag
    Maintenance(bool),
    /// Document without an `is_maintenance` field
    MissingFlag,
    /// Fetch failure
    Fail,
}

/// A StatusProvider that replays a fixed script
///
/// Once the script runs out every fetch fails.
pub struct ScriptedStatusProvider {
    script: Mutex<VecDeque<Step>>,
    fetch_count: AtomicUsize,
    fetch_times: Mutex<Vec<tokio::time::Instant>>,
    latency: Option<Duration>,
}

impl ScriptedStatusProvider {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fetch_count: AtomicUsize::new(0),
            fetch_times: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Script of plain maintenance flags
    pub fn from_flags(flags: &[bool]) -> Self {
        Self::new(flags.iter().map(|f| Step::Maintenance(*f)))
    }

    /// Make every fetch take `latency` (on the tokio clock)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of fetch() calls so far
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Tokio-clock instants at which fetches started
    pub fn fetch_times(&self) -> Vec<tokio::time::Instant> {
        self.fetch_times.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl StatusProvider for ScriptedStatusProvider {
    async fn fetch(&self) -> Result<StatusDocument> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.fetch_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Maintenance(flag)) => Ok(StatusDocument::new(flag, "2025-01-09T12:00:00Z")),
            Some(Step::MissingFlag) => Ok(StatusDocument::from_json(
                br#"{"updated_at": "2025-01-09T12:00:00Z"}"#,
            )?),
            Some(Step::Fail) => Err(Error::status_provider("HTTP 503 Service Unavailable")),
            None => Err(Error::status_provider("script exhausted")),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// A call recorded by RecordingTransport
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Message {
        chat: ChatId,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    Edit {
        chat: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    Answer {
        callback_id: String,
    },
}

/// A MessageTransport that records every call
///
/// Sends to chats in `failing_chats` return an error (and are still recorded
/// as attempts).
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    attempts: AtomicUsize,
    failing_chats: HashSet<ChatId>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose sends to the given chats fail
    pub fn failing_for(chats: impl IntoIterator<Item = ChatId>) -> Self {
        Self {
            failing_chats: chats.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Successful calls, in order
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Chats that received a new message, in order
    pub fn message_chats(&self) -> Vec<ChatId> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message { chat, .. } => Some(chat),
                _ => None,
            })
            .collect()
    }

    /// All calls, including failed ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn record(&self, chat: Option<ChatId>, entry: Sent) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(chat) = chat
            && self.failing_chats.contains(&chat)
        {
            return Err(Error::provider(
                "recording",
                format!("Forbidden: bot was blocked by chat {}", chat),
            ));
        }
        self.sent.lock().unwrap().push(entry);
        Ok(())
    }
}

#[async_trait::async_trait]
impl MessageTransport for RecordingTransport {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.record(
            Some(chat),
            Sent::Message {
                chat,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            },
        )
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.record(
            Some(chat),
            Sent::Edit {
                chat,
                message_id,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            },
        )
    }

    async fn answer_callback(&self, callback_id: &str, _text: Option<&str>) -> Result<()> {
        self.record(
            None,
            Sent::Answer {
                callback_id: callback_id.to_string(),
            },
        )
    }

    fn transport_name(&self) -> &'static str {
        "recording"
    }
}

/// Service name used by every test catalog
pub const SERVICE: &str = "Turnitin";

pub fn catalog() -> MessageCatalog {
    MessageCatalog::new(SERVICE)
}

/// Build a monitor with a 1 second interval over the given doubles
pub fn monitor_with(
    provider: Arc<ScriptedStatusProvider>,
    store: Arc<dyn SubscriberStore>,
    transport: Arc<RecordingTransport>,
) -> (StatusMonitor, mpsc::Receiver<MonitorEvent>) {
    let config = MonitorConfig {
        poll_interval_secs: 1,
        event_channel_capacity: 100,
    };
    StatusMonitor::new(provider, store, transport, catalog(), &config)
        .expect("monitor construction succeeds")
}

/// Drain every event currently queued
pub fn drain_events(rx: &mut mpsc::Receiver<MonitorEvent>) -> Vec<MonitorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// # Update Source Trait
//
// Defines the inbound side of the messaging platform: a stream of user
// commands and button presses for the `CommandRouter`.
//
// ## Implementations
//
// - Telegram `getUpdates` long polling: `statusrelay-telegram` crate
//
// ## Usage
//
// ```rust,ignore
// use statusrelay_core::UpdateSource;
// use tokio_stream::StreamExt;
//
// let source = /* UpdateSource implementation */;
// let mut events = source.watch();
// while let Some(event) = events.next().await {
//     router.handle(event).await;
// }
// ```

use std::pin::Pin;
use tokio_stream::Stream;

use crate::traits::message_transport::{ChatId, MessageId};
use crate::traits::subscriber_store::SubscriberId;

/// Slash commands understood by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `/start`: welcome text with the main menu
    Start,
    /// `/status`: fetch and show the current status
    Status,
    /// `/subscribe`: get notified when maintenance ends
    Subscribe,
    /// `/unsubscribe`: stop notifications
    Unsubscribe,
}

impl Command {
    /// Recognise a command from message text
    ///
    /// Matching is by prefix, so `/status@some_bot` and `/start payload` are
    /// accepted. Anything else yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_start();
        if text.starts_with("/start") {
            Some(Command::Start)
        } else if text.starts_with("/status") {
            Some(Command::Status)
        } else if text.starts_with("/subscribe") {
            Some(Command::Subscribe)
        } else if text.starts_with("/unsubscribe") {
            Some(Command::Unsubscribe)
        } else {
            None
        }
    }
}

/// Actions carried by inline buttons
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ButtonAction {
    /// Refresh the status in place
    CheckStatus,
    /// Subscribe the presser
    Subscribe,
    /// Unsubscribe the presser
    Unsubscribe,
    /// Callback data the router does not know
    Unknown(String),
}

impl ButtonAction {
    /// Callback data for [`ButtonAction::CheckStatus`]
    pub const CHECK_STATUS: &'static str = "check_status";
    /// Callback data for [`ButtonAction::Subscribe`]
    pub const SUBSCRIBE: &'static str = "subscribe";
    /// Callback data for [`ButtonAction::Unsubscribe`]
    pub const UNSUBSCRIBE: &'static str = "unsubscribe";

    /// Decode callback data
    pub fn from_callback_data(data: &str) -> Self {
        match data {
            Self::CHECK_STATUS => ButtonAction::CheckStatus,
            Self::SUBSCRIBE => ButtonAction::Subscribe,
            Self::UNSUBSCRIBE => ButtonAction::Unsubscribe,
            other => ButtonAction::Unknown(other.to_string()),
        }
    }
}

/// A discrete inbound event from the messaging platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A slash command typed in a chat
    Command {
        command: Command,
        /// Sender, if the platform reported one
        sender: Option<SubscriberId>,
        chat: ChatId,
    },

    /// An inline button press on one of the bot's messages
    ButtonPress {
        /// Platform id used to acknowledge the press
        callback_id: String,
        action: ButtonAction,
        sender: SubscriberId,
        /// Chat and message holding the pressed keyboard, if still available
        chat: Option<ChatId>,
        message_id: Option<MessageId>,
    },
}

/// Trait for inbound update sources
///
/// `watch()` returns a stream that yields each platform update at most
/// once, in arrival order. Transport errors are handled inside the source
/// (logged, then polling resumes); the stream itself only ends when the
/// source is torn down.
pub trait UpdateSource: Send + Sync {
    /// Stream of inbound events
    fn watch(&self) -> Pin<Box<dyn Stream<Item = InboundEvent> + Send + 'static>>;
}

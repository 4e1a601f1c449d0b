// # Message Transport Trait
//
// Defines the outbound side of the messaging platform: sending new messages,
// editing a previously sent message, and acknowledging button presses.
//
// ## Implementations
//
// - Telegram Bot API: `statusrelay-telegram` crate
//
// ## Usage
//
// ```rust,ignore
// use statusrelay_core::MessageTransport;
//
// let transport = /* MessageTransport implementation */;
// transport.send_message(12345, "*hello*", None).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Conversation identifier on the messaging platform
pub type ChatId = i64;

/// Identifier of a message inside a chat
pub type MessageId = i64;

/// A single inline button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    /// Label shown to the user
    pub text: String,
    /// Payload delivered back when the button is pressed
    pub callback_data: String,
}

impl InlineButton {
    /// Create a button
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Inline keyboard attached to a message
///
/// Serializes as `{"inline_keyboard": [[{"text": .., "callback_data": ..}]]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    #[serde(rename = "inline_keyboard")]
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// Build a keyboard with one button per row
    pub fn single_column(buttons: impl IntoIterator<Item = InlineButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }
}

/// Trait for outbound messaging implementations
///
/// Every method performs a single API call and reports failure as `Err`.
/// Implementations must not retry, batch or rate limit; callers decide
/// what a failure means (the dispatcher logs and moves on).
///
/// Implementations must be safe to call repeatedly and concurrently.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Send a new Markdown message, optionally with an inline keyboard
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), crate::Error>;

    /// Replace the text (and keyboard) of an existing message
    async fn edit_message(
        &self,
        chat: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), crate::Error>;

    /// Acknowledge a button press so the client stops showing a spinner
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>)
    -> Result<(), crate::Error>;

    /// Transport name (for logging)
    fn transport_name(&self) -> &'static str;
}

// Bot API wire types
//
// Only the fields the relay reads are declared; serde ignores the rest.

use serde::{Deserialize, Serialize};
use statusrelay_core::traits::{
    ButtonAction, ChatId, Command, InboundEvent, InlineKeyboard, MessageId, SubscriberId,
};

/// Response envelope shared by every Bot API method
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

/// One entry of a `getUpdates` result
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    /// Missing when the message is too old for the Bot API to return
    pub message: Option<Message>,
    pub data: Option<String>,
}

impl Update {
    /// Convert to a router event
    ///
    /// Returns `None` for updates the relay does not act on: plain text,
    /// unknown commands, edits, channel posts and so on.
    pub fn into_event(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            let action =
                ButtonAction::from_callback_data(query.data.as_deref().unwrap_or_default());
            return Some(InboundEvent::ButtonPress {
                callback_id: query.id,
                action,
                sender: SubscriberId::new(query.from.id),
                chat: query.message.as_ref().map(|m| m.chat.id),
                message_id: query.message.as_ref().map(|m| m.message_id),
            });
        }

        let message = self.message?;
        let command = Command::parse(message.text.as_deref()?)?;
        Some(InboundEvent::Command {
            command,
            sender: message.from.map(|user| SubscriberId::new(user.id)),
            chat: message.chat.id,
        })
    }
}

/// `sendMessage` parameters
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: ChatId,
    pub text: &'a str,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a InlineKeyboard>,
}

/// `editMessageText` parameters
#[derive(Debug, Serialize)]
pub struct EditMessageText<'a> {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: &'a str,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a InlineKeyboard>,
}

/// `answerCallbackQuery` parameters
#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery<'a> {
    pub callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

/// `getUpdates` parameters
#[derive(Debug, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

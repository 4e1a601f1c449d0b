// # Telegram Bot API Transport
//
// This crate connects the status relay to Telegram. One `TelegramClient`
// serves both directions:
//
// - **MessageTransport**: `sendMessage`, `editMessageText`, `answerCallbackQuery`
// - **UpdateSource**: `getUpdates` long polling, turned into router events
//
// ## Failure Model
//
// Every method call is single-shot. A non-2xx status or an `ok: false`
// envelope becomes `Error::Provider { provider: "telegram", .. }` carrying
// the Bot API's description; a request that never got a response becomes
// `Error::Transport`. The only retry is the update poll itself, which backs
// off and polls again after an error.
//
// ## Security Requirements
//
// - The bot token is part of every request URL and NEVER appears in logs
// - Transport errors are stripped of their URL before being reported
//
// ## API Reference
//
// - Bot API: https://core.telegram.org/bots/api
// - Requests: POST `{api_base}/bot{token}/{method}` with a JSON body

mod types;

pub use types::{CallbackQuery, Chat, Message, Update, User};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use statusrelay_core::config::TelegramConfig;
use statusrelay_core::traits::{
    ChatId, InboundEvent, InlineKeyboard, MessageId, MessageTransport, UpdateSource,
};
use statusrelay_core::{Error, Result};
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;
use types::{AnswerCallbackQuery, ApiResponse, EditMessageText, GetUpdates, SendMessage};

/// Formatting mode for every outgoing text
const PARSE_MODE: &str = "Markdown";

/// Update kinds requested from `getUpdates`
const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

/// Headroom added on top of the long-poll timeout for the HTTP timeout
const HTTP_TIMEOUT_HEADROOM: Duration = Duration::from_secs(5);

/// Telegram Bot API client
///
/// Cheap to clone; clones share the underlying connection pool.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the bot token.
#[derive(Clone)]
pub struct TelegramClient {
    /// Bot token
    /// ⚠️ NEVER log this value
    token: String,

    /// API base URL without trailing slash
    api_base: String,

    /// `getUpdates` long-poll timeout
    long_poll_timeout: Duration,

    /// Pause after a failed `getUpdates` call
    error_backoff: Duration,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the bot token
impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("long_poll_timeout", &self.long_poll_timeout)
            .field("error_backoff", &self.error_backoff)
            .finish()
    }
}

impl TelegramClient {
    /// Create a client from configuration
    ///
    /// The HTTP timeout is the long-poll timeout plus a few seconds, so a
    /// quiet `getUpdates` call completes before the request times out.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        config.validate()?;

        let long_poll_timeout = Duration::from_secs(config.long_poll_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(long_poll_timeout + HTTP_TIMEOUT_HEADROOM)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            token: config.bot_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            long_poll_timeout,
            error_backoff: Duration::from_secs(config.error_backoff_secs),
            client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Call one Bot API method and decode its result
    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(|e| {
                Error::transport(format!("{} request failed: {}", method, e.without_url()))
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            Error::provider(
                "telegram",
                format!("{} response unreadable: {}", method, e.without_url()),
            )
        })?;

        let envelope: ApiResponse<T> = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(Error::provider(
                    "telegram",
                    format!("{} returned an invalid response: {}", method, e),
                ));
            }
            Err(_) => {
                return Err(Error::provider(
                    "telegram",
                    format!("{} failed: HTTP {}", method, status),
                ));
            }
        };

        if !status.is_success() || !envelope.ok {
            let code = envelope.error_code.unwrap_or_else(|| i64::from(status.as_u16()));
            let description = envelope
                .description
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(Error::provider(
                "telegram",
                format!("{} failed ({}): {}", method, code, description),
            ));
        }

        envelope.result.ok_or_else(|| {
            Error::provider("telegram", format!("{} returned no result", method))
        })
    }

    /// Fetch pending updates starting at `offset`
    ///
    /// Blocks server-side for up to the long-poll timeout when nothing is
    /// pending.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let params = GetUpdates {
            offset,
            timeout: self.long_poll_timeout.as_secs(),
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call("getUpdates", &params).await
    }
}

/// The Bot API rejects empty texts; fail before the round trip
fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::invalid_input("Message text cannot be empty"));
    }
    Ok(())
}

#[async_trait]
impl MessageTransport for TelegramClient {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        ensure_text(text)?;
        let params = SendMessage {
            chat_id: chat,
            text,
            parse_mode: PARSE_MODE,
            reply_markup: keyboard,
        };
        let _: serde_json::Value = self.call("sendMessage", &params).await?;
        Ok(())
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        ensure_text(text)?;
        let params = EditMessageText {
            chat_id: chat,
            message_id,
            text,
            parse_mode: PARSE_MODE,
            reply_markup: keyboard,
        };
        match self.call::<_, serde_json::Value>("editMessageText", &params).await {
            Ok(_) => Ok(()),
            // Refreshing an unchanged status is not a failure
            Err(Error::Provider { message, .. }) if message.contains("message is not modified") => {
                tracing::debug!("Message {} in chat {} already up to date", message_id, chat);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let params = AnswerCallbackQuery {
            callback_query_id: callback_id,
            text,
        };
        let _: bool = self.call("answerCallbackQuery", &params).await?;
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "telegram"
    }
}

impl UpdateSource for TelegramClient {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = InboundEvent> + Send + 'static>> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let client = self.clone();

        tokio::spawn(async move {
            tracing::info!(
                "Starting Telegram update polling (timeout={:?})",
                client.long_poll_timeout
            );

            let mut offset: Option<i64> = None;

            loop {
                match client.get_updates(offset).await {
                    Ok(updates) => {
                        for update in updates {
                            // Acknowledge on the next poll, whether or not we act on it
                            offset = Some(update.update_id + 1);

                            let update_id = update.update_id;
                            match update.into_event() {
                                Some(event) => {
                                    if tx.send(event).is_err() {
                                        tracing::info!("Receiver dropped, stopping update polling");
                                        return;
                                    }
                                }
                                None => tracing::trace!("Skipping update {}", update_id),
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to poll updates: {}", e);
                        tokio::time::sleep(client.error_backoff).await;
                    }
                }

                if tx.is_closed() {
                    tracing::info!("Receiver dropped, stopping update polling");
                    return;
                }
            }
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

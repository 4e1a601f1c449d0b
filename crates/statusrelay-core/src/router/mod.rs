//! Command and callback router
//!
//! Turns inbound events into replies:
//!
//! | Event                       | Effect                                   |
//! |-----------------------------|------------------------------------------|
//! | `/start`                    | welcome text + main menu                 |
//! | `/status`                   | placeholder, fetch, report + refresh key |
//! | `/subscribe`, `/unsubscribe`| store mutation + confirmation            |
//! | button press                | acknowledge, then edit the menu message  |
//!
//! Events are handled one at a time in arrival order. Transport failures
//! are logged and never stop the loop.

use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::messages::{MessageCatalog, ReplyKind};
use crate::traits::{
    ButtonAction, ChatId, Command, InboundEvent, InlineKeyboard, MessageId, MessageTransport,
    StatusProvider, SubscriberId, SubscriberStore,
};

/// Stream of inbound events, as returned by `UpdateSource::watch()`
pub type InboundStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send + 'static>>;

/// Routes user commands and button presses
pub struct CommandRouter {
    store: Arc<dyn SubscriberStore>,
    provider: Arc<dyn StatusProvider>,
    transport: Arc<dyn MessageTransport>,
    messages: MessageCatalog,
}

impl CommandRouter {
    /// Create a router
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        provider: Arc<dyn StatusProvider>,
        transport: Arc<dyn MessageTransport>,
        messages: MessageCatalog,
    ) -> Self {
        Self {
            store,
            provider,
            transport,
            messages,
        }
    }

    /// Handle events until the stream ends
    pub async fn run(&self, events: InboundStream) {
        self.run_internal(events, None).await
    }

    /// Handle events until the stream ends or `shutdown_rx` fires
    pub async fn run_with_shutdown(
        &self,
        events: InboundStream,
        shutdown_rx: oneshot::Receiver<()>,
    ) {
        self.run_internal(events, Some(shutdown_rx)).await
    }

    async fn run_internal(
        &self,
        mut events: InboundStream,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) {
        info!("Starting command router");

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
            tokio::select! {
                event = events.next() => {
                    let Some(event) = event else {
                        info!("Update stream ended, stopping command router");
                        break;
                    };
                    if let Err(e) = self.handle(event).await {
                        warn!("Failed to handle update: {}", e);
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping command router");
                    break;
                }
            }
        }
    }

    /// Handle a single inbound event
    ///
    /// Store mutations happen before the reply is sent, so a failed reply
    /// never loses a subscription change.
    pub async fn handle(&self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Command {
                command,
                sender,
                chat,
            } => self.handle_command(command, sender, chat).await,
            InboundEvent::ButtonPress {
                callback_id,
                action,
                sender,
                chat,
                message_id,
            } => {
                self.handle_button(&callback_id, action, sender, chat, message_id)
                    .await
            }
        }
    }

    async fn handle_command(
        &self,
        command: Command,
        sender: Option<SubscriberId>,
        chat: ChatId,
    ) -> Result<()> {
        debug!("Command {:?} in chat {}", command, chat);

        match command {
            Command::Start => {
                let keyboard = MessageCatalog::main_keyboard();
                self.transport
                    .send_message(chat, &self.messages.welcome(), Some(&keyboard))
                    .await
            }
            Command::Status => {
                if let Err(e) = self
                    .transport
                    .send_message(chat, &self.messages.checking_status(), None)
                    .await
                {
                    warn!("Failed to send status placeholder to chat {}: {}", chat, e);
                }

                let report = self.status_report().await;
                let keyboard = MessageCatalog::refresh_keyboard();
                self.transport.send_message(chat, &report, Some(&keyboard)).await
            }
            Command::Subscribe | Command::Unsubscribe => {
                let Some(sender) = sender else {
                    debug!("Ignoring {:?} without a sender in chat {}", command, chat);
                    return Ok(());
                };
                let subscribe = command == Command::Subscribe;
                let text = self
                    .apply_subscription(subscribe, sender, ReplyKind::Command)
                    .await;
                self.transport.send_message(chat, &text, None).await
            }
        }
    }

    async fn handle_button(
        &self,
        callback_id: &str,
        action: ButtonAction,
        sender: SubscriberId,
        chat: Option<ChatId>,
        message_id: Option<MessageId>,
    ) -> Result<()> {
        if let Err(e) = self.transport.answer_callback(callback_id, None).await {
            warn!("Failed to answer callback {}: {}", callback_id, e);
        }

        match action {
            ButtonAction::CheckStatus => {
                let report = self.status_report().await;
                let keyboard = MessageCatalog::refresh_keyboard();
                self.edit(chat, message_id, &report, Some(&keyboard)).await
            }
            ButtonAction::Subscribe | ButtonAction::Unsubscribe => {
                let subscribe = action == ButtonAction::Subscribe;
                let text = self.apply_subscription(subscribe, sender, ReplyKind::Button).await;
                self.edit(chat, message_id, &text, None).await
            }
            ButtonAction::Unknown(data) => {
                debug!("Ignoring unknown callback data {:?}", data);
                Ok(())
            }
        }
    }

    /// Mutate the store and pick the matching reply text
    async fn apply_subscription(
        &self,
        subscribe: bool,
        sender: SubscriberId,
        kind: ReplyKind,
    ) -> String {
        if subscribe {
            if self.store.subscribe(sender).await {
                info!("User {} subscribed", sender);
                self.messages.subscribed(kind)
            } else {
                self.messages.already_subscribed(kind)
            }
        } else if self.store.unsubscribe(sender).await {
            info!("User {} unsubscribed", sender);
            self.messages.unsubscribed(kind)
        } else {
            self.messages.not_subscribed(kind)
        }
    }

    /// Fetch the current status and render it
    async fn status_report(&self) -> String {
        let document = match self.provider.fetch().await {
            Ok(document) => Some(document),
            Err(e) => {
                warn!("Error fetching status for user request: {}", e);
                None
            }
        };
        let refreshed_at = chrono::Local::now().naive_local();
        self.messages.status_report(document.as_ref(), refreshed_at)
    }

    async fn edit(
        &self,
        chat: Option<ChatId>,
        message_id: Option<MessageId>,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        match (chat, message_id) {
            (Some(chat), Some(message_id)) => {
                self.transport.edit_message(chat, message_id, text, keyboard).await
            }
            _ => {
                debug!("Button press without an editable message, skipping reply");
                Ok(())
            }
        }
    }
}

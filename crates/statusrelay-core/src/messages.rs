//! User-facing message texts and keyboards
//!
//! All texts use Telegram-flavoured Markdown (`*bold*`).

use chrono::NaiveDateTime;

use crate::traits::{ButtonAction, InlineButton, InlineKeyboard, StatusDocument, parse_timestamp};

/// Reply shown when the status endpoint cannot be reached
pub const FETCH_FAILED: &str = "❌ Unable to fetch status. Please try again later.";

/// Characters that open or close Markdown entities
///
/// A service name containing one of these would leave an unbalanced entity
/// in every text, and Telegram rejects the whole message.
pub const MARKDOWN_RESERVED: &[char] = &['_', '*', '`', '[', ']'];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where a reply is going
///
/// Button replies edit the menu message in place and carry an extra hint,
/// since the user no longer sees the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Command,
    Button,
}

/// Message texts for one monitored service
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    service_name: String,
}

impl MessageCatalog {
    /// Create a catalog for the named service
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Name of the monitored service
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// `/start` greeting
    pub fn welcome(&self) -> String {
        let s = &self.service_name;
        format!(
            "👋 *Welcome to {s} Status Bot!*\n\n\
             I monitor {s}'s maintenance status and can notify you when it becomes active.\n\n\
             *Commands:*\n\
             • /status - Check current status\n\
             • /subscribe - Get notified when {s} is active\n\
             • /unsubscribe - Stop receiving notifications\n\n\
             Choose an option below:"
        )
    }

    /// Placeholder sent while a `/status` fetch is in flight
    pub fn checking_status(&self) -> String {
        format!("🔄 Checking {} status...", self.service_name)
    }

    /// Broadcast sent to subscribers when maintenance ends
    pub fn maintenance_ended(&self) -> String {
        let s = &self.service_name;
        format!(
            "🟢 *{} IS NOW ACTIVE!*\n\n\
             Maintenance has ended. {s} is now available for use.\n\n\
             Use /status to check the current status.",
            s.to_uppercase()
        )
    }

    /// Render a status report
    ///
    /// `None` means the fetch failed. `refreshed_at` is the local time the
    /// document was fetched.
    pub fn status_report(
        &self,
        document: Option<&StatusDocument>,
        refreshed_at: NaiveDateTime,
    ) -> String {
        let Some(document) = document else {
            return FETCH_FAILED.to_string();
        };

        let updated = render_timestamp(document.updated_at());

        let (emoji, status_text, maintenance_info) = if document.is_maintenance() {
            let info = document
                .last_maintenance()
                .map(|last| {
                    format!(
                        "\n\n📋 *Last Maintenance:*\n• Duration: {:.1} minutes\n• Started: {}",
                        last.duration_minutes(),
                        render_timestamp(last.started_at.as_deref())
                    )
                })
                .unwrap_or_default();
            ("🔴", "INACTIVE (Maintenance Mode)", info)
        } else {
            ("🟢", "ACTIVE (No Maintenance)", String::new())
        };

        format!(
            "{emoji} *{} Status*\n\n\
             *Status:* {status_text}\n\
             *Last Updated:* {updated}{maintenance_info}\n\n\
             🕐 *Last Refreshed:* {}",
            self.service_name,
            refreshed_at.format(TIMESTAMP_FORMAT)
        )
    }

    /// Confirmation after a successful subscribe
    pub fn subscribed(&self, kind: ReplyKind) -> String {
        let base = format!(
            "🔔 *Subscribed!*\n\n\
             You'll receive a notification as soon as {} becomes active (maintenance ends).\n\n\
             Use /unsubscribe to stop notifications.",
            self.service_name
        );
        match kind {
            ReplyKind::Command => base,
            ReplyKind::Button => format!("{base}\nUse /status to check current status."),
        }
    }

    /// Reply when the user was already subscribed
    pub fn already_subscribed(&self, kind: ReplyKind) -> String {
        let base = "✅ You're already subscribed to notifications!";
        match kind {
            ReplyKind::Command => base.to_string(),
            ReplyKind::Button => format!("{base}\n\nUse /status to check current status."),
        }
    }

    /// Confirmation after a successful unsubscribe
    pub fn unsubscribed(&self, kind: ReplyKind) -> String {
        let base = "🔕 You've been unsubscribed from notifications.";
        match kind {
            ReplyKind::Command => base.to_string(),
            ReplyKind::Button => format!("{base}\n\nUse /subscribe to subscribe again."),
        }
    }

    /// Reply when the user was not subscribed
    pub fn not_subscribed(&self, kind: ReplyKind) -> String {
        let base = "ℹ️ You weren't subscribed to notifications.";
        match kind {
            ReplyKind::Command => base.to_string(),
            ReplyKind::Button => format!("{base}\n\nUse /subscribe to subscribe."),
        }
    }

    /// Main menu: check, subscribe, unsubscribe
    pub fn main_keyboard() -> InlineKeyboard {
        InlineKeyboard::single_column([
            InlineButton::new("📊 Check Status", ButtonAction::CHECK_STATUS),
            InlineButton::new("🔔 Get Notified", ButtonAction::SUBSCRIBE),
            InlineButton::new("🔕 Stop Notifications", ButtonAction::UNSUBSCRIBE),
        ])
    }

    /// Single refresh button under a status report
    pub fn refresh_keyboard() -> InlineKeyboard {
        InlineKeyboard::single_column([InlineButton::new("🔄 Refresh", ButtonAction::CHECK_STATUS)])
    }
}

/// Render a reported timestamp as UTC, falling back to the raw text
fn render_timestamp(raw: Option<&str>) -> String {
    match raw {
        Some(raw) => match parse_timestamp(raw) {
            Some(dt) => format!("{} UTC", dt.format(TIMESTAMP_FORMAT)),
            None => raw.to_string(),
        },
        None => "Unknown".to_string(),
    }
}

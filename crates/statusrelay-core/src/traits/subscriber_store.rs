// # Subscriber Store Trait
//
// Defines the interface for the set of users who asked to be notified when
// maintenance ends.
//
// ## Purpose
//
// - Membership is a set: subscribing twice keeps one record
// - Every change is flushed to durable storage immediately
// - A failed flush is logged and the in-memory change is kept
//
// ## Implementations
//
// - File-based: JSON array of ids (`FileSubscriberStore`)
// - In-memory: `MemorySubscriberStore`
//
// ## Usage
//
// ```rust,ignore
// use statusrelay_core::{SubscriberId, SubscriberStore};
//
// let store = /* SubscriberStore implementation */;
// let added = store.subscribe(SubscriberId::new(42)).await;
// assert!(store.contains(SubscriberId::new(42)).await);
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::traits::message_transport::ChatId;

/// Identity of a subscriber (the messaging platform user id)
///
/// Serialized as a bare integer so the durable file is a plain JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(i64);

impl SubscriberId {
    /// Wrap a raw platform user id
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw id
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Private chat with this user
    ///
    /// On the messaging platform a user's id doubles as the id of their
    /// private chat with the bot, which is where notifications go.
    pub const fn chat_id(self) -> ChatId {
        self.0
    }
}

impl From<i64> for SubscriberId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for subscriber store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently. A mutation and the flush
/// that follows it form one critical section, so two concurrent mutations
/// can never persist an interleaved view.
///
/// # Failure Model
///
/// Mutations never fail from the caller's point of view. If persisting the
/// new set fails, the implementation logs the error and keeps the in-memory
/// change; durable state catches up on the next successful flush.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Add a subscriber
    ///
    /// Returns `true` if the id was not already subscribed. Only an actual
    /// change triggers a flush.
    async fn subscribe(&self, id: SubscriberId) -> bool;

    /// Remove a subscriber
    ///
    /// Returns `true` if the id was subscribed.
    async fn unsubscribe(&self, id: SubscriberId) -> bool;

    /// Check membership
    async fn contains(&self, id: SubscriberId) -> bool;

    /// Snapshot of all subscribers, in no particular order
    async fn all(&self) -> Vec<SubscriberId>;

    /// Number of subscribers
    async fn len(&self) -> usize {
        self.all().await.len()
    }

    /// Persist the current set
    ///
    /// Mutations already flush; this is for callers that want an explicit
    /// write and want to see its error.
    async fn flush(&self) -> Result<(), crate::Error>;
}

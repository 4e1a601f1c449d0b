// # Memory Subscriber Store
//
// In-memory implementation of SubscriberStore.
//
// ## Purpose
//
// A store that does not persist across restarts. Useful for testing and
// for deployments where losing subscriptions on restart is acceptable.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::subscriber_store::{SubscriberId, SubscriberStore};

/// In-memory subscriber store
///
/// Cloning shares the underlying set.
#[derive(Debug, Clone, Default)]
pub struct MemorySubscriberStore {
    inner: Arc<RwLock<HashSet<SubscriberId>>>,
}

impl MemorySubscriberStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with subscribers
    pub fn with_subscribers(ids: impl IntoIterator<Item = SubscriberId>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ids.into_iter().collect())),
        }
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl SubscriberStore for MemorySubscriberStore {
    async fn subscribe(&self, id: SubscriberId) -> bool {
        self.inner.write().await.insert(id)
    }

    async fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.inner.write().await.remove(&id)
    }

    async fn contains(&self, id: SubscriberId) -> bool {
        self.inner.read().await.contains(&id)
    }

    async fn all(&self) -> Vec<SubscriberId> {
        self.inner.read().await.iter().copied().collect()
    }

    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing to persist
        Ok(())
    }
}

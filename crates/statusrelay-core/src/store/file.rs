// # File Subscriber Store
//
// File-based implementation of SubscriberStore with crash recovery.
//
// ## Purpose
//
// Keeps the subscriber set across daemon restarts and crashes.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Automatic backup: Keeps .backup of the previous file
// - Recovery: Falls back to the backup if the main file is unreadable
// - Last resort: Starts empty (logged), never fails startup
//
// ## File Format
//
// A plain JSON array of user ids, sorted:
//
// ```json
// [1234567, 7654321]
// ```

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::traits::subscriber_store::{SubscriberId, SubscriberStore};

/// File-based subscriber store with crash recovery
///
/// The whole set is rewritten after every change. Mutation and write
/// happen under one lock, so the file always reflects some complete
/// sequence of mutations.
///
/// # Example
///
/// ```rust,no_run
/// use statusrelay_core::store::FileSubscriberStore;
/// use statusrelay_core::traits::{SubscriberId, SubscriberStore};
///
/// #[tokio::main]
/// async fn main() {
///     let store = FileSubscriberStore::open("/var/lib/statusrelay/subscribers.json").await;
///
///     // Written to disk before returning
///     store.subscribe(SubscriberId::new(42)).await;
///     assert!(store.contains(SubscriberId::new(42)).await);
/// }
/// ```
#[derive(Debug)]
pub struct FileSubscriberStore {
    path: PathBuf,
    subscribers: Mutex<HashSet<SubscriberId>>,
}

impl FileSubscriberStore {
    /// Open or create a file subscriber store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Load the existing file
    /// 3. If it is unreadable or corrupted, load the backup
    /// 4. If both fail, start with an empty set
    ///
    /// Problems are logged; opening never fails.
    pub async fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
            && let Err(e) = fs::create_dir_all(parent).await
        {
            tracing::error!(
                "Failed to create subscriber directory {}: {}",
                parent.display(),
                e
            );
        }

        let subscribers = Self::load_with_recovery(&path).await;
        tracing::info!("Loaded {} subscriber(s) from {}", subscribers.len(), path.display());

        Self {
            path,
            subscribers: Mutex::new(subscribers),
        }
    }

    /// Path of the subscriber file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the subscriber set with automatic recovery
    async fn load_with_recovery(path: &Path) -> HashSet<SubscriberId> {
        let e = match Self::load(path).await {
            Ok(subscribers) => return subscribers,
            Err(e) => e,
        };

        tracing::warn!("Subscriber file is unusable: {}. Attempting recovery from backup.", e);

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with no subscribers.");
            return HashSet::new();
        }

        match Self::load(&backup_path).await {
            Ok(subscribers) => {
                tracing::info!("Recovered {} subscriber(s) from backup", subscribers.len());
                if let Err(restore_err) = fs::copy(&backup_path, path).await {
                    tracing::error!(
                        "Failed to restore subscriber file from backup: {}",
                        restore_err
                    );
                }
                subscribers
            }
            Err(backup_err) => {
                tracing::error!(
                    "Backup also unusable: {}. Starting with no subscribers.",
                    backup_err
                );
                HashSet::new()
            }
        }
    }

    /// Load the subscriber set from a file
    ///
    /// A missing file is an empty set, not an error.
    async fn load(path: &Path) -> Result<HashSet<SubscriberId>, Error> {
        if !path.exists() {
            tracing::debug!("Subscriber file does not exist: {}", path.display());
            return Ok(HashSet::new());
        }

        let content = fs::read(path).await.map_err(|e| {
            Error::store(format!(
                "Failed to read subscriber file {}: {}",
                path.display(),
                e
            ))
        })?;

        let ids: Vec<SubscriberId> = serde_json::from_slice(&content).map_err(|e| {
            Error::store(format!(
                "Failed to parse subscriber file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(ids.into_iter().collect())
    }

    /// Write the set to disk atomically
    ///
    /// The caller holds the set's lock.
    async fn write(&self, subscribers: &HashSet<SubscriberId>) -> Result<(), Error> {
        let mut ids: Vec<SubscriberId> = subscribers.iter().copied().collect();
        ids.sort_unstable();

        let json = serde_json::to_vec(&ids)
            .map_err(|e| Error::store(format!("Failed to serialize subscribers: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(&json).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Subscribers written to file: {}", self.path.display());
        Ok(())
    }

    /// Write after a mutation; failures are logged, never propagated
    async fn persist(&self, subscribers: &HashSet<SubscriberId>) {
        if let Err(e) = self.write(subscribers).await {
            tracing::error!(
                "Failed to save subscribers ({} in memory): {}",
                subscribers.len(),
                e
            );
        }
    }

    fn temp_path(&self) -> PathBuf {
        with_suffix(&self.path, ".tmp")
    }

    fn backup_path(path: &Path) -> PathBuf {
        with_suffix(path, ".backup")
    }
}

/// `subscribers.json` -> `subscribers.json.tmp`
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[async_trait]
impl SubscriberStore for FileSubscriberStore {
    async fn subscribe(&self, id: SubscriberId) -> bool {
        let mut guard = self.subscribers.lock().await;
        if !guard.insert(id) {
            return false;
        }
        self.persist(&guard).await;
        true
    }

    async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut guard = self.subscribers.lock().await;
        if !guard.remove(&id) {
            return false;
        }
        self.persist(&guard).await;
        true
    }

    async fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.lock().await.contains(&id)
    }

    async fn all(&self) -> Vec<SubscriberId> {
        self.subscribers.lock().await.iter().copied().collect()
    }

    async fn len(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    async fn flush(&self) -> Result<(), Error> {
        let guard = self.subscribers.lock().await;
        self.write(&guard).await
    }
}

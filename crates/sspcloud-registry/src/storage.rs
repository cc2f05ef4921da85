//! Storage area abstraction
//!
//! Mirrors the extension's local storage area: a flat JSON object keyed by
//! setting name, plus a change stream naming the keys that changed.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sspcloud_core::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Capacity of the change broadcast channel
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Notification that some keys of the storage area changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub keys: Vec<String>,
}

impl StorageChange {
    pub fn touches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// Trait for a key/value storage area (allows swapping the backend in tests)
#[async_trait]
pub trait StorageArea: Send + Sync {
    /// Read the given keys; missing keys are absent from the result
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    /// Read the whole area
    async fn get_all(&self) -> Result<Map<String, Value>>;

    /// Write entries, notifying subscribers of the keys whose value changed
    async fn set(&self, items: Map<String, Value>) -> Result<()>;

    /// Delete entries
    async fn remove(&self, keys: &[&str]) -> Result<()>;

    /// Subscribe to change notifications
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

#[async_trait]
impl<S: StorageArea + ?Sized> StorageArea for Arc<S> {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        (**self).get(keys).await
    }

    async fn get_all(&self) -> Result<Map<String, Value>> {
        (**self).get_all().await
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        (**self).set(items).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        (**self).remove(keys).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        (**self).subscribe()
    }
}

#[async_trait]
impl<S: StorageArea + ?Sized> StorageArea for &S {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        (**self).get(keys).await
    }

    async fn get_all(&self) -> Result<Map<String, Value>> {
        (**self).get_all().await
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        (**self).set(items).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        (**self).remove(keys).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        (**self).subscribe()
    }
}

/// Keys of `items` whose value differs from `current`
pub(crate) fn changed_keys(current: &Map<String, Value>, items: &Map<String, Value>) -> Vec<String> {
    items
        .iter()
        .filter(|(key, value)| current.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Keys that differ in any way between two snapshots
pub(crate) fn diff_snapshots(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<String> {
    let mut keys = changed_keys(old, new);
    keys.extend(old.keys().filter(|k| !new.contains_key(*k)).cloned());
    keys.sort();
    keys
}

/// Pick the requested keys out of a snapshot
pub(crate) fn select(snapshot: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| snapshot.get(*key).map(|v| (key.to_string(), v.clone())))
        .collect()
}

/// In-memory storage area
#[derive(Clone)]
pub struct MemoryStorage {
    data: Arc<RwLock<Map<String, Value>>>,
    changes: broadcast::Sender<StorageChange>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_snapshot(Map::new())
    }

    /// Create a storage area pre-filled with a JSON object
    pub fn with_snapshot(snapshot: Map<String, Value>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            data: Arc::new(RwLock::new(snapshot)),
            changes,
        }
    }

    fn notify(&self, keys: Vec<String>) {
        if keys.is_empty() {
            return;
        }
        debug!("Storage keys changed: {:?}", keys);
        // No subscribers is fine
        let _ = self.changes.send(StorageChange { keys });
    }
}

#[async_trait]
impl StorageArea for MemoryStorage {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        Ok(select(&*self.data.read().await, keys))
    }

    async fn get_all(&self) -> Result<Map<String, Value>> {
        Ok(self.data.read().await.clone())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let changed = {
            let mut data = self.data.write().await;
            let changed = changed_keys(&data, &items);
            data.extend(items);
            changed
        };
        self.notify(changed);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut removed = Vec::new();
        {
            let mut data = self.data.write().await;
            for key in keys {
                if data.remove(*key).is_some() {
                    removed.push(key.to_string());
                }
            }
        }
        self.notify(removed);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

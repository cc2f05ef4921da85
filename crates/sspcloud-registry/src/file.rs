//! JSON-file backed storage area
//!
//! The whole area is one pretty-printed JSON object. Writes go through a
//! temporary file in the same directory and a rename, so readers never see a
//! half-written file. `watch` picks up edits made by other processes.

use async_trait::async_trait;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::{Map, Value};
use sspcloud_core::{LaunchError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::storage::{
    changed_keys, diff_snapshots, select, StorageArea, StorageChange, CHANGE_CHANNEL_CAPACITY,
};

/// Storage area persisted in a JSON file
#[derive(Clone)]
pub struct FileStorage {
    path: PathBuf,
    cache: Arc<RwLock<Map<String, Value>>>,
    /// Serializes file writes and watcher reloads
    write_lock: Arc<Mutex<()>>,
    changes: broadcast::Sender<StorageChange>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file
    ///
    /// The parent directory is created; a missing file reads as empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        tokio::fs::create_dir_all(parent_dir(&path)).await?;
        let snapshot = read_snapshot(&path).await?;
        debug!("Opened storage {} ({} keys)", path.display(), snapshot.len());

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            cache: Arc::new(RwLock::new(snapshot)),
            write_lock: Arc::new(Mutex::new(())),
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn notify(&self, keys: Vec<String>) {
        if keys.is_empty() {
            return;
        }
        debug!("Storage keys changed: {:?}", keys);
        let _ = self.changes.send(StorageChange { keys });
    }

    /// Write `next` to disk then make it the cached snapshot
    async fn commit(&self, next: Map<String, Value>, changed: Vec<String>) -> Result<()> {
        if changed.is_empty() {
            return Ok(());
        }
        write_json_atomic(&self.path, &Value::Object(next.clone())).await?;
        *self.cache.write().await = next;
        self.notify(changed);
        Ok(())
    }

    /// Re-read the file and broadcast the keys that differ from the cache
    async fn reload(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let fresh = read_snapshot(&self.path).await?;
        let changed = {
            let mut cache = self.cache.write().await;
            let changed = diff_snapshots(&cache, &fresh);
            *cache = fresh;
            changed
        };
        if !changed.is_empty() {
            info!("External edit of {}: {:?}", self.path.display(), changed);
        }
        self.notify(changed);
        Ok(())
    }

    /// Watch the file for edits made outside this handle
    ///
    /// Dropping the returned watcher stops watching.
    pub fn watch(&self) -> Result<StorageWatcher> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<()>();
        let file_name = self.path.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if ours && event_tx.send(()).is_err() {
                        debug!("Storage watcher channel closed");
                    }
                }
                Err(e) => error!("Storage watcher error: {}", e),
            },
            Config::default(),
        )
        .map_err(|e| LaunchError::Watcher(e.to_string()))?;

        watcher
            .watch(parent_dir(&self.path), RecursiveMode::NonRecursive)
            .map_err(|e| LaunchError::Watcher(e.to_string()))?;
        info!("Watching storage file {}", self.path.display());

        let storage = self.clone();
        let task = tokio::spawn(async move {
            while event_rx.recv().await.is_some() {
                // Coalesce bursts (temp file write + rename)
                while event_rx.try_recv().is_ok() {}
                if let Err(e) = storage.reload().await {
                    warn!("Failed to reload {}: {}", storage.path.display(), e);
                }
            }
        });

        Ok(StorageWatcher {
            _watcher: watcher,
            task,
        })
    }
}

/// Live filesystem watch on a `FileStorage`
pub struct StorageWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for StorageWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl StorageArea for FileStorage {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        Ok(select(&*self.cache.read().await, keys))
    }

    async fn get_all(&self) -> Result<Map<String, Value>> {
        Ok(self.cache.read().await.clone())
    }

    #[instrument(skip(self, items), fields(path = %self.path.display()))]
    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let (next, changed) = {
            let cache = self.cache.read().await;
            let changed = changed_keys(&cache, &items);
            let mut next = cache.clone();
            next.extend(items);
            (next, changed)
        };
        self.commit(next, changed).await
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let (next, changed) = {
            let cache = self.cache.read().await;
            let mut next = cache.clone();
            let changed = keys
                .iter()
                .filter(|key| cache.contains_key(**key))
                .map(|key| key.to_string())
                .collect::<Vec<_>>();
            for key in &changed {
                next.remove(key);
            }
            (next, changed)
        };
        self.commit(next, changed).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

async fn read_snapshot(path: &Path) -> Result<Map<String, Value>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map),
        other => Err(LaunchError::Storage(format!(
            "{} does not hold a JSON object (found {})",
            path.display(),
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write pretty JSON through a temp file and rename
pub(crate) async fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(parent_dir(&path))?;
        tmp.write_all(content.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| LaunchError::Io(e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| LaunchError::Other(format!("storage write task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn entries(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path().join("nested/storage.json"))
            .await
            .unwrap();
        assert!(storage.get_all().await.unwrap().is_empty());
        assert!(dir.path().join("nested").is_dir());
    }

    #[tokio::test]
    async fn test_set_persists_and_reopens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let storage = FileStorage::open(&path).await.unwrap();
        storage
            .set(entries(json!({"version": "3.0.0", "forges": []})))
            .await
            .unwrap();

        let reopened = FileStorage::open(&path).await.unwrap();
        assert_eq!(
            reopened.get(&["version"]).await.unwrap(),
            entries(json!({"version": "3.0.0"}))
        );
    }

    #[tokio::test]
    async fn test_remove_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let storage = FileStorage::open(&path).await.unwrap();
        storage.set(entries(json!({"a": 1, "b": 2}))).await.unwrap();

        let mut changes = storage.subscribe();
        storage.remove(&["a"]).await.unwrap();
        assert_eq!(changes.recv().await.unwrap().keys, vec!["a".to_string()]);

        let reopened = FileStorage::open(&path).await.unwrap();
        assert_eq!(reopened.get_all().await.unwrap(), entries(json!({"b": 2})));
    }

    #[tokio::test]
    async fn test_rejects_non_object_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let result = FileStorage::open(&path).await;
        assert!(matches!(result, Err(LaunchError::Storage(_))));
    }

    #[tokio::test]
    async fn test_reload_broadcasts_external_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let storage = FileStorage::open(&path).await.unwrap();
        storage.set(entries(json!({"a": 1}))).await.unwrap();

        let mut changes = storage.subscribe();
        std::fs::write(&path, r#"{"a": 1, "forges": []}"#).unwrap();
        storage.reload().await.unwrap();

        assert_eq!(changes.recv().await.unwrap().keys, vec!["forges".to_string()]);

        // Reloading an unchanged file is silent
        storage.reload().await.unwrap();
        assert!(changes.try_recv().is_err());
    }
}

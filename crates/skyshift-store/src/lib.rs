//! An in-process, ordered key-value store with revisioned writes and a
//! prefix-scoped watch primitive, modeled on the etcd semantics the
//! original control plane relied on (see `ETCDClient` in the Python
//! source this crate's behavior is grounded on).

mod watch;

pub use watch::{Notification, WatchStream, Watcher};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use snafu::Snafu;
use tokio::sync::{broadcast, RwLock};

use skyshift_types::watch::WatchEventType;

const WATCH_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Snafu)]
pub enum StoreError {
    #[snafu(display("key '{key}' not found"))]
    NotFound { key: String },

    #[snafu(display("resource_version conflict on '{key}': expected {expected}, store has {actual}"))]
    Conflict { key: String, expected: i64, actual: i64 },

    #[snafu(display("failed to (de)serialize value for key '{key}': {source}"))]
    Codec { key: String, source: serde_json::Error },
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// A stored value together with the revision it was last written at.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: serde_json::Value,
    pub revision: i64,
}

struct Inner {
    data: RwLock<BTreeMap<String, Entry>>,
    revision: AtomicI64,
    watch_tx: broadcast::Sender<Notification>,
}

/// An ordered, in-memory key-value store shared across the API server.
///
/// Every write is assigned a monotonically increasing global revision.
/// `compare_and_put` gives optimistic concurrency control on top of plain
/// `put`; `watch` exposes a live stream of ADD/UPDATE/DELETE events for any
/// key under a prefix, mirroring `etcd`'s `watch_prefix`.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        let (watch_tx, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                data: RwLock::new(BTreeMap::new()),
                revision: AtomicI64::new(0),
                watch_tx,
            }),
        }
    }

    fn next_revision(&self) -> i64 {
        self.inner.revision.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn notify(&self, event_type: WatchEventType, entry: Entry) {
        // No receivers is the common case (no active watches); a send
        // error there is expected and not a fault.
        let _ = self.inner.watch_tx.send(Notification { event_type, entry });
    }

    /// Unconditionally write `value` at `key`. A PUT whose resulting
    /// revision is 1 (the key did not exist before) is reported to
    /// watchers as ADD; any later PUT is reported as UPDATE.
    pub async fn put(&self, key: &str, value: serde_json::Value) -> Result<Entry> {
        let revision = self.next_revision();
        let entry = Entry { key: key.to_string(), value, revision };
        let is_add = {
            let mut data = self.inner.data.write().await;
            let is_add = !data.contains_key(key);
            data.insert(key.to_string(), entry.clone());
            is_add
        };
        let event_type = if is_add { WatchEventType::Add } else { WatchEventType::Update };
        self.notify(event_type, entry.clone());
        Ok(entry)
    }

    /// Write `value` at `key` only if the stored revision equals
    /// `expected_revision`. Mirrors the etcd transaction the original
    /// client used when a caller supplied an explicit resource version.
    pub async fn compare_and_put(
        &self,
        key: &str,
        value: serde_json::Value,
        expected_revision: i64,
    ) -> Result<Entry> {
        let mut data = self.inner.data.write().await;
        let actual = data.get(key).map_or(0, |e| e.revision);
        if actual != expected_revision {
            return Err(StoreError::Conflict { key: key.to_string(), expected: expected_revision, actual });
        }
        let revision = self.next_revision();
        let entry = Entry { key: key.to_string(), value, revision };
        let is_add = actual == 0;
        data.insert(key.to_string(), entry.clone());
        drop(data);
        let event_type = if is_add { WatchEventType::Add } else { WatchEventType::Update };
        self.notify(event_type, entry.clone());
        Ok(entry)
    }

    pub async fn get(&self, key: &str) -> Option<Entry> {
        self.inner.data.read().await.get(key).cloned()
    }

    /// All entries whose key starts with `prefix`, in key order.
    pub async fn range(&self, prefix: &str) -> Vec<Entry> {
        self.inner
            .data
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub async fn delete(&self, key: &str) -> Option<Entry> {
        let removed = self.inner.data.write().await.remove(key);
        if let Some(entry) = &removed {
            self.notify(WatchEventType::Delete, entry.clone());
        }
        removed
    }

    /// Remove every key under `prefix`, returning the removed entries.
    pub async fn delete_range(&self, prefix: &str) -> Vec<Entry> {
        let removed: Vec<Entry> = {
            let mut data = self.inner.data.write().await;
            let keys: Vec<String> = data
                .range(prefix.to_string()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .map(|(k, _)| k.clone())
                .collect();
            keys.iter().filter_map(|k| data.remove(k)).collect()
        };
        for entry in &removed {
            self.notify(WatchEventType::Delete, entry.clone());
        }
        removed
    }

    /// Remove every key in the store. Used by tests and by the bootstrap
    /// reset path.
    pub async fn delete_all(&self) -> Vec<Entry> {
        self.delete_range("").await
    }

    /// Subscribe to ADD/UPDATE/DELETE events for keys under `prefix`.
    pub fn watch(&self, prefix: &str) -> Watcher {
        Watcher::for_prefix(self.inner.watch_tx.subscribe(), prefix.to_string())
    }

    /// Subscribe to ADD/UPDATE/DELETE events for exactly one key.
    pub fn watch_key(&self, key: &str) -> Watcher {
        Watcher::for_key(self.inner.watch_tx.subscribe(), key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_assigns_increasing_revisions() {
        let store = Store::new();
        let a = store.put("a", json!({"x": 1})).await.unwrap();
        let b = store.put("b", json!({"x": 2})).await.unwrap();
        assert!(b.revision > a.revision);
    }

    #[tokio::test]
    async fn first_write_is_add_second_is_update() {
        let store = Store::new();
        let mut watcher = store.watch("a");
        store.put("a", json!({"x": 1})).await.unwrap();
        store.put("a", json!({"x": 2})).await.unwrap();
        let first = watcher.next().await.unwrap();
        let second = watcher.next().await.unwrap();
        assert_eq!(first.event_type, WatchEventType::Add);
        assert_eq!(second.event_type, WatchEventType::Update);
    }

    #[tokio::test]
    async fn compare_and_put_rejects_stale_revision() {
        let store = Store::new();
        let entry = store.put("a", json!({"x": 1})).await.unwrap();
        let err = store
            .compare_and_put("a", json!({"x": 2}), entry.revision - 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn range_returns_only_matching_prefix() {
        let store = Store::new();
        store.put("jobs/default/a", json!({})).await.unwrap();
        store.put("jobs/default/b", json!({})).await.unwrap();
        store.put("clusters/c1", json!({})).await.unwrap();
        let jobs = store.range("jobs/").await;
        assert_eq!(jobs.len(), 2);
    }

    #[tokio::test]
    async fn delete_reports_prev_value_and_watchers_see_delete() {
        let store = Store::new();
        store.put("a", json!({"x": 1})).await.unwrap();
        let mut watcher = store.watch("a");
        let _ = watcher.next().await; // drain the ADD
        let deleted = store.delete("a").await.unwrap();
        assert_eq!(deleted.value, json!({"x": 1}));
        let event = watcher.next().await.unwrap();
        assert_eq!(event.event_type, WatchEventType::Delete);
    }

    #[tokio::test]
    async fn watch_only_sees_its_own_prefix() {
        let store = Store::new();
        let mut watcher = store.watch("jobs/");
        store.put("clusters/c1", json!({})).await.unwrap();
        store.put("jobs/default/a", json!({})).await.unwrap();
        let event = watcher.next().await.unwrap();
        assert_eq!(event.entry.key, "jobs/default/a");
    }
}

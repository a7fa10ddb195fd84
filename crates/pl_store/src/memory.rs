//! In-memory document store for tests and simulation.
//!
//! Clones share state through an inner Arc, so one store instance can back
//! every adapter in a test. Permission failures can be injected per path
//! prefix to exercise the authorization-denied paths without a real
//! backend.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    document::{split_doc_path, CollectionSnapshot, Document, DocumentStore, WatchHandle},
    error::StoreError,
};

#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    /// collection path → document id → document
    collections: BTreeMap<String, BTreeMap<String, Document>>,
    next_seq: u64,
    watchers: HashMap<String, Vec<Watcher>>,
    next_watcher_id: u64,
    denied_prefixes: Vec<String>,
}

struct Watcher {
    id: u64,
    tx: mpsc::UnboundedSender<CollectionSnapshot>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation under `prefix` fail with `PermissionDenied`,
    /// simulating stale credentials or restrictive backend rules.
    pub fn deny_prefix(&self, prefix: impl Into<String>) {
        self.lock().denied_prefixes.push(prefix.into());
    }

    pub fn clear_denials(&self) {
        self.lock().denied_prefixes.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a test already panicked; propagating the
        // panic here is acceptable for an in-memory test store.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Inner {
    fn check_access(&self, path: &str) -> Result<(), StoreError> {
        if self.denied_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return Err(StoreError::PermissionDenied(format!(
                "Missing or insufficient permissions for {path}"
            )));
        }
        Ok(())
    }

    fn snapshot(&self, collection: &str) -> CollectionSnapshot {
        let mut docs: Vec<Document> = self
            .collections
            .get(collection)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by_key(|d| d.seq);
        CollectionSnapshot { docs }
    }

    fn notify(&mut self, collection: &str) {
        let snapshot = self.snapshot(collection);
        if let Some(watchers) = self.watchers.get_mut(collection) {
            watchers.retain(|w| w.tx.send(snapshot.clone()).is_ok());
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        let (collection, id) = split_doc_path(path)?;
        let inner = self.lock();
        inner.check_access(path)?;
        Ok(inner.collections.get(collection).and_then(|m| m.get(id)).cloned())
    }

    async fn set(&self, path: &str, data: Value) -> Result<(), StoreError> {
        let (collection, id) = split_doc_path(path)?;
        let mut inner = self.lock();
        inner.check_access(path)?;

        let now = Utc::now();
        match inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .get_mut(id)
        {
            Some(existing) => {
                existing.data = data;
                existing.updated_at = now;
            }
            None => {
                let seq = inner.next_seq;
                inner.next_seq += 1;
                inner.collections.entry(collection.to_string()).or_default().insert(
                    id.to_string(),
                    Document {
                        id: id.to_string(),
                        data,
                        created_at: now,
                        updated_at: now,
                        seq,
                    },
                );
            }
        }
        inner.notify(collection);
        Ok(())
    }

    async fn add(&self, collection: &str, data: Value) -> Result<Document, StoreError> {
        let mut inner = self.lock();
        inner.check_access(collection)?;

        let now = Utc::now();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            data,
            created_at: now,
            updated_at: now,
            seq,
        };
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(doc.id.clone(), doc.clone());
        inner.notify(collection);
        Ok(doc)
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let (collection, id) = split_doc_path(path)?;
        let mut inner = self.lock();
        inner.check_access(path)?;

        let removed = inner
            .collections
            .get_mut(collection)
            .map(|m| m.remove(id).is_some())
            .unwrap_or(false);
        if removed {
            inner.notify(collection);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<CollectionSnapshot, StoreError> {
        let inner = self.lock();
        inner.check_access(collection)?;
        Ok(inner.snapshot(collection))
    }

    async fn watch(&self, collection: &str) -> Result<WatchHandle, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let watcher_id;
        {
            let mut inner = self.lock();
            inner.check_access(collection)?;

            // Initial snapshot before any mutation can race in.
            let snapshot = inner.snapshot(collection);
            let _ = tx.send(snapshot);

            watcher_id = inner.next_watcher_id;
            inner.next_watcher_id += 1;
            inner
                .watchers
                .entry(collection.to_string())
                .or_default()
                .push(Watcher { id: watcher_id, tx });
        }

        let store = self.clone();
        let collection = collection.to_string();
        Ok(WatchHandle::new(rx, move || {
            let mut inner = store.lock();
            if let Some(watchers) = inner.watchers.get_mut(&collection) {
                watchers.retain(|w| w.id != watcher_id);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryDocumentStore::new();
        store.set("conversation/a_b", json!({"participantA": "a"})).await.unwrap();
        let doc = store.get("conversation/a_b").await.unwrap().unwrap();
        assert_eq!(doc.id, "a_b");
        assert_eq!(doc.data["participantA"], "a");
    }

    #[tokio::test]
    async fn set_preserves_creation_metadata() {
        let store = MemoryDocumentStore::new();
        store.set("c/x", json!({"v": 1})).await.unwrap();
        let before = store.get("c/x").await.unwrap().unwrap();
        store.set("c/x", json!({"v": 2})).await.unwrap();
        let after = store.get("c/x").await.unwrap().unwrap();
        assert_eq!(before.seq, after.seq);
        assert_eq!(before.created_at, after.created_at);
        assert_eq!(after.data["v"], 2);
    }

    #[tokio::test]
    async fn add_assigns_increasing_seq() {
        let store = MemoryDocumentStore::new();
        let first = store.add("c/x/messages", json!({"n": 1})).await.unwrap();
        let second = store.add("c/x/messages", json!({"n": 2})).await.unwrap();
        assert!(second.seq > first.seq);

        let snapshot = store.list("c/x/messages").await.unwrap();
        assert_eq!(snapshot.docs.len(), 2);
        assert_eq!(snapshot.docs[0].data["n"], 1);
        assert_eq!(snapshot.docs[1].data["n"], 2);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryDocumentStore::new();
        store.set("c/x", json!({})).await.unwrap();
        store.delete("c/x").await.unwrap();
        store.delete("c/x").await.unwrap();
        assert!(store.get("c/x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn watch_sees_initial_and_updates() {
        let store = MemoryDocumentStore::new();
        store.set("c/one", json!({"n": 1})).await.unwrap();

        let mut watch = store.watch("c").await.unwrap();
        let initial = watch.next().await.unwrap();
        assert_eq!(initial.docs.len(), 1);

        store.set("c/two", json!({"n": 2})).await.unwrap();
        let updated = watch.next().await.unwrap();
        assert_eq!(updated.docs.len(), 2);
    }

    #[tokio::test]
    async fn cancelled_watch_stops_receiving() {
        let store = MemoryDocumentStore::new();
        let watch = store.watch("c").await.unwrap();
        watch.cancel();
        // Watcher list must be empty again, so this send has no receiver.
        store.set("c/x", json!({})).await.unwrap();
        assert!(store.lock().watchers.get("c").map(Vec::is_empty).unwrap_or(true));
    }

    #[tokio::test]
    async fn denied_prefix_rejects_reads_and_writes() {
        let store = MemoryDocumentStore::new();
        store.deny_prefix("conversation");
        let err = store.get("conversation/a_b").await.unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied(_)));
        let err = store.set("conversation/a_b", json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied(_)));

        store.clear_denials();
        assert!(store.get("conversation/a_b").await.unwrap().is_none());
    }
}

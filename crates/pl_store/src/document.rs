//! Document-store abstraction.
//!
//! Models the external document database at the level the core needs:
//! single-document reads and writes, collection listing, and live
//! collection subscriptions. No multi-document transactions are assumed;
//! callers that do check-then-create accept last-writer-wins.
//!
//! Paths are `/`-separated: `conversation/{cid}` addresses a document in
//! the top-level collection, `conversation/{cid}/publicKeys/{pid}` one in
//! a sub-collection. A collection path is a document path minus its final
//! segment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::StoreError;

/// A stored document plus the metadata the backend assigns.
#[derive(Debug, Clone)]
pub struct Document {
    /// Final path segment.
    pub id: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Server-assigned at creation, strictly increasing across the store.
    /// Stable across updates; used for ordering within a collection.
    pub seq: u64,
}

/// Point-in-time view of one collection, ordered by creation (`seq`).
#[derive(Debug, Clone, Default)]
pub struct CollectionSnapshot {
    pub docs: Vec<Document>,
}

/// The external document database, behind a trait so the backing client is
/// injected rather than reached through a module-level singleton.
///
/// Implementations share internal state via Arc; clones observe the same
/// store. All operations may fail with `PermissionDenied` when the backend
/// rejects the caller's credentials; absence is always `Ok(None)` or an
/// empty snapshot, never an error.
#[async_trait]
pub trait DocumentStore: Clone + Send + Sync + 'static {
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError>;

    /// Upsert the document at `path`. Creation metadata (`created_at`,
    /// `seq`) is preserved when the document already exists.
    async fn set(&self, path: &str, data: Value) -> Result<(), StoreError>;

    /// Append a document with a server-assigned id to `collection`.
    /// Returns the stored document, including its `seq` stamp.
    async fn add(&self, collection: &str, data: Value) -> Result<Document, StoreError>;

    /// Delete the document at `path`. Deleting an absent document is not
    /// an error.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    async fn list(&self, collection: &str) -> Result<CollectionSnapshot, StoreError>;

    /// Subscribe to a collection. The handle yields one snapshot
    /// immediately and another after every mutation of the collection.
    /// Tearing the subscription down is the caller's obligation: call
    /// [`WatchHandle::cancel`] (or drop the handle) when the view goes
    /// away.
    async fn watch(&self, collection: &str) -> Result<WatchHandle, StoreError>;
}

// ── Watch handle ─────────────────────────────────────────────────────────────

/// Live subscription to one collection. Cancels on drop.
pub struct WatchHandle {
    rx: mpsc::UnboundedReceiver<CollectionSnapshot>,
    _guard: WatchGuard,
}

impl WatchHandle {
    pub fn new(
        rx: mpsc::UnboundedReceiver<CollectionSnapshot>,
        on_cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            rx,
            _guard: WatchGuard {
                on_cancel: Some(Box::new(on_cancel)),
            },
        }
    }

    /// Next snapshot, or `None` once the subscription is closed.
    pub async fn next(&mut self) -> Option<CollectionSnapshot> {
        self.rx.recv().await
    }

    /// Explicit teardown. Equivalent to dropping the handle.
    pub fn cancel(self) {}
}

struct WatchGuard {
    on_cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.on_cancel.take() {
            unsubscribe();
        }
    }
}

/// Split a document path into (collection, document id).
pub(crate) fn split_doc_path(path: &str) -> Result<(&str, &str), StoreError> {
    path.rsplit_once('/')
        .filter(|(collection, id)| !collection.is_empty() && !id.is_empty())
        .ok_or_else(|| StoreError::Backend(format!("Not a document path: {path:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_path_splits_on_last_segment() {
        let (collection, id) = split_doc_path("conversation/a_b/publicKeys/a").unwrap();
        assert_eq!(collection, "conversation/a_b/publicKeys");
        assert_eq!(id, "a");
    }

    #[test]
    fn bare_segment_is_not_a_document_path() {
        assert!(split_doc_path("conversation").is_err());
        assert!(split_doc_path("/x").is_err());
    }
}

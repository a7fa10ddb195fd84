//! Message persistence.
//!
//! Messages are append-only documents under `conversation/{cid}/messages`.
//! The store assigns the document id and the monotonic `seq`, which becomes
//! the message's server timestamp; listing and watching both yield messages
//! in that order.

use pl_proto::{paths, ConversationId, MessageBody, MessageRecord};

use crate::{
    document::{CollectionSnapshot, Document, DocumentStore, WatchHandle},
    error::StoreError,
};

#[derive(Clone)]
pub struct MessageStore<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> MessageStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append a message. Returns the stored record including the
    /// server-assigned id and timestamp.
    pub async fn append(
        &self,
        cid: &ConversationId,
        body: &MessageBody,
    ) -> Result<MessageRecord, StoreError> {
        let doc = self
            .store
            .add(&paths::messages(cid), serde_json::to_value(body)?)
            .await?;
        tracing::debug!(conversation = %cid, message = %doc.id, "stored message");
        Ok(assemble(doc, body.clone()))
    }

    /// All messages, oldest first.
    pub async fn list(&self, cid: &ConversationId) -> Result<Vec<MessageRecord>, StoreError> {
        let snapshot = self.store.list(&paths::messages(cid)).await?;
        Ok(records_from(snapshot))
    }

    /// Live subscription yielding the full ordered message list on every
    /// change. Cancel (or drop) the watch when the conversation view goes
    /// away.
    pub async fn watch(&self, cid: &ConversationId) -> Result<MessageWatch, StoreError> {
        let inner = self.store.watch(&paths::messages(cid)).await?;
        Ok(MessageWatch { inner })
    }
}

fn assemble(doc: Document, body: MessageBody) -> MessageRecord {
    MessageRecord {
        id: doc.id,
        author: body.author,
        recipient_payload: body.recipient_payload,
        sender_payload: body.sender_payload,
        sent_at: body.sent_at,
        timestamp: doc.seq as i64,
    }
}

fn records_from(snapshot: CollectionSnapshot) -> Vec<MessageRecord> {
    let mut records = Vec::with_capacity(snapshot.docs.len());
    for doc in snapshot.docs {
        match serde_json::from_value::<MessageBody>(doc.data.clone()) {
            Ok(body) => records.push(assemble(doc, body)),
            Err(e) => tracing::warn!(doc = %doc.id, error = %e, "skipping malformed message document"),
        }
    }
    records
}

/// Cancellable message subscription.
pub struct MessageWatch {
    inner: WatchHandle,
}

impl MessageWatch {
    /// Next ordered message list, or `None` once the subscription closes.
    pub async fn next(&mut self) -> Option<Vec<MessageRecord>> {
        self.inner.next().await.map(records_from)
    }

    pub fn cancel(self) {
        self.inner.cancel();
    }
}

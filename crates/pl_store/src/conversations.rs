//! Conversation records.
//!
//! One document per conversation at `conversation/{cid}`, holding the
//! participant pair. Creation is check-then-create without a transaction:
//! a racing second creator overwrites with value-identical content, which
//! is accepted (last-writer-wins, relaxed-consistency design choice).

use chrono::Utc;
use pl_proto::{paths, ConversationId, ConversationRecord, ParticipantId};

use crate::{document::DocumentStore, error::StoreError};

#[derive(Clone)]
pub struct ConversationStore<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ConversationStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn get(&self, cid: &ConversationId) -> Result<Option<ConversationRecord>, StoreError> {
        let Some(doc) = self.store.get(&paths::conversation_doc(cid)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(doc.data)?))
    }

    /// Write the conversation record. The content is fully determined by
    /// the id, so overwrites are value-identical.
    pub async fn create(&self, cid: &ConversationId) -> Result<ConversationRecord, StoreError> {
        let (participant_a, participant_b) = cid.participants();
        let record = ConversationRecord {
            participant_a,
            participant_b,
            created_at: Utc::now(),
        };
        self.store
            .set(&paths::conversation_doc(cid), serde_json::to_value(&record)?)
            .await?;
        tracing::debug!(conversation = %cid, "created conversation record");
        Ok(record)
    }

    /// Every conversation the participant belongs to. Malformed records are
    /// skipped rather than failing the listing.
    pub async fn list_for(&self, pid: &ParticipantId) -> Result<Vec<ConversationId>, StoreError> {
        let snapshot = self.store.list(paths::CONVERSATIONS).await?;
        let mut out = Vec::new();
        for doc in snapshot.docs {
            match serde_json::from_value::<ConversationRecord>(doc.data) {
                Ok(record) => {
                    if record.participant_a == *pid || record.participant_b == *pid {
                        out.push(ConversationId::of(&record.participant_a, &record.participant_b));
                    }
                }
                Err(e) => tracing::warn!(doc = %doc.id, error = %e, "skipping malformed conversation record"),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocumentStore;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s).unwrap()
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = ConversationStore::new(MemoryDocumentStore::new());
        let cid = ConversationId::of(&pid("alice"), &pid("bob"));

        assert!(store.get(&cid).await.unwrap().is_none());
        store.create(&cid).await.unwrap();

        let record = store.get(&cid).await.unwrap().unwrap();
        assert_eq!(record.participant_a, pid("alice"));
        assert_eq!(record.participant_b, pid("bob"));
    }

    #[tokio::test]
    async fn list_for_filters_by_membership() {
        let store = ConversationStore::new(MemoryDocumentStore::new());
        let ab = ConversationId::of(&pid("alice"), &pid("bob"));
        let ac = ConversationId::of(&pid("alice"), &pid("carol"));
        let bc = ConversationId::of(&pid("bob"), &pid("carol"));
        for cid in [&ab, &ac, &bc] {
            store.create(cid).await.unwrap();
        }

        let mut for_alice = store.list_for(&pid("alice")).await.unwrap();
        for_alice.sort();
        assert_eq!(for_alice, vec![ab.clone(), ac.clone()]);

        assert!(store.list_for(&pid("dave")).await.unwrap().is_empty());
    }
}

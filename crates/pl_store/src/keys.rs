//! Key Store Adapter.
//!
//! Persists and retrieves the two halves of a participant's chat key:
//! the plaintext public key (readable by any authenticated participant of
//! the conversation) and the sealed private key (owner-readable only, an
//! opaque blob to this layer). Both upserts preserve `createdAt` so a
//! racing re-create cannot falsify provisioning history.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use pl_proto::{
    paths, ConversationId, ParticipantId, PublicKeyBytes, PublicKeyRecord, SealedKeyRecord,
    SealedPrivateKey,
};

use crate::{document::DocumentStore, error::StoreError};

#[derive(Clone)]
pub struct KeyStoreAdapter<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> KeyStoreAdapter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    // ── Public keys ──────────────────────────────────────────────────────────

    /// Idempotent upsert of a participant's public key.
    pub async fn put_public_key(
        &self,
        cid: &ConversationId,
        pid: &ParticipantId,
        public_key: &PublicKeyBytes,
    ) -> Result<(), StoreError> {
        let path = paths::public_key_doc(cid, pid);
        let now = Utc::now();
        let created_at = match self.store.get(&path).await? {
            Some(existing) => serde_json::from_value::<PublicKeyRecord>(existing.data)
                .map(|r| r.created_at)
                .unwrap_or(now),
            None => now,
        };
        let record = PublicKeyRecord {
            participant_id: pid.clone(),
            public_key: public_key.to_b64(),
            created_at,
            updated_at: now,
        };
        self.store.set(&path, serde_json::to_value(&record)?).await
    }

    pub async fn get_public_key(
        &self,
        cid: &ConversationId,
        pid: &ParticipantId,
    ) -> Result<Option<PublicKeyBytes>, StoreError> {
        let path = paths::public_key_doc(cid, pid);
        let Some(doc) = self.store.get(&path).await? else {
            return Ok(None);
        };
        let record: PublicKeyRecord = serde_json::from_value(doc.data)?;
        let key = PublicKeyBytes::from_b64(&record.public_key)
            .map_err(|e| StoreError::Corrupt(format!("{path}: {e}")))?;
        Ok(Some(key))
    }

    /// All public keys currently present for the conversation.
    pub async fn get_all_public_keys(
        &self,
        cid: &ConversationId,
    ) -> Result<BTreeMap<ParticipantId, PublicKeyBytes>, StoreError> {
        let snapshot = self.store.list(&paths::public_keys(cid)).await?;
        let mut keys = BTreeMap::new();
        for doc in snapshot.docs {
            match serde_json::from_value::<PublicKeyRecord>(doc.data) {
                Ok(record) => match PublicKeyBytes::from_b64(&record.public_key) {
                    Ok(key) => {
                        keys.insert(record.participant_id, key);
                    }
                    Err(e) => tracing::warn!(doc = %doc.id, error = %e, "skipping corrupt public key"),
                },
                Err(e) => tracing::warn!(doc = %doc.id, error = %e, "skipping malformed key record"),
            }
        }
        Ok(keys)
    }

    // ── Sealed private keys ──────────────────────────────────────────────────

    pub async fn put_sealed_private_key(
        &self,
        cid: &ConversationId,
        pid: &ParticipantId,
        sealed: &SealedPrivateKey,
    ) -> Result<(), StoreError> {
        let path = paths::private_key_doc(cid, pid);
        let now = Utc::now();
        let created_at = match self.store.get(&path).await? {
            Some(existing) => serde_json::from_value::<SealedKeyRecord>(existing.data)
                .map(|r| r.created_at)
                .unwrap_or(now),
            None => now,
        };
        let record = SealedKeyRecord {
            participant_id: pid.clone(),
            sealed_private_key: sealed.clone(),
            created_at,
            updated_at: now,
        };
        self.store.set(&path, serde_json::to_value(&record)?).await
    }

    pub async fn get_sealed_private_key(
        &self,
        cid: &ConversationId,
        pid: &ParticipantId,
    ) -> Result<Option<SealedPrivateKey>, StoreError> {
        let path = paths::private_key_doc(cid, pid);
        let Some(doc) = self.store.get(&path).await? else {
            return Ok(None);
        };
        let record: SealedKeyRecord = serde_json::from_value(doc.data)?;
        Ok(Some(record.sealed_private_key))
    }

    // ── Presence ─────────────────────────────────────────────────────────────

    /// Provisioning gate: true only when both the public and the sealed
    /// private record exist.
    pub async fn has_keys(
        &self,
        cid: &ConversationId,
        pid: &ParticipantId,
    ) -> Result<bool, StoreError> {
        let public = self.store.get(&paths::public_key_doc(cid, pid)).await?;
        let private = self.store.get(&paths::private_key_doc(cid, pid)).await?;
        Ok(public.is_some() && private.is_some())
    }

    /// Participants with a complete key pair (public and sealed private).
    pub async fn list_participants_with_keys(
        &self,
        cid: &ConversationId,
    ) -> Result<BTreeSet<ParticipantId>, StoreError> {
        let public = self.participant_ids(&paths::public_keys(cid)).await?;
        let private = self.participant_ids(&paths::private_keys(cid)).await?;
        Ok(public.intersection(&private).cloned().collect())
    }

    async fn participant_ids(&self, collection: &str) -> Result<BTreeSet<ParticipantId>, StoreError> {
        let snapshot = self.store.list(collection).await?;
        let mut ids = BTreeSet::new();
        for doc in snapshot.docs {
            match ParticipantId::new(doc.id.as_str()) {
                Ok(pid) => {
                    ids.insert(pid);
                }
                Err(e) => tracing::warn!(doc = %doc.id, error = %e, "skipping key record with bad id"),
            }
        }
        Ok(ids)
    }

    /// Best-effort removal of both records; absence is not an error.
    pub async fn delete_keys(
        &self,
        cid: &ConversationId,
        pid: &ParticipantId,
    ) -> Result<(), StoreError> {
        self.store.delete(&paths::public_key_doc(cid, pid)).await?;
        self.store.delete(&paths::private_key_doc(cid, pid)).await?;
        tracing::debug!(conversation = %cid, participant = %pid, "deleted chat keys");
        Ok(())
    }
}

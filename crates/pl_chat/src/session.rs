//! Per-conversation chat sessions.
//!
//! A session holds the participant's unsealed private key (in memory only,
//! zeroized on drop) plus both stored public keys, and performs the
//! dual-ciphertext encryption on send and role-based payload selection on
//! read.
//!
//! Read never fails: a message that cannot be decrypted renders as a
//! sentinel string. Two sentinels are distinguished because the causes
//! warrant different user-facing messages — the counterpart's keys being
//! gone (deleted account) versus any other decryption failure.

use chrono::{DateTime, Utc};
use pl_crypto::{
    chat_keys::{unseal_private_key, ChatPrivateKey},
    message::{decrypt, encrypt_dual, shared_key},
};
use pl_proto::{
    ConversationId, MessageBody, MessageRecord, ParticipantId, PublicKeyBytes, WireCiphertext,
};
use pl_store::{DocumentStore, MessageStore, MessageWatch};

use crate::{error::LifecycleError, lifecycle::KeyLifecycleManager};

/// Shown when the counterpart's keys no longer exist.
pub const UNDECRYPTABLE_DELETED: &str = "[Message from deleted user - cannot decrypt]";

/// Shown on any other decryption failure (wrong key, tampering, corrupt
/// payload).
pub const UNDECRYPTABLE_GENERIC: &str = "[Encrypted message - decryption failed]";

/// A message decrypted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    pub id: String,
    pub author: ParticipantId,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    pub timestamp: i64,
    pub outgoing: bool,
}

/// An open conversation, ready to encrypt and decrypt.
pub struct ChatSession<S: DocumentStore> {
    conversation: ConversationId,
    me: ParticipantId,
    private: ChatPrivateKey,
    my_public: PublicKeyBytes,
    /// `None` when the counterpart's public key record is gone — sends are
    /// refused and their messages render as the deleted-user sentinel.
    their_public: Option<PublicKeyBytes>,
    messages: MessageStore<S>,
}

impl<S: DocumentStore> std::fmt::Debug for ChatSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("conversation", &self.conversation)
            .field("me", &self.me)
            .field("private", &"<redacted>")
            .field("my_public", &self.my_public)
            .field("their_public", &self.their_public)
            .finish_non_exhaustive()
    }
}

impl<S: DocumentStore> ChatSession<S> {
    /// Open a session: unseal our private key with `password` and load both
    /// public keys. Requires our own records to exist (`KeyNotFound`
    /// otherwise — run provisioning first); tolerates a missing counterpart
    /// key record.
    pub async fn open(
        manager: &KeyLifecycleManager<S>,
        cid: &ConversationId,
        me: &ParticipantId,
        password: &str,
    ) -> Result<Self, LifecycleError> {
        let counterpart = cid
            .counterpart_of(me)
            .ok_or_else(|| LifecycleError::AuthorizationDenied {
                detail: format!("{me} is not a participant of {cid}"),
            })?;

        let sealed = manager
            .keys()
            .get_sealed_private_key(cid, me)
            .await?
            .ok_or(LifecycleError::KeyNotFound)?;
        let private = unseal_private_key(&sealed, cid, password)?;

        let my_public = manager
            .keys()
            .get_public_key(cid, me)
            .await?
            .ok_or(LifecycleError::KeyNotFound)?;
        let their_public = manager.keys().get_public_key(cid, &counterpart).await?;

        Ok(Self {
            conversation: cid.clone(),
            me: me.clone(),
            private,
            my_public,
            their_public,
            messages: manager.messages().clone(),
        })
    }

    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    /// False when the counterpart has no public key (not yet provisioned,
    /// or deleted).
    pub fn can_send(&self) -> bool {
        self.their_public.is_some()
    }

    /// Fingerprint of the counterpart's public key, for out-of-band
    /// verification. `None` when their key record is gone.
    pub fn counterpart_fingerprint(&self) -> Option<String> {
        self.their_public.as_ref().map(pl_crypto::hash::fingerprint)
    }

    /// Encrypt `text` for both readers and persist it. Refused with
    /// `KeyNotFound` while the counterpart has no public key; the UI gate
    /// should have blocked composition already.
    pub async fn send(&self, text: &str) -> Result<MessageRecord, LifecycleError> {
        let their_public = self.their_public.as_ref().ok_or(LifecycleError::KeyNotFound)?;

        let dual = encrypt_dual(&self.private, &self.my_public, their_public, text)?;
        let body = MessageBody {
            author: self.me.clone(),
            recipient_payload: json_payload(&dual.for_recipient)?,
            sender_payload: json_payload(&dual.for_sender)?,
            sent_at: Utc::now(),
        };
        Ok(self.messages.append(&self.conversation, &body).await?)
    }

    /// Decrypt one stored message for display. Infallible by design: every
    /// failure path degrades to a sentinel string.
    pub fn read(&self, record: &MessageRecord) -> String {
        let (payload, other_public) = if record.author == self.me {
            // Our own message: self-addressed copy under our own pair.
            (&record.sender_payload, Some(&self.my_public))
        } else {
            (&record.recipient_payload, self.their_public.as_ref())
        };

        let Some(other_public) = other_public else {
            return UNDECRYPTABLE_DELETED.to_string();
        };

        let Ok(wire) = WireCiphertext::from_json(payload) else {
            return UNDECRYPTABLE_GENERIC.to_string();
        };
        let Ok(key) = shared_key(&self.private, other_public) else {
            return UNDECRYPTABLE_GENERIC.to_string();
        };
        match decrypt(&key, &wire) {
            Ok(text) => text,
            Err(_) => UNDECRYPTABLE_GENERIC.to_string(),
        }
    }

    /// Decrypted view of a record.
    pub fn view(&self, record: &MessageRecord) -> DecryptedMessage {
        DecryptedMessage {
            id: record.id.clone(),
            author: record.author.clone(),
            text: self.read(record),
            sent_at: record.sent_at,
            timestamp: record.timestamp,
            outgoing: record.author == self.me,
        }
    }

    /// All messages, oldest first, decrypted.
    pub async fn list(&self) -> Result<Vec<DecryptedMessage>, LifecycleError> {
        let records = self.messages.list(&self.conversation).await?;
        Ok(records.iter().map(|r| self.view(r)).collect())
    }

    /// Live decrypted message feed. Cancel (or drop) when the view closes.
    pub async fn watch(&self) -> Result<ChatWatch<'_, S>, LifecycleError> {
        let inner = self.messages.watch(&self.conversation).await?;
        Ok(ChatWatch { session: self, inner })
    }
}

fn json_payload(wire: &WireCiphertext) -> Result<String, LifecycleError> {
    wire.to_json()
        .map_err(|e| LifecycleError::CryptoPrimitiveFailure { detail: e.to_string() })
}

/// Cancellable subscription yielding decrypted message lists.
pub struct ChatWatch<'a, S: DocumentStore> {
    session: &'a ChatSession<S>,
    inner: MessageWatch,
}

impl<S: DocumentStore> ChatWatch<'_, S> {
    pub async fn next(&mut self) -> Option<Vec<DecryptedMessage>> {
        let records = self.inner.next().await?;
        Some(records.iter().map(|r| self.session.view(r)).collect())
    }

    pub fn cancel(self) {
        self.inner.cancel();
    }
}

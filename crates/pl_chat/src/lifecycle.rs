//! Provisioning state machine.
//!
//! A conversation moves through four states:
//!
//! ```text
//! NoConversation → ConversationCreated → KeysPending → BothKeysPresent
//! ```
//!
//! The first participant to open the conversation creates the record and
//! provisions their own key pair; the second does the same on their first
//! open. The UI keeps message composition blocked until
//! `BothKeysPresent` — enforced at this layer, not inside the cipher,
//! which knows nothing about provisioning.
//!
//! Conversation-record creation is check-then-create without a
//! transaction; a racing second creator writes value-identical content
//! (accepted, self-healing).

use std::collections::BTreeSet;

use pl_crypto::chat_keys::generate_chat_key_pair;
use pl_proto::{paths, ConversationId, ParticipantId};
use pl_store::{
    ConversationStore, DocumentStore, KeyStoreAdapter, MessageStore, WatchHandle,
};

use crate::{error::LifecycleError, identity::IdentityProvider};

// ── Provisioning state ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningState {
    /// No conversation record exists yet.
    NoConversation,
    /// The record exists but neither participant has a complete key pair.
    ConversationCreated,
    /// Exactly one participant has keys; the other has not opened yet.
    KeysPending { present: BTreeSet<ParticipantId> },
    /// Both participants can encrypt and decrypt.
    BothKeysPresent,
}

impl ProvisioningState {
    /// The UI gate: composing messages is allowed only here.
    pub fn can_compose(&self) -> bool {
        matches!(self, Self::BothKeysPresent)
    }
}

// ── Manager ──────────────────────────────────────────────────────────────────

/// Orchestrates key provisioning and the re-seal sweep. Constructed with an
/// injected store handle; owns nothing global.
#[derive(Clone)]
pub struct KeyLifecycleManager<S: DocumentStore> {
    store: S,
    keys: KeyStoreAdapter<S>,
    conversations: ConversationStore<S>,
    messages: MessageStore<S>,
}

impl<S: DocumentStore> KeyLifecycleManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            keys: KeyStoreAdapter::new(store.clone()),
            conversations: ConversationStore::new(store.clone()),
            messages: MessageStore::new(store.clone()),
            store,
        }
    }

    pub fn keys(&self) -> &KeyStoreAdapter<S> {
        &self.keys
    }

    pub fn conversations(&self) -> &ConversationStore<S> {
        &self.conversations
    }

    pub fn messages(&self) -> &MessageStore<S> {
        &self.messages
    }

    /// Create the conversation record if absent (check-then-create,
    /// last-writer-wins on the benign race).
    pub async fn ensure_conversation(&self, cid: &ConversationId) -> Result<(), LifecycleError> {
        if self.conversations.get(cid).await?.is_none() {
            self.conversations.create(cid).await?;
        }
        Ok(())
    }

    /// Lazy provisioning: generate and store `me`'s key pair unless both
    /// records already exist. The public key is written first so the
    /// counterpart can start encrypting as early as possible; `has_keys`
    /// stays false until the sealed private key lands too.
    pub async fn ensure_keys(
        &self,
        cid: &ConversationId,
        me: &ParticipantId,
        password: &str,
    ) -> Result<(), LifecycleError> {
        if self.keys.has_keys(cid, me).await? {
            return Ok(());
        }
        let pair = generate_chat_key_pair(cid, password)?;
        self.keys.put_public_key(cid, me, &pair.public_key).await?;
        self.keys
            .put_sealed_private_key(cid, me, &pair.sealed_private_key)
            .await?;
        tracing::info!(conversation = %cid, participant = %me, "provisioned chat keys");
        Ok(())
    }

    /// What the UI calls when a conversation view opens: make sure the
    /// record and our own keys exist, then report where provisioning
    /// stands.
    pub async fn open_conversation(
        &self,
        cid: &ConversationId,
        me: &ParticipantId,
        password: &str,
    ) -> Result<ProvisioningState, LifecycleError> {
        if !cid.contains(me) {
            return Err(LifecycleError::AuthorizationDenied {
                detail: format!("{me} is not a participant of {cid}"),
            });
        }
        self.ensure_conversation(cid).await?;
        self.ensure_keys(cid, me, password).await?;
        self.provisioning_state(cid).await
    }

    /// [`open_conversation`] gated on the identity provider: requires a
    /// signed-in, email-verified user.
    ///
    /// [`open_conversation`]: Self::open_conversation
    pub async fn open_for_current_user(
        &self,
        identity: &dyn IdentityProvider,
        cid: &ConversationId,
        password: &str,
    ) -> Result<ProvisioningState, LifecycleError> {
        let user = identity.current_user().ok_or(LifecycleError::AuthorizationDenied {
            detail: "not signed in".into(),
        })?;
        if !user.email_verified {
            return Err(LifecycleError::AuthorizationDenied {
                detail: "email not verified".into(),
            });
        }
        self.open_conversation(cid, &user.participant_id, password).await
    }

    /// Current state, derived from the conversation record and the set of
    /// participants holding a complete key pair.
    pub async fn provisioning_state(
        &self,
        cid: &ConversationId,
    ) -> Result<ProvisioningState, LifecycleError> {
        if self.conversations.get(cid).await?.is_none() {
            return Ok(ProvisioningState::NoConversation);
        }
        let present = self.keys.list_participants_with_keys(cid).await?;
        let (a, b) = cid.participants();
        Ok(if present.contains(&a) && present.contains(&b) {
            ProvisioningState::BothKeysPresent
        } else if present.is_empty() {
            ProvisioningState::ConversationCreated
        } else {
            ProvisioningState::KeysPending { present }
        })
    }

    /// Live provisioning watcher. Recomputes the state whenever either
    /// key collection changes. Cancel (or drop) the watch when the
    /// conversation view goes away.
    pub async fn watch_provisioning(
        &self,
        cid: &ConversationId,
    ) -> Result<ProvisioningWatch<S>, LifecycleError> {
        let public = self.store.watch(&paths::public_keys(cid)).await?;
        let private = self.store.watch(&paths::private_keys(cid)).await?;
        Ok(ProvisioningWatch {
            cid: cid.clone(),
            manager: self.clone(),
            public,
            private,
        })
    }
}

// ── Watcher ──────────────────────────────────────────────────────────────────

/// Cancellable stream of [`ProvisioningState`] values.
pub struct ProvisioningWatch<S: DocumentStore> {
    cid: ConversationId,
    manager: KeyLifecycleManager<S>,
    public: WatchHandle,
    private: WatchHandle,
}

impl<S: DocumentStore> ProvisioningWatch<S> {
    /// Next observed state. Returns `None` once both underlying
    /// subscriptions have closed. A state query that fails (for example
    /// after a credential expiry) is logged and skipped rather than ending
    /// the stream.
    pub async fn next(&mut self) -> Option<ProvisioningState> {
        loop {
            tokio::select! {
                event = self.public.next() => event?,
                event = self.private.next() => event?,
            };
            match self.manager.provisioning_state(&self.cid).await {
                Ok(state) => return Some(state),
                Err(e) => {
                    tracing::warn!(conversation = %self.cid, error = %e, "provisioning state query failed");
                }
            }
        }
    }

    /// Explicit teardown of both underlying subscriptions.
    pub fn cancel(self) {
        self.public.cancel();
        self.private.cancel();
    }
}

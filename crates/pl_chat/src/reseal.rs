//! Password-change re-seal sweep.
//!
//! When the account password changes, every sealed private key the user
//! owns must be unwrapped with the old password and re-sealed under the
//! new one. The conversation keys themselves are never re-derived; only
//! the wrapping changes, so counterparts notice nothing.
//!
//! The sweep is best-effort: a single conversation's failure never aborts
//! the rest. Only the initial conversation-set resolution is fatal,
//! because failing there means zero conversations were processed — a
//! different situation from "the user has zero conversations", which is a
//! valid empty success.
//!
//! Caller preconditions (documented, not re-verified here): `old_password`
//! is the password the blobs were sealed under, and no concurrent sweep
//! runs for the same user from another device. Re-running after a partial
//! failure is safe at the conversation level: already-resealed blobs fail
//! the old-password unwrap and are reported, untouched ones succeed again.

use pl_crypto::chat_keys::reseal_private_key;
use pl_proto::{ConversationId, ParticipantId};
use pl_store::DocumentStore;

use crate::{error::LifecycleError, lifecycle::KeyLifecycleManager};

/// Aggregate outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResealReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Conversations with no sealed key for this participant (never opened,
    /// or predating their membership). Not failures.
    pub skipped: usize,
    pub failures: Vec<(ConversationId, String)>,
}

impl ResealReport {
    /// Whether the surrounding app should proceed with the credential
    /// change: never strand the user with zero working keys under a new
    /// password, but don't block the change because already-unreadable
    /// legacy blobs stayed unreadable.
    pub fn permits_credential_change(&self) -> bool {
        self.failed == 0 || self.succeeded > 0
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}

enum Outcome {
    Succeeded,
    Skipped,
    Failed(String),
}

impl<S: DocumentStore> KeyLifecycleManager<S> {
    /// Re-seal every conversation key `me` owns from `old_password` to
    /// `new_password`. Sequential; within each conversation the order is
    /// strictly read → unwrap → re-seal → write.
    pub async fn reseal_all(
        &self,
        me: &ParticipantId,
        old_password: &str,
        new_password: &str,
    ) -> Result<ResealReport, LifecycleError> {
        // Resolution failure aborts the whole sweep with nothing processed.
        let conversations = self.conversations().list_for(me).await?;

        let mut report = ResealReport::default();
        for cid in conversations {
            match self.reseal_one(&cid, me, old_password, new_password).await {
                Outcome::Succeeded => report.succeeded += 1,
                Outcome::Skipped => report.skipped += 1,
                Outcome::Failed(reason) => {
                    tracing::warn!(conversation = %cid, reason = %reason, "re-seal failed");
                    report.failed += 1;
                    report.failures.push((cid, reason));
                }
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "re-seal sweep finished"
        );
        Ok(report)
    }

    async fn reseal_one(
        &self,
        cid: &ConversationId,
        me: &ParticipantId,
        old_password: &str,
        new_password: &str,
    ) -> Outcome {
        let sealed = match self.keys().get_sealed_private_key(cid, me).await {
            Ok(Some(sealed)) => sealed,
            Ok(None) => return Outcome::Skipped,
            Err(e) => return Outcome::Failed(e.to_string()),
        };

        let resealed = match reseal_private_key(&sealed, cid, old_password, new_password) {
            Ok(resealed) => resealed,
            Err(e) => return Outcome::Failed(e.to_string()),
        };

        match self.keys().put_sealed_private_key(cid, me, &resealed).await {
            Ok(()) => Outcome::Succeeded,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

//! Per-conversation key pairs and their password sealing.
//!
//! Each (conversation, participant) tuple gets exactly one X25519 pair,
//! generated lazily the first time the participant opens the conversation
//! and never reused elsewhere. The public half is exported for anyone to
//! read; the private half is serialised and sealed under the PBKDF2
//! wrapping key so it can be stored remotely and recovered on any device
//! that knows the password.
//!
//! There is deliberately no recovery path: losing the password before a
//! re-seal leaves the blob permanently unreadable, since no server ever
//! sees the plaintext password or key.

use pl_proto::{ConversationId, PublicKeyBytes, SealedPrivateKey};
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};

use crate::{
    aead,
    error::CryptoError,
    kdf::{derive_wrapping_key, seal_salt},
};

// ── Private key handle ───────────────────────────────────────────────────────

/// In-memory X25519 private key for one conversation. The inner secret
/// zeroizes on drop.
pub struct ChatPrivateKey(StaticSecret);

impl ChatPrivateKey {
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(OsRng))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Raw scalar, for sealing and for test comparison.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn public_key(&self) -> PublicKeyBytes {
        PublicKeyBytes(X25519Public::from(&self.0).as_bytes().to_vec())
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.0
    }
}

/// A freshly generated pair ready for storage: plaintext public half plus
/// the sealed private half.
pub struct ProvisionedKeyPair {
    pub public_key: PublicKeyBytes,
    pub sealed_private_key: SealedPrivateKey,
}

// ── Generation and sealing ───────────────────────────────────────────────────

/// Generate a fresh pair for `conversation` and seal the private half under
/// `password`. Any primitive failure is fatal; there is no partial success.
pub fn generate_chat_key_pair(
    conversation: &ConversationId,
    password: &str,
) -> Result<ProvisionedKeyPair, CryptoError> {
    let private = ChatPrivateKey::generate();
    let sealed = seal_private_key(&private, conversation, password)?;
    Ok(ProvisionedKeyPair {
        public_key: private.public_key(),
        sealed_private_key: sealed,
    })
}

/// Seal a private key: scalar bytes → AES-256-GCM under the PBKDF2 wrapping
/// key (salt bound to the conversation) → IV-prefixed blob → base64.
pub fn seal_private_key(
    key: &ChatPrivateKey,
    conversation: &ConversationId,
    password: &str,
) -> Result<SealedPrivateKey, CryptoError> {
    let wrapping = derive_wrapping_key(password, &seal_salt(conversation));
    let blob = aead::seal(&wrapping.0, &key.to_bytes())?;
    Ok(SealedPrivateKey::from_bytes(&blob))
}

/// Unseal a stored blob. Fails with `AeadDecrypt` on a wrong password or a
/// corrupted blob; fails with `InvalidKey` if the plaintext is not a
/// 32-byte scalar.
pub fn unseal_private_key(
    sealed: &SealedPrivateKey,
    conversation: &ConversationId,
    password: &str,
) -> Result<ChatPrivateKey, CryptoError> {
    let wrapping = derive_wrapping_key(password, &seal_salt(conversation));
    let plaintext = aead::open(&wrapping.0, &sealed.decode()?)?;
    let scalar: [u8; 32] = plaintext
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidKey(format!("Unsealed key is {} bytes, expected 32", plaintext.len())))?;
    Ok(ChatPrivateKey::from_bytes(scalar))
}

/// Unwrap with the old password and re-seal under the new one, without the
/// intermediate key escaping this function. The conversation keys themselves
/// are never re-derived; only the wrapping changes.
pub fn reseal_private_key(
    sealed: &SealedPrivateKey,
    conversation: &ConversationId,
    old_password: &str,
    new_password: &str,
) -> Result<SealedPrivateKey, CryptoError> {
    let key = unseal_private_key(sealed, conversation, old_password)?;
    seal_private_key(&key, conversation, new_password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_proto::ParticipantId;

    fn cid() -> ConversationId {
        let a = ParticipantId::new("alice").unwrap();
        let b = ParticipantId::new("bob").unwrap();
        ConversationId::of(&a, &b)
    }

    #[test]
    fn seal_unseal_roundtrip() {
        let pair = generate_chat_key_pair(&cid(), "hunter2").unwrap();
        let key = unseal_private_key(&pair.sealed_private_key, &cid(), "hunter2").unwrap();
        assert_eq!(key.public_key(), pair.public_key);
    }

    #[test]
    fn wrong_password_fails_unseal() {
        let pair = generate_chat_key_pair(&cid(), "hunter2").unwrap();
        let result = unseal_private_key(&pair.sealed_private_key, &cid(), "hunter3");
        assert!(matches!(result, Err(CryptoError::AeadDecrypt)));
    }

    #[test]
    fn wrong_conversation_fails_unseal() {
        let other = ConversationId::of(
            &ParticipantId::new("alice").unwrap(),
            &ParticipantId::new("carol").unwrap(),
        );
        let pair = generate_chat_key_pair(&cid(), "hunter2").unwrap();
        assert!(unseal_private_key(&pair.sealed_private_key, &other, "hunter2").is_err());
    }

    #[test]
    fn reseal_preserves_key_material() {
        let pair = generate_chat_key_pair(&cid(), "old-password").unwrap();
        let before = unseal_private_key(&pair.sealed_private_key, &cid(), "old-password").unwrap();

        let resealed = reseal_private_key(&pair.sealed_private_key, &cid(), "old-password", "new-password").unwrap();

        let after = unseal_private_key(&resealed, &cid(), "new-password").unwrap();
        assert_eq!(before.to_bytes(), after.to_bytes());

        // The old password no longer opens the new blob.
        assert!(unseal_private_key(&resealed, &cid(), "old-password").is_err());
    }

    #[test]
    fn pairs_are_unique_per_generation() {
        let a = generate_chat_key_pair(&cid(), "pw").unwrap();
        let b = generate_chat_key_pair(&cid(), "pw").unwrap();
        assert_ne!(a.public_key, b.public_key);
    }
}

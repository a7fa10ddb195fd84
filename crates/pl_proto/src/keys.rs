//! Key material records as stored in the document database.
//!
//! Public keys are plaintext and readable by any authenticated participant
//! of the conversation. Sealed private keys are opaque blobs only the owning
//! participant can read, and only after deriving the wrapping key from their
//! current password. Both record kinds carry created/updated timestamps; the
//! public-key payload is written once and never rotated in place.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::ParticipantId;

#[derive(Debug, Error)]
pub enum KeyFormatError {
    #[error("Public key must be 32 bytes, got {0}")]
    BadLength(usize),

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}

// ── Public key bytes ─────────────────────────────────────────────────────────

/// 32-byte X25519 public key, base64url-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKeyBytes(pub Vec<u8>);

impl PublicKeyBytes {
    pub fn to_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    pub fn from_b64(s: &str) -> Result<Self, KeyFormatError> {
        let bytes = URL_SAFE_NO_PAD.decode(s)?;
        if bytes.len() != 32 {
            return Err(KeyFormatError::BadLength(bytes.len()));
        }
        Ok(Self(bytes))
    }
}

// ── Sealed private key ───────────────────────────────────────────────────────

/// Private key sealed under the owner's password-derived wrapping key.
///
/// Wire format: `base64url(IV(12 bytes) || AEAD ciphertext+tag)`. The blob is
/// opaque to everything except the unseal routine; in particular the store
/// layer never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SealedPrivateKey(String);

impl SealedPrivateKey {
    pub fn from_bytes(blob: &[u8]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(blob))
    }

    pub fn decode(&self) -> Result<Vec<u8>, KeyFormatError> {
        Ok(URL_SAFE_NO_PAD.decode(&self.0)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ── Stored records ───────────────────────────────────────────────────────────

/// Document at `conversation/{cid}/publicKeys/{pid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyRecord {
    pub participant_id: ParticipantId,
    /// Base64url X25519 public key.
    pub public_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Document at `conversation/{cid}/privateKeys/{pid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedKeyRecord {
    pub participant_id: ParticipantId,
    pub sealed_private_key: SealedPrivateKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Document at `conversation/{cid}` — created by whichever participant opens
/// the conversation first. A racing second create overwrites with identical
/// content (last-writer-wins, accepted).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub participant_a: ParticipantId,
    pub participant_b: ParticipantId,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_b64_roundtrip() {
        let key = PublicKeyBytes(vec![7u8; 32]);
        let b64 = key.to_b64();
        assert_eq!(PublicKeyBytes::from_b64(&b64).unwrap(), key);
    }

    #[test]
    fn public_key_rejects_wrong_length() {
        let b64 = URL_SAFE_NO_PAD.encode([1u8; 16]);
        assert!(matches!(
            PublicKeyBytes::from_b64(&b64),
            Err(KeyFormatError::BadLength(16))
        ));
    }

    #[test]
    fn sealed_blob_roundtrip() {
        let blob = [0xAAu8; 60];
        let sealed = SealedPrivateKey::from_bytes(&blob);
        assert_eq!(sealed.decode().unwrap(), blob);
    }

    #[test]
    fn record_wire_field_names_are_camel_case() {
        let record = PublicKeyRecord {
            participant_id: ParticipantId::new("alice").unwrap(),
            public_key: "AAAA".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("participantId").is_some());
        assert!(json.get("publicKey").is_some());
        assert!(json.get("createdAt").is_some());
    }
}

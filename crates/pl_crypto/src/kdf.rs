//! Key derivation functions
//!
//! `derive_wrapping_key` — PBKDF2-HMAC-SHA256, derives the 32-byte key that
//!   seals a conversation's private key. The salt is bound to the
//!   conversation id, so a compromised wrapping key for one conversation
//!   exposes nothing about the others even under the same password.
//!
//! `password_proof` — PBKDF2 digest under a separate purpose salt, letting
//!   the surrounding app verify the current password before starting a
//!   re-seal sweep. Never used as key material.

use pbkdf2::pbkdf2_hmac;
use pl_proto::ConversationId;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

/// Iteration count shared by all derivations. Deterministic output is part
/// of the contract: the wrapping key is never stored, only re-derived.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Purpose prefix for private-key sealing salts.
const SEAL_SALT_PURPOSE: &str = "chat-key-seal";

/// Salt for the password proof digest. Static: the proof is account-scoped,
/// not conversation-scoped.
const PROOF_SALT: &str = "parley-password-proof-v1";

/// 32-byte wrapping key derived from the user password. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct WrappingKey(pub [u8; 32]);

/// Derive the AES-256-GCM wrapping key for a given (password, salt) pair.
///
/// Deterministic: identical inputs always produce the identical key.
pub fn derive_wrapping_key(password: &str, salt: &str) -> WrappingKey {
    let mut output = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), PBKDF2_ITERATIONS, &mut output);
    WrappingKey(output)
}

/// Purpose-bound salt for sealing a conversation's private key.
pub fn seal_salt(conversation: &ConversationId) -> String {
    format!("{SEAL_SALT_PURPOSE}:{conversation}")
}

/// Hex digest proving knowledge of the password. Safe to store locally;
/// useless as key material because of the distinct purpose salt.
pub fn password_proof(password: &str) -> String {
    let digest = derive_wrapping_key(password, PROOF_SALT);
    hex::encode(digest.0)
}

/// Constant-time check of a password against a stored proof digest.
pub fn proof_matches(password: &str, proof_hex: &str) -> bool {
    let Ok(expected) = hex::decode(proof_hex) else {
        return false;
    };
    if expected.len() != 32 {
        return false;
    }
    let actual = derive_wrapping_key(password, PROOF_SALT);
    let mut diff = 0u8;
    for (a, b) in actual.0.iter().zip(expected.iter()) {
        diff |= a ^ b;
    }
    diff == 0
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
    fn derivation_is_deterministic() {
        let salt = seal_salt(&cid());
        let k1 = derive_wrapping_key("hunter2", &salt);
        let k2 = derive_wrapping_key("hunter2", &salt);
        assert_eq!(k1.0, k2.0);
    }

    #[test]
    fn different_salts_give_different_keys() {
        let k1 = derive_wrapping_key("hunter2", "chat-key-seal:alice_bob");
        let k2 = derive_wrapping_key("hunter2", "chat-key-seal:alice_carol");
        assert_ne!(k1.0, k2.0);
    }

    #[test]
    fn different_passwords_give_different_keys() {
        let salt = seal_salt(&cid());
        let k1 = derive_wrapping_key("hunter2", &salt);
        let k2 = derive_wrapping_key("hunter3", &salt);
        assert_ne!(k1.0, k2.0);
    }

    #[test]
    fn proof_verifies_only_correct_password() {
        let proof = password_proof("correct horse");
        assert!(proof_matches("correct horse", &proof));
        assert!(!proof_matches("battery staple", &proof));
        assert!(!proof_matches("correct horse", "not hex"));
    }
}

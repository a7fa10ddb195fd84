//! Per-message encryption.
//!
//! The direction key is the X25519 agreement between one party's private
//! key and the other's public key, used directly as an AES-256-GCM key.
//! By commutativity, DH(a_priv, b_pub) == DH(b_priv, a_pub), so both ends
//! derive the same key without any exchange beyond the stored public keys.
//!
//! Every outgoing message is encrypted twice:
//!   - under DH(sender_priv, recipient_pub) — what the recipient reads;
//!   - under DH(sender_priv, sender_pub)    — the sender's self-addressed
//!     copy, so their own later re-reads need only their own key pair.
//!
//! The cipher knows nothing about provisioning state; callers gate sends
//! until both participants have keys.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng},
    Aes256Gcm, Nonce,
};
use pl_proto::{PublicKeyBytes, WireCiphertext};
use x25519_dalek::PublicKey as X25519Public;
use zeroize::ZeroizeOnDrop;

use crate::{aead::NONCE_SIZE, chat_keys::ChatPrivateKey, error::CryptoError};

/// Symmetric key for one message direction. Zeroized on drop; the raw DH
/// output is never exposed to callers.
#[derive(ZeroizeOnDrop)]
pub struct MessageKey([u8; 32]);

/// Derive the direction key for (my private, their public).
pub fn shared_key(
    my_private: &ChatPrivateKey,
    their_public: &PublicKeyBytes,
) -> Result<MessageKey, CryptoError> {
    let public: [u8; 32] = their_public
        .0
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidKey(format!("Public key is {} bytes, expected 32", their_public.0.len())))?;
    let dh = my_private.secret().diffie_hellman(&X25519Public::from(public));
    Ok(MessageKey(*dh.as_bytes()))
}

/// Encrypt one message with a fresh random 96-bit nonce.
pub fn encrypt(key: &MessageKey, plaintext: &str) -> Result<WireCiphertext, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(&key.0).map_err(|_| CryptoError::AeadEncrypt)?;
    let nonce = Aes256Gcm::generate_nonce(&mut AeadOsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| CryptoError::AeadEncrypt)?;
    Ok(WireCiphertext {
        iv: nonce.to_vec(),
        ciphertext,
    })
}

/// Decrypt one message. Any failure (bad IV length, tag mismatch, non-UTF-8
/// plaintext) reports `AeadDecrypt`; callers map it to a user-facing
/// sentinel, never a crash.
pub fn decrypt(key: &MessageKey, wire: &WireCiphertext) -> Result<String, CryptoError> {
    if wire.iv.len() != NONCE_SIZE {
        return Err(CryptoError::AeadDecrypt);
    }
    let cipher = Aes256Gcm::new_from_slice(&key.0).map_err(|_| CryptoError::AeadDecrypt)?;
    let nonce = Nonce::from_slice(&wire.iv);
    let plaintext = cipher
        .decrypt(nonce, wire.ciphertext.as_slice())
        .map_err(|_| CryptoError::AeadDecrypt)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::AeadDecrypt)
}

/// The two ciphertexts persisted for every outgoing message.
pub struct DualCiphertext {
    pub for_recipient: WireCiphertext,
    pub for_sender: WireCiphertext,
}

/// Encrypt `plaintext` for both readers of a conversation.
pub fn encrypt_dual(
    my_private: &ChatPrivateKey,
    my_public: &PublicKeyBytes,
    their_public: &PublicKeyBytes,
    plaintext: &str,
) -> Result<DualCiphertext, CryptoError> {
    let to_recipient = shared_key(my_private, their_public)?;
    let to_self = shared_key(my_private, my_public)?;
    Ok(DualCiphertext {
        for_recipient: encrypt(&to_recipient, plaintext)?,
        for_sender: encrypt(&to_self, plaintext)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (ChatPrivateKey, PublicKeyBytes) {
        let private = ChatPrivateKey::generate();
        let public = private.public_key();
        (private, public)
    }

    #[test]
    fn sender_to_recipient_roundtrip() {
        let (sender_priv, sender_pub) = pair();
        let (recipient_priv, recipient_pub) = pair();

        let dual = encrypt_dual(&sender_priv, &sender_pub, &recipient_pub, "hello").unwrap();

        // Recipient derives the mirror key from their private + sender public.
        let recipient_key = shared_key(&recipient_priv, &sender_pub).unwrap();
        assert_eq!(decrypt(&recipient_key, &dual.for_recipient).unwrap(), "hello");
    }

    #[test]
    fn sender_reads_own_copy() {
        let (sender_priv, sender_pub) = pair();
        let (_, recipient_pub) = pair();

        let dual = encrypt_dual(&sender_priv, &sender_pub, &recipient_pub, "hello").unwrap();

        let self_key = shared_key(&sender_priv, &sender_pub).unwrap();
        assert_eq!(decrypt(&self_key, &dual.for_sender).unwrap(), "hello");
    }

    #[test]
    fn recipient_cannot_read_sender_copy() {
        let (sender_priv, sender_pub) = pair();
        let (recipient_priv, recipient_pub) = pair();

        let dual = encrypt_dual(&sender_priv, &sender_pub, &recipient_pub, "hello").unwrap();

        let recipient_key = shared_key(&recipient_priv, &sender_pub).unwrap();
        assert!(decrypt(&recipient_key, &dual.for_sender).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let (sender_priv, sender_pub) = pair();
        let key = shared_key(&sender_priv, &sender_pub).unwrap();
        let mut wire = encrypt(&key, "original").unwrap();
        wire.ciphertext[0] ^= 0xFF;
        assert!(matches!(decrypt(&key, &wire), Err(CryptoError::AeadDecrypt)));
    }

    #[test]
    fn bad_iv_length_fails_without_panic() {
        let (sender_priv, sender_pub) = pair();
        let key = shared_key(&sender_priv, &sender_pub).unwrap();
        let wire = WireCiphertext {
            iv: vec![0u8; 7],
            ciphertext: vec![1, 2, 3],
        };
        assert!(matches!(decrypt(&key, &wire), Err(CryptoError::AeadDecrypt)));
    }

    #[test]
    fn nonces_are_fresh_per_message() {
        let (sender_priv, sender_pub) = pair();
        let key = shared_key(&sender_priv, &sender_pub).unwrap();
        let a = encrypt(&key, "same text").unwrap();
        let b = encrypt(&key, "same text").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }
}

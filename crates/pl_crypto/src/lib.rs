//! pl_crypto — Parley cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - Pure functions: no storage or network I/O anywhere in this crate.
//!
//! # Key lifecycle
//!
//! Each participant holds one X25519 key pair per conversation. The private
//! half never leaves the client unencrypted:
//!
//! ```text
//! password + conversation-bound salt
//!        │
//!        ▼
//! PBKDF2-HMAC-SHA256 → wrapping key (32 bytes)
//!        │
//!        ▼
//! AES-256-GCM seal → sealed private key blob (IV || ct, base64)
//! ```
//!
//! Message encryption derives a direction key per (private, public) pair via
//! X25519 and uses it as an AES-256-GCM key. Every outgoing message is
//! encrypted twice: once for the recipient and once under the sender's own
//! pair, so the author can re-read history knowing only their own password.
//!
//! # Module layout
//! - `kdf`       — PBKDF2 wrapping-key derivation + password proof digest
//! - `aead`      — AES-256-GCM seal/open with IV-prefixed wire format
//! - `chat_keys` — per-conversation key pair generation, sealing, resealing
//! - `message`   — shared-key derivation and dual-ciphertext encryption
//! - `hash`      — BLAKE3 fingerprints and deterministic message ids
//! - `error`     — unified error type

pub mod aead;
pub mod chat_keys;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod message;

pub use error::CryptoError;

//! pl_proto — Wire and data types for Parley
//!
//! Everything that crosses the document-store boundary is defined here and
//! serialised as JSON. Record field names follow the backend's camelCase
//! convention so stored documents stay readable by the other clients.
//!
//! # Modules
//! - `conversation` — participant ids and the canonical conversation id
//! - `keys`         — public-key / sealed-private-key records and blob newtypes
//! - `message`      — message records and the `{iv, ciphertext}` wire format
//! - `paths`        — document-store addressing

pub mod conversation;
pub mod keys;
pub mod message;
pub mod paths;

pub use conversation::{ConversationId, IdError, ParticipantId};
pub use keys::{ConversationRecord, KeyFormatError, PublicKeyBytes, PublicKeyRecord, SealedKeyRecord, SealedPrivateKey};
pub use message::{MessageBody, MessageRecord, WireCiphertext};

//! Document-store addressing.
//!
//! Collections mirror the backend layout:
//!   conversation/{cid}                      — conversation record
//!   conversation/{cid}/publicKeys/{pid}     — plaintext public key
//!   conversation/{cid}/privateKeys/{pid}    — sealed private key
//!   conversation/{cid}/messages/{mid}       — message documents

use crate::conversation::{ConversationId, ParticipantId};

/// Top-level collection holding one document per conversation.
pub const CONVERSATIONS: &str = "conversation";

pub fn conversation_doc(cid: &ConversationId) -> String {
    format!("{CONVERSATIONS}/{cid}")
}

pub fn public_keys(cid: &ConversationId) -> String {
    format!("{CONVERSATIONS}/{cid}/publicKeys")
}

pub fn public_key_doc(cid: &ConversationId, pid: &ParticipantId) -> String {
    format!("{CONVERSATIONS}/{cid}/publicKeys/{pid}")
}

pub fn private_keys(cid: &ConversationId) -> String {
    format!("{CONVERSATIONS}/{cid}/privateKeys")
}

pub fn private_key_doc(cid: &ConversationId, pid: &ParticipantId) -> String {
    format!("{CONVERSATIONS}/{cid}/privateKeys/{pid}")
}

pub fn messages(cid: &ConversationId) -> String {
    format!("{CONVERSATIONS}/{cid}/messages")
}

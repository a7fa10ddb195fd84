//! Message records and the per-message ciphertext wire format.
//!
//! Every outgoing message is encrypted twice (see `pl_crypto::message`):
//! once for the recipient and once for the sender's own later re-reads.
//! Both payloads travel as JSON text of [`WireCiphertext`] — explicit byte
//! arrays rather than an opaque buffer type, so any client stack can parse
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::ParticipantId;

/// Serialised form of one AEAD ciphertext: `{"iv": [..12 bytes..],
/// "ciphertext": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCiphertext {
    /// 96-bit AES-GCM nonce, fresh per message.
    pub iv: Vec<u8>,
    /// Ciphertext including the 16-byte authentication tag.
    pub ciphertext: Vec<u8>,
}

impl WireCiphertext {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Stored document body under `conversation/{cid}/messages/{mid}`.
///
/// The store assigns the document id and a monotonically increasing
/// timestamp on append; `sent_at` is the sender's wall clock, kept for
/// display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub author: ParticipantId,
    /// JSON text of [`WireCiphertext`] encrypted for the counterpart.
    pub recipient_payload: String,
    /// JSON text of [`WireCiphertext`] encrypted for the author themselves.
    pub sender_payload: String,
    pub sent_at: DateTime<Utc>,
}

/// A message as read back from the store: body plus server-assigned
/// identity and ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    pub author: ParticipantId,
    pub recipient_payload: String,
    pub sender_payload: String,
    pub sent_at: DateTime<Utc>,
    /// Server-assigned, strictly increasing within a conversation.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ciphertext_json_shape() {
        let ct = WireCiphertext {
            iv: vec![0u8; 12],
            ciphertext: vec![1, 2, 3],
        };
        let json = ct.to_json().unwrap();
        assert!(json.contains("\"iv\":[0,0,0,0,0,0,0,0,0,0,0,0]"));
        assert!(json.contains("\"ciphertext\":[1,2,3]"));
        assert_eq!(WireCiphertext::from_json(&json).unwrap(), ct);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(WireCiphertext::from_json("not json").is_err());
        assert!(WireCiphertext::from_json("{\"iv\": \"abc\"}").is_err());
    }
}

//! Participant identifiers and the canonical conversation id.
//!
//! A conversation id is derived by sorting the two participant ids and
//! joining them with `_`, so both parties compute the same id regardless of
//! call order. The separator is excluded from the participant-id alphabet,
//! which keeps the id unambiguously splittable.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the two participant ids inside a conversation id.
pub const ID_SEPARATOR: char = '_';

#[derive(Debug, Error)]
pub enum IdError {
    #[error("Participant id must not be empty")]
    EmptyParticipant,

    #[error("Participant id contains invalid character {0:?} (allowed: ASCII alphanumerics and '-')")]
    InvalidCharacter(char),

    #[error("Malformed conversation id: {0}")]
    MalformedConversationId(String),
}

// ── Participant id ───────────────────────────────────────────────────────────

/// Stable identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Validates the id: non-empty, ASCII alphanumerics plus `-`.
    /// The separator `_` is rejected so conversation ids stay parseable.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::EmptyParticipant);
        }
        if let Some(c) = id.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
            return Err(IdError::InvalidCharacter(c));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ParticipantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── Conversation id ──────────────────────────────────────────────────────────

/// Canonical id of a two-party conversation: the two participant ids,
/// sorted, joined with [`ID_SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Order-independent: `of(a, b) == of(b, a)`.
    pub fn of(a: &ParticipantId, b: &ParticipantId) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{first}{ID_SEPARATOR}{second}"))
    }

    /// Parse a stored conversation id back into its participant pair.
    pub fn parse(id: &str) -> Result<Self, IdError> {
        let (a, b) = id
            .split_once(ID_SEPARATOR)
            .ok_or_else(|| IdError::MalformedConversationId(id.to_string()))?;
        let a = ParticipantId::new(a)?;
        let b = ParticipantId::new(b)?;
        Ok(Self::of(&a, &b))
    }

    /// The two participants, in sorted order.
    pub fn participants(&self) -> (ParticipantId, ParticipantId) {
        // Constructed only via of()/parse(), so the split cannot fail.
        let (a, b) = self
            .0
            .split_once(ID_SEPARATOR)
            .unwrap_or((self.0.as_str(), ""));
        (ParticipantId(a.to_string()), ParticipantId(b.to_string()))
    }

    /// The counterpart of `me`, or `None` if `me` is not a participant.
    pub fn counterpart_of(&self, me: &ParticipantId) -> Option<ParticipantId> {
        let (a, b) = self.participants();
        if &a == me {
            Some(b)
        } else if &b == me {
            Some(a)
        } else {
            None
        }
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        let (a, b) = self.participants();
        &a == participant || &b == participant
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

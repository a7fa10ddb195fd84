//! Identity-provider seam.
//!
//! The core consumes exactly two facts about the signed-in user: a stable
//! participant id and whether their email is verified. Sign-up, sign-in,
//! tokens, and the credential-change primitive all live in the surrounding
//! app.

use pl_proto::ParticipantId;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub participant_id: ParticipantId,
    pub email_verified: bool,
}

pub trait IdentityProvider: Send + Sync {
    /// The currently signed-in user, or `None` when signed out.
    fn current_user(&self) -> Option<AuthUser>;
}

/// Fixed identity for tests and tools.
pub struct StaticIdentity(Option<AuthUser>);

impl StaticIdentity {
    pub fn signed_in(participant_id: ParticipantId, email_verified: bool) -> Self {
        Self(Some(AuthUser {
            participant_id,
            email_verified,
        }))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<AuthUser> {
        self.0.clone()
    }
}

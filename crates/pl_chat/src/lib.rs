//! pl_chat — Key lifecycle orchestration for Parley
//!
//! Sits between the UI and the lower layers: provisions per-conversation
//! key pairs on first open, watches key presence so composition stays
//! blocked until both parties can read, runs the password-change re-seal
//! sweep, and wraps message send/read so decryption failures degrade to
//! sentinel text instead of surfacing errors.
//!
//! All storage and crypto errors are translated into the closed
//! [`LifecycleError`] taxonomy at this boundary; raw primitive errors never
//! reach callers.
//!
//! # Modules
//! - `lifecycle` — provisioning state machine and watcher
//! - `reseal`    — password-change re-seal sweep
//! - `session`   — per-conversation message encryption sessions
//! - `identity`  — identity-provider seam
//! - `error`     — error taxonomy

pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod reseal;
pub mod session;

pub use error::LifecycleError;
pub use identity::{AuthUser, IdentityProvider, StaticIdentity};
pub use lifecycle::{KeyLifecycleManager, ProvisioningState, ProvisioningWatch};
pub use reseal::ResealReport;
pub use session::{ChatSession, DecryptedMessage, UNDECRYPTABLE_DELETED, UNDECRYPTABLE_GENERIC};

//! Error taxonomy at the lifecycle boundary.
//!
//! Callers switch over a closed set instead of probing untyped error
//! shapes. Store and crypto errors are translated on the way in; the
//! variants carry remediation where one exists.

use pl_crypto::CryptoError;
use pl_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Expected absence: a key record that has not been provisioned yet.
    /// Triggers provisioning, not a user-facing failure.
    #[error("Chat keys not found (conversation not yet provisioned)")]
    KeyNotFound,

    /// The backend rejected the operation. Silent retry cannot fix this;
    /// the session token must be refreshed.
    #[error("Authorization denied: {detail}. Log out and back in, then try again.")]
    AuthorizationDenied { detail: String },

    /// Wrong password or corrupted sealed blob.
    #[error("Could not unseal private key (wrong password or corrupted data)")]
    UnwrapFailure,

    /// Unsupported algorithm or parameters. Fatal, never retried.
    #[error("Cryptographic primitive failure: {detail}")]
    CryptoPrimitiveFailure { detail: String },

    /// Backend unavailable or returned malformed data. Neither absence nor
    /// a permission rejection.
    #[error("Storage backend failure: {detail}")]
    Backend { detail: String },
}

impl From<StoreError> for LifecycleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::PermissionDenied(detail) => Self::AuthorizationDenied { detail },
            StoreError::NotFound(_) => Self::KeyNotFound,
            StoreError::Backend(detail) | StoreError::Corrupt(detail) => Self::Backend { detail },
            StoreError::Serialisation(e) => Self::Backend { detail: e.to_string() },
        }
    }
}

impl From<CryptoError> for LifecycleError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::AeadDecrypt => Self::UnwrapFailure,
            other => Self::CryptoPrimitiveFailure { detail: other.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_maps_to_authorization_denied() {
        let err: LifecycleError = StoreError::PermissionDenied("rules".into()).into();
        assert!(matches!(err, LifecycleError::AuthorizationDenied { .. }));
        assert!(err.to_string().contains("Log out and back in"));
    }

    #[test]
    fn aead_decrypt_maps_to_unwrap_failure() {
        let err: LifecycleError = CryptoError::AeadDecrypt.into();
        assert!(matches!(err, LifecycleError::UnwrapFailure));
    }

    #[test]
    fn other_crypto_errors_are_primitive_failures() {
        let err: LifecycleError = CryptoError::InvalidKey("short".into()).into();
        assert!(matches!(err, LifecycleError::CryptoPrimitiveFailure { .. }));
    }
}

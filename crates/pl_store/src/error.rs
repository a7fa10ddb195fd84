use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected the operation with stale or insufficient
    /// credentials. Not retryable without a session refresh.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

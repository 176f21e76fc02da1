use thiserror::Error;

/// Error for session store operations
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Failed to serialize session data: {0}")]
    SerializationFailed(String),

    #[error("Session store error: {0}")]
    StoreError(String),
}

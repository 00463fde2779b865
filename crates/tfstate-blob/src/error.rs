use tfstate_types::BlobPath;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The payload is not acceptable for storage (e.g. empty).
    #[error("invalid payload for {path}: {reason}")]
    InvalidPayload { path: BlobPath, reason: String },

    /// The backing service could not be reached or rejected the request.
    #[error("blob store unavailable: {0}")]
    Unavailable(String),

    /// The backend is misconfigured (missing bucket, bad endpoint, ...).
    #[error("blob store configuration error: {0}")]
    Configuration(String),
}

impl BlobError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Result alias for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;

use tfstate_blob::BlobError;
use tfstate_meta::MetaError;
use tfstate_types::{TypeError, VersionId};

/// Errors produced by engine operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] TypeError),

    #[error("workspace {workspace} is already locked by {holder}")]
    AlreadyLocked { workspace: String, holder: String },

    #[error("no lock found for workspace {0}")]
    LockNotFound(String),

    #[error("lock token does not match the current holder of workspace {0}")]
    InvalidLockToken(String),

    #[error("version {id} not found in workspace {workspace}")]
    VersionNotFound { workspace: String, id: VersionId },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Whether the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::StorageUnavailable(_) | Self::Internal(_))
    }
}

impl From<MetaError> for EngineError {
    fn from(err: MetaError) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

impl From<BlobError> for EngineError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::InvalidPayload { reason, .. } => Self::InvalidPayload(reason),
            other => Self::StorageUnavailable(other.to_string()),
        }
    }
}

/// Convenience type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

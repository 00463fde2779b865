//! Core metadata records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfstate_types::{
    BlobPath, ContentHash, LockToken, OperationId, VersionId, WorkspaceId, WorkspaceName,
};

/// Who holds a workspace lock and since when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Opaque identity of the holder (e.g. `alice@laptop`).
    pub holder: String,
    pub token: LockToken,
    pub acquired_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(token: LockToken, holder: impl Into<String>, acquired_at: DateTime<Utc>) -> Self {
        Self {
            holder: holder.into(),
            token,
            acquired_at,
        }
    }
}

/// Lock fields of a workspace: either all present or all absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockState {
    #[default]
    Unlocked,
    Locked(LockInfo),
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked(_))
    }

    /// The lock, if held.
    pub fn info(&self) -> Option<&LockInfo> {
        match self {
            Self::Locked(info) => Some(info),
            Self::Unlocked => None,
        }
    }

    /// Whether the lock is held with exactly this token.
    pub fn is_held_by(&self, token: &LockToken) -> bool {
        self.info().is_some_and(|info| &info.token == token)
    }

    /// Rebuild a lock state from nullable columns.
    ///
    /// Returns `Err` with a reason when only some of the fields are set.
    pub fn from_parts(
        holder: Option<String>,
        token: Option<String>,
        acquired_at: Option<DateTime<Utc>>,
    ) -> Result<Self, String> {
        match (holder, token, acquired_at) {
            (None, None, None) => Ok(Self::Unlocked),
            (Some(holder), Some(token), Some(acquired_at)) => {
                let token = LockToken::new(token).map_err(|e| e.to_string())?;
                Ok(Self::Locked(LockInfo {
                    holder,
                    token,
                    acquired_at,
                }))
            }
            (holder, token, acquired_at) => Err(format!(
                "partial lock state (holder: {}, token: {}, acquired_at: {})",
                holder.is_some(),
                token.is_some(),
                acquired_at.is_some()
            )),
        }
    }
}

/// A named unit of state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: WorkspaceName,
    pub lock: LockState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable record of one saved state snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub workspace_id: WorkspaceId,
    pub content_hash: ContentHash,
    pub blob_path: BlobPath,
    pub operation_id: OperationId,
    pub created_at: DateTime<Utc>,
}

/// Input for appending a version; id and timestamp are assigned by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewVersion {
    pub workspace_id: WorkspaceId,
    pub content_hash: ContentHash,
    pub blob_path: BlobPath,
    pub operation_id: OperationId,
}

/// Outcome of an atomic lock attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockAttempt {
    /// The caller now holds the lock. The workspace may have just been created.
    Acquired(Workspace),
    /// Someone (possibly the same token) already holds it; nothing changed.
    Held(Workspace),
}

/// Outcome of an atomic unlock attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Release {
    /// Lock fields were cleared.
    Released(Workspace),
    /// The workspace exists but its lock is not held with the supplied token.
    Refused,
    /// No workspace with that name exists.
    NotFound,
}

//! The [`MetadataStore`] trait defining the metadata storage interface.
//!
//! Any backend (in-memory, PostgreSQL) implements this trait. The engine's
//! lock manager, version store and coordinator depend only on it.

use async_trait::async_trait;
use tfstate_types::{LockToken, VersionId, WorkspaceId, WorkspaceName};

use crate::error::MetaResult;
use crate::records::{LockAttempt, LockInfo, NewVersion, Release, Version, Workspace};

/// Storage backend for workspace records and version history.
///
/// Implementations must be thread-safe (`Send + Sync`) and must execute each
/// mutating method as one serializable operation: two concurrent
/// [`try_lock`](MetadataStore::try_lock) calls on the same name can never
/// both return [`LockAttempt::Acquired`].
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Look up a workspace by name.
    async fn workspace(&self, name: &WorkspaceName) -> MetaResult<Option<Workspace>>;

    /// Atomically acquire the lock on `name`.
    ///
    /// Creates the workspace already locked if it does not exist. If the
    /// workspace exists unlocked, sets all lock fields. If it is locked by
    /// anyone, including the same token, leaves it untouched and returns
    /// [`LockAttempt::Held`].
    async fn try_lock(&self, name: &WorkspaceName, lock: &LockInfo) -> MetaResult<LockAttempt>;

    /// Atomically clear the lock on `name` if it is held with `token`.
    async fn release_lock(&self, name: &WorkspaceName, token: &LockToken) -> MetaResult<Release>;

    /// Create the workspace if absent, otherwise bump its `updated_at`.
    ///
    /// Lock fields are never touched.
    async fn upsert_workspace(&self, name: &WorkspaceName) -> MetaResult<Workspace>;

    /// Durably append a version and return it with its assigned id and time.
    async fn append_version(&self, version: &NewVersion) -> MetaResult<Version>;

    /// All versions of a workspace, newest first (ties broken by id, descending).
    async fn list_versions(&self, workspace_id: WorkspaceId) -> MetaResult<Vec<Version>>;

    /// One version, only if it belongs to `workspace_id`.
    async fn get_version(
        &self,
        workspace_id: WorkspaceId,
        version_id: VersionId,
    ) -> MetaResult<Option<Version>>;

    /// The newest version of a workspace.
    ///
    /// Default implementation takes the head of `list_versions`. Backends
    /// should override with a bounded query.
    async fn latest_version(&self, workspace_id: WorkspaceId) -> MetaResult<Option<Version>> {
        Ok(self.list_versions(workspace_id).await?.into_iter().next())
    }
}

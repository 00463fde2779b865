//! Store doubles that fail on demand.

use async_trait::async_trait;
use bytes::Bytes;
use tfstate_blob::{BlobError, BlobResult, BlobStore};
use tfstate_meta::{
    InMemoryMetadataStore, LockAttempt, LockInfo, MetaError, MetaResult, MetadataStore,
    NewVersion, Release, Version, Workspace,
};
use tfstate_types::{BlobPath, LockToken, VersionId, WorkspaceId, WorkspaceName};

/// Behaves like [`InMemoryMetadataStore`] except that appends always fail.
#[derive(Default)]
pub struct FailingAppendStore {
    inner: InMemoryMetadataStore,
}

#[async_trait]
impl MetadataStore for FailingAppendStore {
    async fn workspace(&self, name: &WorkspaceName) -> MetaResult<Option<Workspace>> {
        self.inner.workspace(name).await
    }

    async fn try_lock(&self, name: &WorkspaceName, lock: &LockInfo) -> MetaResult<LockAttempt> {
        self.inner.try_lock(name, lock).await
    }

    async fn release_lock(&self, name: &WorkspaceName, token: &LockToken) -> MetaResult<Release> {
        self.inner.release_lock(name, token).await
    }

    async fn upsert_workspace(&self, name: &WorkspaceName) -> MetaResult<Workspace> {
        self.inner.upsert_workspace(name).await
    }

    async fn append_version(&self, _version: &NewVersion) -> MetaResult<Version> {
        Err(MetaError::Poisoned("injected append failure".into()))
    }

    async fn list_versions(&self, workspace_id: WorkspaceId) -> MetaResult<Vec<Version>> {
        self.inner.list_versions(workspace_id).await
    }

    async fn get_version(
        &self,
        workspace_id: WorkspaceId,
        version_id: VersionId,
    ) -> MetaResult<Option<Version>> {
        self.inner.get_version(workspace_id, version_id).await
    }
}

/// A blob store whose backend is unreachable.
pub struct UnavailableBlobStore;

#[async_trait]
impl BlobStore for UnavailableBlobStore {
    async fn get(&self, path: &BlobPath) -> BlobResult<Option<Bytes>> {
        Err(BlobError::unavailable(format!("get {path}: connection refused")))
    }

    async fn put(&self, path: &BlobPath, _data: Bytes) -> BlobResult<()> {
        Err(BlobError::unavailable(format!("put {path}: connection refused")))
    }

    async fn delete(&self, path: &BlobPath) -> BlobResult<bool> {
        Err(BlobError::unavailable(format!("delete {path}: connection refused")))
    }

    async fn ensure_container_exists(&self) -> BlobResult<()> {
        Err(BlobError::unavailable("head bucket: connection refused"))
    }
}

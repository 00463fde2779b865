//! Append-only version history.

use std::sync::Arc;

use tfstate_meta::{MetadataStore, NewVersion, Version};
use tfstate_types::{BlobPath, ContentHash, OperationId, VersionId, WorkspaceId};

use crate::error::EngineResult;

/// Appends and queries immutable [`Version`] records.
#[derive(Clone)]
pub struct VersionStore {
    meta: Arc<dyn MetadataStore>,
}

impl VersionStore {
    pub fn new(meta: Arc<dyn MetadataStore>) -> Self {
        Self { meta }
    }

    /// Persist a new version.
    ///
    /// The blob at `blob_path` must already be durably written.
    pub async fn append(
        &self,
        workspace_id: WorkspaceId,
        content_hash: ContentHash,
        blob_path: BlobPath,
        operation_id: OperationId,
    ) -> EngineResult<Version> {
        let version = self
            .meta
            .append_version(&NewVersion {
                workspace_id,
                content_hash,
                blob_path,
                operation_id,
            })
            .await?;
        tracing::debug!(workspace_id = %workspace_id, version = %version.id, "version appended");
        Ok(version)
    }

    /// Newest first; ties on creation time go to the higher id.
    pub async fn list(&self, workspace_id: WorkspaceId) -> EngineResult<Vec<Version>> {
        Ok(self.meta.list_versions(workspace_id).await?)
    }

    /// A version, only if it belongs to `workspace_id`.
    pub async fn get(
        &self,
        workspace_id: WorkspaceId,
        version_id: VersionId,
    ) -> EngineResult<Option<Version>> {
        Ok(self.meta.get_version(workspace_id, version_id).await?)
    }

    pub async fn latest(&self, workspace_id: WorkspaceId) -> EngineResult<Option<Version>> {
        Ok(self.meta.latest_version(workspace_id).await?)
    }
}

//! In-memory metadata store for testing and ephemeral use.
//!
//! [`InMemoryMetadataStore`] keeps all records behind a single `RwLock`, so
//! every read-modify-write runs under one exclusive guard. That gives the
//! same linearizability the PostgreSQL backend gets from conditional
//! statements.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use tfstate_types::{LockToken, VersionId, WorkspaceId, WorkspaceName};

use crate::error::{MetaError, MetaResult};
use crate::records::{LockAttempt, LockInfo, LockState, NewVersion, Release, Version, Workspace};
use crate::traits::MetadataStore;

/// An in-memory implementation of [`MetadataStore`].
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    inner: RwLock<MetaState>,
}

#[derive(Debug, Default)]
struct MetaState {
    workspaces: HashMap<WorkspaceName, Workspace>,
    versions: Vec<Version>,
    next_workspace_id: i64,
    next_version_id: i64,
}

impl MetaState {
    fn create_workspace(&mut self, name: &WorkspaceName, lock: LockState) -> Workspace {
        self.next_workspace_id += 1;
        let now = Utc::now();
        let workspace = Workspace {
            id: WorkspaceId(self.next_workspace_id),
            name: name.clone(),
            lock,
            created_at: now,
            updated_at: now,
        };
        self.workspaces.insert(name.clone(), workspace.clone());
        workspace
    }
}

impl InMemoryMetadataStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of workspace records.
    pub fn workspace_count(&self) -> usize {
        self.read().map(|s| s.workspaces.len()).unwrap_or(0)
    }

    /// Number of version records across all workspaces.
    pub fn version_count(&self) -> usize {
        self.read().map(|s| s.versions.len()).unwrap_or(0)
    }

    fn read(&self) -> MetaResult<RwLockReadGuard<'_, MetaState>> {
        self.inner
            .read()
            .map_err(|e| MetaError::Poisoned(e.to_string()))
    }

    fn write(&self) -> MetaResult<RwLockWriteGuard<'_, MetaState>> {
        self.inner
            .write()
            .map_err(|e| MetaError::Poisoned(e.to_string()))
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn workspace(&self, name: &WorkspaceName) -> MetaResult<Option<Workspace>> {
        Ok(self.read()?.workspaces.get(name).cloned())
    }

    async fn try_lock(&self, name: &WorkspaceName, lock: &LockInfo) -> MetaResult<LockAttempt> {
        let mut state = self.write()?;

        match state.workspaces.get_mut(name) {
            None => {
                let created = state.create_workspace(name, LockState::Locked(lock.clone()));
                Ok(LockAttempt::Acquired(created))
            }
            Some(existing) if existing.lock.is_locked() => Ok(LockAttempt::Held(existing.clone())),
            Some(existing) => {
                existing.lock = LockState::Locked(lock.clone());
                existing.updated_at = Utc::now();
                Ok(LockAttempt::Acquired(existing.clone()))
            }
        }
    }

    async fn release_lock(&self, name: &WorkspaceName, token: &LockToken) -> MetaResult<Release> {
        let mut state = self.write()?;

        let Some(existing) = state.workspaces.get_mut(name) else {
            return Ok(Release::NotFound);
        };
        if !existing.lock.is_held_by(token) {
            return Ok(Release::Refused);
        }

        existing.lock = LockState::Unlocked;
        existing.updated_at = Utc::now();
        Ok(Release::Released(existing.clone()))
    }

    async fn upsert_workspace(&self, name: &WorkspaceName) -> MetaResult<Workspace> {
        let mut state = self.write()?;

        if let Some(existing) = state.workspaces.get_mut(name) {
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }
        Ok(state.create_workspace(name, LockState::Unlocked))
    }

    async fn append_version(&self, version: &NewVersion) -> MetaResult<Version> {
        let mut state = self.write()?;

        if !state
            .workspaces
            .values()
            .any(|w| w.id == version.workspace_id)
        {
            return Err(MetaError::WorkspaceNotFound(version.workspace_id.to_string()));
        }

        state.next_version_id += 1;
        let record = Version {
            id: VersionId(state.next_version_id),
            workspace_id: version.workspace_id,
            content_hash: version.content_hash,
            blob_path: version.blob_path.clone(),
            operation_id: version.operation_id.clone(),
            created_at: Utc::now(),
        };
        state.versions.push(record.clone());
        Ok(record)
    }

    async fn list_versions(&self, workspace_id: WorkspaceId) -> MetaResult<Vec<Version>> {
        let state = self.read()?;
        let mut versions: Vec<Version> = state
            .versions
            .iter()
            .filter(|v| v.workspace_id == workspace_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(versions)
    }

    async fn get_version(
        &self,
        workspace_id: WorkspaceId,
        version_id: VersionId,
    ) -> MetaResult<Option<Version>> {
        let state = self.read()?;
        Ok(state
            .versions
            .iter()
            .find(|v| v.id == version_id && v.workspace_id == workspace_id)
            .cloned())
    }
}

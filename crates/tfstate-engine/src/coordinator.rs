//! Save and read orchestration across the blob and metadata stores.

use std::sync::Arc;

use bytes::Bytes;
use tfstate_blob::BlobStore;
use tfstate_meta::{MetadataStore, Version, Workspace};
use tfstate_types::{BlobPath, ContentHash, OperationId, VersionId, WorkspaceName};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::initial::InitialState;
use crate::lock::LockManager;
use crate::versions::VersionStore;

/// Orchestrates saves (hash, write blob, commit metadata, append version)
/// and reads (latest version, fetch blob, fall back to an initial state).
pub struct StateCoordinator {
    meta: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    versions: VersionStore,
    locks: LockManager,
    config: EngineConfig,
}

impl StateCoordinator {
    pub fn new(
        meta: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            versions: VersionStore::new(Arc::clone(&meta)),
            locks: LockManager::new(Arc::clone(&meta)),
            meta,
            blobs,
            config,
        }
    }

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The latest saved bytes, or a synthesized initial state.
    ///
    /// Stored bytes are returned exactly as they were saved.
    pub async fn read(&self, name: &WorkspaceName) -> EngineResult<Bytes> {
        let Some(workspace) = self.meta.workspace(name).await? else {
            tracing::debug!(workspace = %name, "no workspace; serving initial state");
            return self.initial_state();
        };

        let Some(latest) = self.versions.latest(workspace.id).await? else {
            tracing::debug!(workspace = %name, "no versions; serving initial state");
            return self.initial_state();
        };

        match self.blobs.get(&latest.blob_path).await? {
            Some(bytes) => Ok(bytes),
            None => {
                tracing::warn!(
                    workspace = %name,
                    version = %latest.id,
                    blob_path = %latest.blob_path,
                    "latest version's blob is missing; serving initial state"
                );
                self.initial_state()
            }
        }
    }

    /// Store a new state snapshot and record it as the latest version.
    ///
    /// Validation happens before any store is touched. The blob is written
    /// before the version row, so a committed version never points at a
    /// blob that was not written.
    pub async fn save(
        &self,
        name: &WorkspaceName,
        payload: Bytes,
        operation_id: &OperationId,
    ) -> EngineResult<Version> {
        validate_state_document(&payload)?;

        let content_hash = ContentHash::of(&payload);
        let blob_path = self.config.blob_path(name, &content_hash, operation_id);

        self.blobs.ensure_container_exists().await?;
        self.blobs.put(&blob_path, payload).await?;

        let version = match self.commit(name, content_hash, &blob_path, operation_id).await {
            Ok(version) => version,
            Err(err) => {
                tracing::error!(
                    workspace = %name,
                    operation_id = %operation_id,
                    blob_path = %blob_path,
                    error = %err,
                    "orphaned blob: state written but version was not recorded"
                );
                return Err(EngineError::StorageUnavailable(format!(
                    "version for {name} was not recorded: {err}"
                )));
            }
        };

        tracing::info!(
            workspace = %name,
            operation_id = %operation_id,
            version = %version.id,
            hash = %content_hash.short_hex(),
            "state saved"
        );
        Ok(version)
    }

    /// All versions of a workspace, newest first. Empty if it does not exist.
    pub async fn versions(&self, name: &WorkspaceName) -> EngineResult<Vec<Version>> {
        match self.meta.workspace(name).await? {
            Some(workspace) => self.versions.list(workspace.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn version(&self, name: &WorkspaceName, id: VersionId) -> EngineResult<Version> {
        let not_found = || EngineError::VersionNotFound {
            workspace: name.to_string(),
            id,
        };
        let workspace = self.meta.workspace(name).await?.ok_or_else(not_found)?;
        self.versions
            .get(workspace.id, id)
            .await?
            .ok_or_else(not_found)
    }

    /// The bytes saved under a specific version.
    pub async fn read_version(&self, name: &WorkspaceName, id: VersionId) -> EngineResult<Bytes> {
        let version = self.version(name, id).await?;
        self.blobs.get(&version.blob_path).await?.ok_or_else(|| {
            tracing::warn!(workspace = %name, version = %id, blob_path = %version.blob_path, "version blob is missing");
            EngineError::VersionNotFound {
                workspace: name.to_string(),
                id,
            }
        })
    }

    async fn commit(
        &self,
        name: &WorkspaceName,
        content_hash: ContentHash,
        blob_path: &BlobPath,
        operation_id: &OperationId,
    ) -> EngineResult<Version> {
        let workspace: Workspace = self.meta.upsert_workspace(name).await?;
        self.versions
            .append(
                workspace.id,
                content_hash,
                blob_path.clone(),
                operation_id.clone(),
            )
            .await
    }

    fn initial_state(&self) -> EngineResult<Bytes> {
        let document = InitialState::new(&self.config.terraform_version).to_bytes()?;
        Ok(Bytes::from(document))
    }
}

/// A state document must be a non-empty JSON object.
fn validate_state_document(payload: &[u8]) -> EngineResult<()> {
    if payload.is_empty() {
        return Err(EngineError::InvalidPayload("state body is empty".into()));
    }
    let value: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| EngineError::InvalidPayload(format!("state is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(EngineError::InvalidPayload(
            "state must be a JSON object".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingAppendStore, UnavailableBlobStore};
    use proptest::prelude::*;
    use tfstate_blob::InMemoryBlobStore;
    use tfstate_meta::InMemoryMetadataStore;

    struct Fixture {
        meta: Arc<InMemoryMetadataStore>,
        blobs: Arc<InMemoryBlobStore>,
        coordinator: StateCoordinator,
    }

    fn fixture() -> Fixture {
        let meta = Arc::new(InMemoryMetadataStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let coordinator =
            StateCoordinator::new(meta.clone(), blobs.clone(), EngineConfig::default());
        Fixture {
            meta,
            blobs,
            coordinator,
        }
    }

    fn name(s: &str) -> WorkspaceName {
        WorkspaceName::new(s).unwrap()
    }

    fn op(s: &str) -> OperationId {
        OperationId::new(s).unwrap()
    }

    fn parse(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn save_list_get_read_scenario() {
        let f = fixture();
        let body = Bytes::from_static(br#"{"version":4,"lineage":"x"}"#);

        let saved = f
            .coordinator
            .save(&name("infra"), body.clone(), &op("op-1"))
            .await
            .unwrap();

        let versions = f.coordinator.versions(&name("infra")).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].operation_id.as_str(), "op-1");
        assert_eq!(versions[0], saved);

        let fetched = f.coordinator.version(&name("infra"), saved.id).await.unwrap();
        assert_eq!(fetched, saved);

        assert_eq!(f.coordinator.read(&name("infra")).await.unwrap(), body);
    }

    #[tokio::test]
    async fn save_hashes_exact_bytes_and_writes_blob_first() {
        let f = fixture();
        let body = Bytes::from_static(b"{ \"serial\" : 1 }");
        let saved = f
            .coordinator
            .save(&name("infra"), body.clone(), &op("op-1"))
            .await
            .unwrap();

        assert_eq!(saved.content_hash, ContentHash::of(&body));
        assert_eq!(
            saved.blob_path.as_str(),
            format!("states/infra/{}_op-1", saved.content_hash)
        );
        assert!(f.blobs.container_ready());
        assert_eq!(f.blobs.get(&saved.blob_path).await.unwrap(), Some(body));
    }

    #[tokio::test]
    async fn read_of_absent_workspace_is_initial_state() {
        let f = fixture();
        let a = parse(&f.coordinator.read(&name("nothing")).await.unwrap());
        let b = parse(&f.coordinator.read(&name("nothing")).await.unwrap());

        assert_eq!(a["version"], 4);
        assert_eq!(a["serial"], 0);
        assert_eq!(a["terraform_version"], "1.9.0");
        assert!(!a["lineage"].as_str().unwrap().is_empty());
        assert_ne!(a["lineage"], b["lineage"]);
        assert_eq!(f.meta.workspace_count(), 0);
    }

    #[tokio::test]
    async fn read_of_locked_but_never_saved_workspace_is_initial_state() {
        let f = fixture();
        let lock = tfstate_meta::LockInfo::new(
            tfstate_types::LockToken::new("abc").unwrap(),
            "alice",
            chrono::Utc::now(),
        );
        f.coordinator.locks().lock(&name("w"), &lock).await.unwrap();

        let state = parse(&f.coordinator.read(&name("w")).await.unwrap());
        assert_eq!(state["serial"], 0);
    }

    #[tokio::test]
    async fn read_falls_back_when_latest_blob_is_missing() {
        let f = fixture();
        let saved = f
            .coordinator
            .save(&name("w"), Bytes::from_static(br#"{"serial":7}"#), &op("op-1"))
            .await
            .unwrap();
        f.blobs.delete(&saved.blob_path).await.unwrap();

        let state = parse(&f.coordinator.read(&name("w")).await.unwrap());
        assert_eq!(state["serial"], 0);

        let err = f
            .coordinator
            .read_version(&name("w"), saved.id)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::VersionNotFound { .. }));
    }

    #[tokio::test]
    async fn read_returns_latest_save() {
        let f = fixture();
        f.coordinator
            .save(&name("w"), Bytes::from_static(br#"{"serial":1}"#), &op("op-1"))
            .await
            .unwrap();
        f.coordinator
            .save(&name("w"), Bytes::from_static(br#"{"serial":2}"#), &op("op-2"))
            .await
            .unwrap();

        assert_eq!(
            f.coordinator.read(&name("w")).await.unwrap(),
            Bytes::from_static(br#"{"serial":2}"#)
        );
    }

    #[tokio::test]
    async fn invalid_payloads_touch_nothing() {
        let f = fixture();
        let bodies: [&[u8]; 5] = [b"", b"not json", b"[1,2,3]", b"\"text\"", b"{\"open\":"];
        for body in bodies {
            let err = f
                .coordinator
                .save(&name("w"), Bytes::copy_from_slice(body), &op("op-1"))
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::InvalidPayload(_)), "{body:?}");
        }
        assert!(f.blobs.is_empty());
        assert!(!f.blobs.container_ready());
        assert_eq!(f.meta.workspace_count(), 0);
    }

    #[tokio::test]
    async fn resave_same_operation_reuses_path() {
        let f = fixture();
        let body = Bytes::from_static(br#"{"serial":1}"#);
        let first = f
            .coordinator
            .save(&name("w"), body.clone(), &op("op-1"))
            .await
            .unwrap();
        let retry = f
            .coordinator
            .save(&name("w"), body.clone(), &op("op-1"))
            .await
            .unwrap();
        let other = f
            .coordinator
            .save(&name("w"), body, &op("op-2"))
            .await
            .unwrap();

        assert_eq!(first.blob_path, retry.blob_path);
        assert_ne!(first.blob_path, other.blob_path);
        assert_eq!(f.blobs.len(), 2);
        assert_eq!(f.coordinator.versions(&name("w")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn versions_of_absent_workspace_is_empty() {
        let f = fixture();
        assert!(f.coordinator.versions(&name("nope")).await.unwrap().is_empty());
        assert!(matches!(
            f.coordinator.version(&name("nope"), VersionId(1)).await,
            Err(EngineError::VersionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn version_lookup_is_workspace_scoped() {
        let f = fixture();
        let in_b = f
            .coordinator
            .save(&name("b"), Bytes::from_static(b"{}"), &op("op-b"))
            .await
            .unwrap();
        f.coordinator
            .save(&name("a"), Bytes::from_static(b"{}"), &op("op-a"))
            .await
            .unwrap();

        let err = f.coordinator.version(&name("a"), in_b.id).await.unwrap_err();
        assert_eq!(
            err,
            EngineError::VersionNotFound {
                workspace: "a".into(),
                id: in_b.id
            }
        );
        assert_eq!(
            f.coordinator.read_version(&name("b"), in_b.id).await.unwrap(),
            Bytes::from_static(b"{}")
        );
    }

    #[tokio::test]
    async fn save_does_not_touch_lock() {
        let f = fixture();
        let token = tfstate_types::LockToken::new("abc").unwrap();
        let lock = tfstate_meta::LockInfo::new(token.clone(), "alice", chrono::Utc::now());
        f.coordinator.locks().lock(&name("w"), &lock).await.unwrap();

        f.coordinator
            .save(&name("w"), Bytes::from_static(b"{}"), &op("op-1"))
            .await
            .unwrap();

        let state = f.coordinator.locks().status(&name("w")).await.unwrap().unwrap();
        assert!(state.is_held_by(&token));
    }

    #[tokio::test]
    async fn failed_append_reports_storage_unavailable_and_leaves_no_version() {
        let meta = Arc::new(FailingAppendStore::default());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let coordinator =
            StateCoordinator::new(meta.clone(), blobs.clone(), EngineConfig::default());

        let err = coordinator
            .save(&name("w"), Bytes::from_static(b"{}"), &op("op-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::StorageUnavailable(_)));

        // The blob is orphaned; the history stays consistent.
        assert_eq!(blobs.len(), 1);
        assert!(coordinator.versions(&name("w")).await.unwrap().is_empty());
        let state = parse(&coordinator.read(&name("w")).await.unwrap());
        assert_eq!(state["serial"], 0);
    }

    #[tokio::test]
    async fn blob_outage_fails_before_metadata() {
        let meta = Arc::new(InMemoryMetadataStore::new());
        let coordinator = StateCoordinator::new(
            meta.clone(),
            Arc::new(UnavailableBlobStore),
            EngineConfig::default(),
        );

        let err = coordinator
            .save(&name("w"), Bytes::from_static(b"{}"), &op("op-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::StorageUnavailable(_)));
        assert_eq!(meta.workspace_count(), 0);
        assert_eq!(meta.version_count(), 0);
    }

    proptest! {
        #[test]
        fn save_then_read_round_trips_bytes(
            keys in proptest::collection::vec("[a-z]{1,8}", 0..5),
            pad in "[ \n\t]{0,3}",
        ) {
            let body = format!(
                "{pad}{{{}}}{pad}",
                keys.iter()
                    .enumerate()
                    .map(|(i, k)| format!("\"{k}{i}\": {i}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let read = rt.block_on(async {
                let f = fixture();
                f.coordinator
                    .save(&name("w"), Bytes::from(body.clone()), &op("op"))
                    .await
                    .unwrap();
                f.coordinator.read(&name("w")).await.unwrap()
            });
            prop_assert_eq!(read, Bytes::from(body));
        }
    }
}

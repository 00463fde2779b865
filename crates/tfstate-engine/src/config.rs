use serde::{Deserialize, Serialize};
use tfstate_types::{BlobPath, ContentHash, OperationId, WorkspaceName};

/// Engine settings, built once at startup and handed to the coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `terraform_version` written into synthesized initial states.
    pub terraform_version: String,
    /// Leading segment of every blob path.
    pub blob_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            terraform_version: "1.9.0".into(),
            blob_prefix: "states".into(),
        }
    }
}

impl EngineConfig {
    /// `<prefix>/<workspace>/<hash>_<operation_id>`.
    ///
    /// Distinct operation ids always yield distinct paths, even for identical
    /// content.
    pub fn blob_path(
        &self,
        workspace: &WorkspaceName,
        hash: &ContentHash,
        operation_id: &OperationId,
    ) -> BlobPath {
        let prefix = self.blob_prefix.trim_matches('/');
        if prefix.is_empty() {
            BlobPath::new(format!("{workspace}/{hash}_{operation_id}"))
        } else {
            BlobPath::new(format!("{prefix}/{workspace}/{hash}_{operation_id}"))
        }
    }
}

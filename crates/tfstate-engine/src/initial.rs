use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Format version of the state documents this backend synthesizes.
pub const STATE_FORMAT_VERSION: u32 = 4;

/// The state returned for a workspace that has nothing stored yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitialState {
    pub version: u32,
    pub terraform_version: String,
    pub serial: u64,
    pub lineage: String,
    pub outputs: serde_json::Map<String, serde_json::Value>,
    pub resources: Vec<serde_json::Value>,
    pub check_results: Option<serde_json::Value>,
}

impl InitialState {
    /// A fresh empty state with a newly generated lineage.
    pub fn new(terraform_version: impl Into<String>) -> Self {
        Self {
            version: STATE_FORMAT_VERSION,
            terraform_version: terraform_version.into(),
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            outputs: serde_json::Map::new(),
            resources: Vec::new(),
            check_results: None,
        }
    }

    pub fn to_bytes(&self) -> EngineResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| EngineError::Internal(format!("rendering initial state: {e}")))
    }
}

//! Handlers for the OpenTofu/Terraform HTTP backend protocol.

use axum::extract::{Path, Query, State};
use axum::http::{header, Method, Uri};
use axum::Extension;
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tfstate_meta::{LockInfo, Version};
use tfstate_types::{LockToken, OperationId, VersionId, WorkspaceName};

use crate::auth::Identity;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Body of successful mutations.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusBody {
    pub status: String,
}

impl StatusBody {
    fn ok() -> Json<Self> {
        Json(Self {
            status: "ok".into(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionList {
    pub data: Vec<Version>,
}

/// Lock info as sent by OpenTofu on LOCK and UNLOCK.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LockRequest {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Operation")]
    pub operation: String,
    #[serde(rename = "Info")]
    pub info: String,
    #[serde(rename = "Who")]
    pub who: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Created")]
    pub created: Option<DateTime<Utc>>,
    #[serde(rename = "Path")]
    pub path: String,
}

impl LockRequest {
    fn parse(body: &[u8]) -> ServerResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ServerError::BadRequest(format!("invalid lock info: {e}")))
    }

    fn holder(&self) -> &str {
        [self.who.as_str(), self.info.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveParams {
    #[serde(rename = "ID")]
    pub id: Option<String>,
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "tfstate",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment,
    }))
}

/// Non-GET requests to `/health` and `/info`.
///
/// Those paths are reserved, so a state client pointed at them gets the same
/// invalid-name error for every method instead of a partial protocol.
pub async fn reserved_path(uri: Uri) -> ServerError {
    let segment = uri.path().trim_start_matches('/');
    match WorkspaceName::new(segment) {
        Err(err) => err.into(),
        Ok(_) => ServerError::BadRequest(format!("{segment} is not a workspace")),
    }
}

pub async fn get_state(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
) -> ServerResult<Response> {
    let name = WorkspaceName::new(workspace)?;
    let bytes = state.coordinator.read(&name).await?;
    Ok(json_bytes(bytes))
}

pub async fn save_state(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    Query(params): Query<SaveParams>,
    Extension(identity): Extension<Identity>,
    body: Bytes,
) -> ServerResult<Json<StatusBody>> {
    let name = WorkspaceName::new(workspace)?;
    let operation_id = match params.id.filter(|id| !id.is_empty()) {
        Some(id) => OperationId::new(id)?,
        None => OperationId::new(uuid::Uuid::new_v4().to_string())?,
    };

    tracing::info!(
        workspace = %name,
        operation_id = %operation_id,
        client = %identity.name,
        bytes = body.len(),
        "saving state"
    );
    state.coordinator.save(&name, body, &operation_id).await?;
    Ok(StatusBody::ok())
}

/// `/{workspace}` accepts LOCK and UNLOCK alongside GET and POST.
pub async fn lock_dispatch(
    state: State<AppState>,
    workspace: Path<String>,
    identity: Extension<Identity>,
    method: Method,
    body: Bytes,
) -> ServerResult<Json<StatusBody>> {
    match method.as_str() {
        "LOCK" => lock(state, workspace, identity, body).await,
        "UNLOCK" => unlock(state, workspace, identity, body).await,
        other => Err(ServerError::MethodNotAllowed(other.to_string())),
    }
}

pub async fn lock_handler(
    state: State<AppState>,
    workspace: Path<String>,
    identity: Extension<Identity>,
    method: Method,
    body: Bytes,
) -> ServerResult<Json<StatusBody>> {
    if method.as_str() != "LOCK" {
        return Err(ServerError::MethodNotAllowed(method.to_string()));
    }
    lock(state, workspace, identity, body).await
}

pub async fn unlock_handler(
    state: State<AppState>,
    workspace: Path<String>,
    identity: Extension<Identity>,
    method: Method,
    body: Bytes,
) -> ServerResult<Json<StatusBody>> {
    if method.as_str() != "UNLOCK" {
        return Err(ServerError::MethodNotAllowed(method.to_string()));
    }
    unlock(state, workspace, identity, body).await
}

async fn lock(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    Extension(identity): Extension<Identity>,
    body: Bytes,
) -> ServerResult<Json<StatusBody>> {
    let name = WorkspaceName::new(workspace)?;
    let request = LockRequest::parse(&body)?;
    let token = LockToken::new(request.id.as_str())?;

    tracing::debug!(
        workspace = %name,
        client = %identity.name,
        operation = %request.operation,
        path = %request.path,
        client_version = %request.version,
        "lock requested"
    );

    let info = LockInfo::new(
        token,
        request.holder(),
        request.created.unwrap_or_else(Utc::now),
    );
    state.coordinator.locks().lock(&name, &info).await?;
    Ok(StatusBody::ok())
}

async fn unlock(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    Extension(identity): Extension<Identity>,
    body: Bytes,
) -> ServerResult<Json<StatusBody>> {
    let name = WorkspaceName::new(workspace)?;
    let request = LockRequest::parse(&body)?;
    let token = LockToken::new(request.id)?;

    tracing::debug!(workspace = %name, client = %identity.name, "unlock requested");

    state.coordinator.locks().release(&name, &token).await?;
    Ok(StatusBody::ok())
}

pub async fn list_versions(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
) -> ServerResult<Json<VersionList>> {
    let name = WorkspaceName::new(workspace)?;
    let data = state.coordinator.versions(&name).await?;
    Ok(Json(VersionList { data }))
}

pub async fn get_version(
    State(state): State<AppState>,
    Path((workspace, id)): Path<(String, String)>,
) -> ServerResult<Json<Version>> {
    let name = WorkspaceName::new(workspace)?;
    let id: VersionId = id.parse()?;
    Ok(Json(state.coordinator.version(&name, id).await?))
}

pub async fn get_version_content(
    State(state): State<AppState>,
    Path((workspace, id)): Path<(String, String)>,
) -> ServerResult<Response> {
    let name = WorkspaceName::new(workspace)?;
    let id: VersionId = id.parse()?;
    let bytes = state.coordinator.read_version(&name, id).await?;
    Ok(json_bytes(bytes))
}

fn json_bytes(bytes: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], bytes).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_request_parses_opentofu_body() {
        let request = LockRequest::parse(
            br#"{"ID":"9b1c0d2e","Operation":"OperationTypeApply","Info":"",
                 "Who":"alice@laptop","Version":"1.9.0",
                 "Created":"2024-03-16T12:00:00.123456Z","Path":""}"#,
        )
        .unwrap();
        assert_eq!(request.id, "9b1c0d2e");
        assert_eq!(request.holder(), "alice@laptop");
        assert_eq!(
            request.created.unwrap().to_rfc3339(),
            "2024-03-16T12:00:00.123456+00:00"
        );
    }

    #[test]
    fn holder_falls_back_to_info_then_unknown() {
        let request = LockRequest {
            info: "ci job 42".into(),
            ..LockRequest::default()
        };
        assert_eq!(request.holder(), "ci job 42");
        assert_eq!(LockRequest::default().holder(), "unknown");
    }

    #[test]
    fn empty_body_is_missing_id() {
        let request = LockRequest::parse(b"  \n").unwrap();
        assert!(request.id.is_empty());
        assert!(LockToken::new(request.id).is_err());
    }

    #[test]
    fn malformed_body_is_bad_request() {
        assert!(matches!(
            LockRequest::parse(b"{not json"),
            Err(ServerError::BadRequest(_))
        ));
    }
}

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Header carrying the API token.
pub const API_TOKEN_HEADER: &str = "x-api-token";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".into(),
        }
    }

    pub fn client(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    ApiToken(String),
    Anonymous,
}

impl Credentials {
    /// `X-API-Token` wins over `Authorization: Bearer`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if let Some(token) = headers
            .get(API_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            return Self::ApiToken(token.trim().to_string());
        }

        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| Self::ApiToken(token.trim().to_string()))
            .unwrap_or(Self::Anonymous)
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;
}

/// Accepts every request. Used when no API token is configured.
pub struct AllowAllAuth;

#[async_trait]
impl AuthProvider for AllowAllAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::ApiToken(token) => Ok(Identity::client(format!(
                "token:{}",
                token.chars().take(4).collect::<String>()
            ))),
            Credentials::Anonymous => Ok(Identity::anonymous()),
        }
    }
}

/// Accepts requests presenting one shared token.
pub struct StaticTokenAuth {
    token: String,
}

impl StaticTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::ApiToken(token) if constant_time_eq(token.as_bytes(), self.token.as_bytes()) => {
                Ok(Identity::client("api-token"))
            }
            Credentials::ApiToken(_) => {
                tracing::warn!("rejected request with invalid API token");
                Err(ServerError::Unauthorized("invalid API token".into()))
            }
            Credentials::Anonymous => {
                tracing::warn!("rejected request without API token");
                Err(ServerError::Unauthorized("missing API token".into()))
            }
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware: authenticate, then attach the [`Identity`] to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let credentials = Credentials::from_headers(request.headers());
    let identity = state.auth.authenticate(&credentials).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn credentials_from_api_token_header() {
        let creds = Credentials::from_headers(&headers(&[("x-api-token", "secret")]));
        assert_eq!(creds, Credentials::ApiToken("secret".into()));
    }

    #[test]
    fn credentials_from_bearer() {
        let creds = Credentials::from_headers(&headers(&[("authorization", "Bearer secret")]));
        assert_eq!(creds, Credentials::ApiToken("secret".into()));

        let basic = Credentials::from_headers(&headers(&[("authorization", "Basic dXNlcg==")]));
        assert_eq!(basic, Credentials::Anonymous);
    }

    #[test]
    fn api_token_header_takes_precedence() {
        let creds = Credentials::from_headers(&headers(&[
            ("x-api-token", "first"),
            ("authorization", "Bearer second"),
        ]));
        assert_eq!(creds, Credentials::ApiToken("first".into()));
    }

    #[tokio::test]
    async fn static_token_accepts_match_only() {
        let auth = StaticTokenAuth::new("secret");
        assert!(auth
            .authenticate(&Credentials::ApiToken("secret".into()))
            .await
            .is_ok());
        assert!(matches!(
            auth.authenticate(&Credentials::ApiToken("secreT".into())).await,
            Err(ServerError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.authenticate(&Credentials::Anonymous).await,
            Err(ServerError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn allow_all_accepts_anything() {
        let auth = AllowAllAuth;
        let id = auth.authenticate(&Credentials::Anonymous).await.unwrap();
        assert_eq!(id, Identity::anonymous());
        let id = auth
            .authenticate(&Credentials::ApiToken("abcdefgh".into()))
            .await
            .unwrap();
        assert_eq!(id.name, "token:abcd");
    }

    #[test]
    fn constant_time_eq_checks_length() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"abc", b"abd"));
    }
}

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{any, get};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::handler;
use crate::state::AppState;

/// Default request body limit.
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Build the router with all endpoints.
///
/// `/health` and `/info` are unauthenticated. Their names are reserved, so
/// every other method on them, like any route naming them as a workspace,
/// fails with `INVALID_ARGUMENT`.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let api = Router::new()
        .route(
            "/:workspace",
            get(handler::get_state)
                .post(handler::save_state)
                .fallback(handler::lock_dispatch),
        )
        .route("/:workspace/lock", any(handler::lock_handler))
        .route("/:workspace/unlock", any(handler::unlock_handler))
        .route("/:workspace/versions", get(handler::list_versions))
        .route("/:workspace/versions/:id", get(handler::get_version))
        .route(
            "/:workspace/versions/:id/content",
            get(handler::get_version_content),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .layer(DefaultBodyLimit::max(max_body_bytes));

    let open = Router::new()
        .route(
            "/health",
            get(handler::health_handler).fallback(handler::reserved_path),
        )
        .route(
            "/info",
            get(handler::info_handler).fallback(handler::reserved_path),
        );

    Router::new()
        .merge(open)
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

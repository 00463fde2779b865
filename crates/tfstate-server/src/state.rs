use std::sync::Arc;

use tfstate_engine::StateCoordinator;

use crate::auth::AuthProvider;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<StateCoordinator>,
    pub auth: Arc<dyn AuthProvider>,
    pub environment: String,
}

impl AppState {
    pub fn new(
        coordinator: Arc<StateCoordinator>,
        auth: Arc<dyn AuthProvider>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            coordinator,
            auth,
            environment: environment.into(),
        }
    }
}

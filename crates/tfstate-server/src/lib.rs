//! HTTP server for tfstate.
//!
//! Speaks the OpenTofu/Terraform HTTP state backend protocol (GET, POST,
//! LOCK, UNLOCK on `/{workspace}`) plus read-only version history, with
//! token authentication and configuration from TOML and the environment.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{AllowAllAuth, AuthProvider, Credentials, Identity, StaticTokenAuth};
pub use config::{
    DatabaseConfig, LogFormat, LoggingConfig, ServerConfig, ServiceConfig, StorageBackend,
    StorageConfig,
};
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::TfstateServer;
pub use state::AppState;

//! State coordination engine for tfstate.
//!
//! This crate holds the invariants of the backend:
//! - At most one lock holder per workspace ([`LockManager`])
//! - Append-only, workspace-scoped version history ([`VersionStore`])
//! - Blob written before its version is committed, and reads that fall back
//!   to a synthesized initial state ([`StateCoordinator`])
//!
//! The engine depends only on the [`tfstate_blob::BlobStore`] and
//! [`tfstate_meta::MetadataStore`] capabilities; concrete backends are
//! chosen by the caller.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod initial;
pub mod lock;
pub mod versions;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use coordinator::StateCoordinator;
pub use error::{EngineError, EngineResult};
pub use initial::InitialState;
pub use lock::{LockManager, UnlockOutcome};
pub use versions::VersionStore;

//! Durable metadata for tfstate: workspace records (including lock state) and
//! the append-only version history.
//!
//! # Architecture
//!
//! - A **workspace** is the only mutable shared record. Its lock fields are
//!   modelled as [`LockState`], so a half-set lock cannot be represented.
//! - A **version** is immutable once appended and points at a blob by path.
//! - Every mutation of a workspace is one atomic conditional operation
//!   evaluated by the store; callers never read-then-write.
//!
//! # Modules
//!
//! - [`error`]: Error types for metadata operations
//! - [`records`]: [`Workspace`], [`LockState`], [`LockInfo`], [`Version`]
//! - [`traits`]: The [`MetadataStore`] trait defining the storage interface
//! - [`memory`]: In-memory [`InMemoryMetadataStore`] for tests
//! - [`postgres`]: [`PgMetadataStore`] backed by PostgreSQL

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod traits;

pub use error::{MetaError, MetaResult};
pub use memory::InMemoryMetadataStore;
pub use postgres::{PgMetadataStore, PgPoolConfig};
pub use records::{LockAttempt, LockInfo, LockState, NewVersion, Release, Version, Workspace};
pub use traits::MetadataStore;

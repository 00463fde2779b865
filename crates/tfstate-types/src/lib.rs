//! Foundation types for tfstate, a remote state backend for OpenTofu and
//! Terraform's HTTP backend protocol.
//!
//! Every other tfstate crate depends on `tfstate-types`.
//!
//! # Key Types
//!
//! - [`WorkspaceName`]: Validated, path-safe name of a unit of state
//! - [`OperationId`]: Caller-supplied correlation token for a save
//! - [`LockToken`]: Opaque token that must match on unlock
//! - [`ContentHash`]: SHA-256 digest of the exact saved bytes
//! - [`BlobPath`]: Opaque key into a blob store
//! - [`WorkspaceId`], [`VersionId`]: Storage-assigned row identifiers

pub mod error;
pub mod hash;
pub mod id;
pub mod name;

pub use error::TypeError;
pub use hash::ContentHash;
pub use id::{BlobPath, VersionId, WorkspaceId};
pub use name::{
    LockToken, OperationId, WorkspaceName, MAX_IDENTIFIER_LEN, RESERVED_WORKSPACE_NAMES,
};

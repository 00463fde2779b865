//! Blob storage for state snapshot contents.
//!
//! The engine never talks to a concrete storage technology. It depends on the
//! [`BlobStore`] capability, which maps an opaque [`BlobPath`] to bytes.
//!
//! # Storage Backends
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`S3BlobStore`] -- S3-compatible object storage (AWS S3, MinIO)
//!
//! # Design Rules
//!
//! 1. `get` on a missing object returns `Ok(None)`, never an error.
//! 2. `put` of an empty payload fails with [`BlobError::InvalidPayload`].
//! 3. Re-putting the same bytes at the same path is observably a no-op.
//! 4. The store never interprets object contents.
//! 5. Transport failures are propagated as [`BlobError::Unavailable`]; the
//!    store does not retry.
//!
//! [`BlobPath`]: tfstate_types::BlobPath

pub mod error;
pub mod memory;
pub mod s3;
pub mod traits;

pub use error::{BlobError, BlobResult};
pub use memory::InMemoryBlobStore;
pub use s3::{S3BlobStore, S3Config};
pub use traits::BlobStore;

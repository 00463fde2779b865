use async_trait::async_trait;
use bytes::Bytes;
use tfstate_types::BlobPath;

use crate::error::BlobResult;

/// Byte storage keyed by path.
///
/// All implementations must satisfy these invariants:
/// - `get` on a missing object returns `Ok(None)`.
/// - `put` fails with `InvalidPayload` on an empty payload and writes nothing.
/// - `put` is idempotent: writing identical bytes to the same path twice is
///   indistinguishable from writing them once.
/// - A successful `put` is durable before it returns; callers rely on this to
///   order metadata commits after blob writes.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read an object.
    async fn get(&self, path: &BlobPath) -> BlobResult<Option<Bytes>>;

    /// Write an object, replacing whatever was stored at `path`.
    async fn put(&self, path: &BlobPath, data: Bytes) -> BlobResult<()>;

    /// Delete an object. Returns `true` if the object existed.
    ///
    /// Backends that cannot tell (S3 deletes are blind) return `true`.
    async fn delete(&self, path: &BlobPath) -> BlobResult<bool>;

    /// Create the backing container (bucket) if it does not exist yet.
    async fn ensure_container_exists(&self) -> BlobResult<()>;

    /// Check whether an object exists.
    async fn exists(&self, path: &BlobPath) -> BlobResult<bool> {
        Ok(self.get(path).await?.is_some())
    }
}

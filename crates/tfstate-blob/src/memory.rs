use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use tfstate_types::BlobPath;

use crate::error::{BlobError, BlobResult};
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Objects are held behind a `RwLock`;
/// `Bytes` makes reads cheap clones.
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<BlobPath, Bytes>>,
    container_ready: AtomicBool,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            container_ready: AtomicBool::new(false),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Whether `ensure_container_exists` has been called.
    pub fn container_ready(&self) -> bool {
        self.container_ready.load(Ordering::SeqCst)
    }

    /// Return a sorted list of all paths in the store.
    pub fn all_paths(&self) -> Vec<BlobPath> {
        let map = self.objects.read().expect("lock poisoned");
        let mut paths: Vec<BlobPath> = map.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, path: &BlobPath) -> BlobResult<Option<Bytes>> {
        let map = self.objects.read().map_err(poisoned)?;
        Ok(map.get(path).cloned())
    }

    async fn put(&self, path: &BlobPath, data: Bytes) -> BlobResult<()> {
        if data.is_empty() {
            return Err(BlobError::InvalidPayload {
                path: path.clone(),
                reason: "payload is empty".into(),
            });
        }
        let mut map = self.objects.write().map_err(poisoned)?;
        map.insert(path.clone(), data);
        Ok(())
    }

    async fn delete(&self, path: &BlobPath) -> BlobResult<bool> {
        let mut map = self.objects.write().map_err(poisoned)?;
        Ok(map.remove(path).is_some())
    }

    async fn ensure_container_exists(&self) -> BlobResult<()> {
        self.container_ready.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> BlobError {
    BlobError::unavailable(format!("in-memory blob store poisoned: {err}"))
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("object_count", &self.len())
            .finish()
    }
}

//! Build stores, auth and engine from a [`ServiceConfig`].

use std::sync::Arc;

use tfstate_blob::{BlobStore, InMemoryBlobStore, S3BlobStore};
use tfstate_engine::StateCoordinator;
use tfstate_meta::{InMemoryMetadataStore, MetadataStore, PgMetadataStore};

use crate::auth::{AllowAllAuth, AuthProvider, StaticTokenAuth};
use crate::config::{DatabaseConfig, ServerConfig, ServiceConfig, StorageBackend, StorageConfig};
use crate::error::ServerResult;
use crate::state::AppState;

pub async fn build_metadata_store(config: &DatabaseConfig) -> ServerResult<Arc<dyn MetadataStore>> {
    let Some(pool_config) = config.pool_config() else {
        tracing::warn!("DATABASE_URL not set; metadata is kept in memory and lost on restart");
        return Ok(Arc::new(InMemoryMetadataStore::new()));
    };

    let store = PgMetadataStore::connect(&pool_config).await?;
    if config.run_migrations {
        store.migrate().await?;
    }
    Ok(Arc::new(store))
}

pub async fn build_blob_store(config: &StorageConfig) -> ServerResult<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory blob storage; state contents are lost on restart");
            Ok(Arc::new(InMemoryBlobStore::new()))
        }
        StorageBackend::Minio | StorageBackend::S3 => {
            let store = S3BlobStore::from_config(&config.s3).await?;
            if let Err(err) = store.ensure_container_exists().await {
                // Saves retry this; reads of absent blobs fall back.
                tracing::warn!(bucket = %store.bucket_name(), error = %err, "state bucket not ready at startup");
            }
            Ok(Arc::new(store))
        }
    }
}

pub fn build_auth(config: &ServerConfig) -> Arc<dyn AuthProvider> {
    match &config.api_token {
        Some(token) => Arc::new(StaticTokenAuth::new(token.clone())),
        None => {
            tracing::warn!("API_TOKEN not set; all requests are accepted without authentication");
            Arc::new(AllowAllAuth)
        }
    }
}

/// Wire the whole service.
pub async fn build_state(config: &ServiceConfig) -> ServerResult<AppState> {
    let meta = build_metadata_store(&config.database).await?;
    let blobs = build_blob_store(&config.storage).await?;
    let coordinator = StateCoordinator::new(meta, blobs, config.engine.clone());

    Ok(AppState::new(
        Arc::new(coordinator),
        build_auth(&config.server),
        config.environment.clone(),
    ))
}

//! S3-compatible blob store (AWS S3, MinIO).

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tfstate_types::BlobPath;

use crate::error::{BlobError, BlobResult};
use crate::traits::BlobStore;

/// Connection settings for an S3-compatible endpoint.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct S3Config {
    /// Endpoint host (`localhost:9000`) or URL. `None` or empty uses the AWS default.
    pub endpoint: Option<String>,
    /// Use HTTPS when `endpoint` has no scheme.
    pub secure: bool,
    pub bucket: String,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Path-style addressing, required by MinIO.
    pub force_path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: Some("localhost:9000".into()),
            secure: false,
            bucket: "opentofu-states".into(),
            region: "us-east-1".into(),
            access_key: None,
            secret_key: None,
            force_path_style: true,
        }
    }
}

impl S3Config {
    /// The endpoint as a URL, adding a scheme from `secure` when missing.
    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint.as_deref().filter(|e| !e.is_empty()).map(|endpoint| {
            if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                endpoint.to_string()
            } else {
                let scheme = if self.secure { "https" } else { "http" };
                format!("{scheme}://{endpoint}")
            }
        })
    }
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("secure", &self.secure)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// S3-backed blob store.
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    region: String,
}

impl S3BlobStore {
    /// Build a client from configuration.
    pub async fn from_config(config: &S3Config) -> BlobResult<Self> {
        if config.bucket.is_empty() {
            return Err(BlobError::Configuration("bucket name must not be empty".into()));
        }

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(url) = config.endpoint_url() {
            loader = loader.endpoint_url(url);
        }

        match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key.clone(),
                    secret_key.clone(),
                    None,
                    None,
                    "tfstate-config",
                ));
            }
            (None, None) => {}
            _ => {
                return Err(BlobError::Configuration(
                    "access_key and secret_key must be set together".into(),
                ))
            }
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!(bucket = %config.bucket, endpoint = ?config.endpoint_url(), "S3 blob store configured");

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
        })
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    async fn bucket_exists(&self) -> BlobResult<bool> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .is_some_and(|e| e.is_not_found())
                    || is_not_found_error(&err);
                if missing {
                    Ok(false)
                } else {
                    Err(BlobError::unavailable(format!(
                        "head bucket {}: {err}",
                        self.bucket
                    )))
                }
            }
        }
    }

    async fn create_bucket(&self) -> BlobResult<()> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);

        if self.region != "us-east-1" {
            use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

            let constraint = BucketLocationConstraint::from(self.region.as_str());
            let config = CreateBucketConfiguration::builder()
                .location_constraint(constraint)
                .build();
            request = request.create_bucket_configuration(config);
        }

        request
            .send()
            .await
            .map_err(|e| BlobError::unavailable(format!("create bucket {}: {e}", self.bucket)))?;

        tracing::info!(bucket = %self.bucket, "created state bucket");
        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn get(&self, path: &BlobPath) -> BlobResult<Option<Bytes>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path.as_str())
            .send()
            .await;

        match result {
            Ok(output) => {
                let body = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| BlobError::unavailable(format!("read {path}: {e}")))?;
                Ok(Some(body.into_bytes()))
            }
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_key())
                    || is_not_found_error(&err);
                if missing {
                    Ok(None)
                } else {
                    Err(BlobError::unavailable(format!("get {path}: {err}")))
                }
            }
        }
    }

    async fn put(&self, path: &BlobPath, data: Bytes) -> BlobResult<()> {
        if data.is_empty() {
            return Err(BlobError::InvalidPayload {
                path: path.clone(),
                reason: "payload is empty".into(),
            });
        }

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path.as_str())
            .body(ByteStream::from(data))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| BlobError::unavailable(format!("put {path}: {e}")))?;

        Ok(())
    }

    async fn delete(&self, path: &BlobPath) -> BlobResult<bool> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path.as_str())
            .send()
            .await
            .map_err(|e| BlobError::unavailable(format!("delete {path}: {e}")))?;

        Ok(true)
    }

    async fn ensure_container_exists(&self) -> BlobResult<()> {
        if !self.bucket_exists().await? {
            self.create_bucket().await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for S3BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3BlobStore")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}

/// Check the raw HTTP response for a 404.
fn is_not_found_error<E>(err: &aws_sdk_s3::error::SdkError<E>) -> bool {
    err.raw_response()
        .is_some_and(|raw| raw.status().as_u16() == 404)
}

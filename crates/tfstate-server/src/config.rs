//! Service configuration: TOML file, then environment overrides.
//!
//! The configuration is built once in `main` and passed down. Nothing below
//! the binary reads the environment.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tfstate_blob::S3Config;
use tfstate_engine::EngineConfig;
use tfstate_meta::postgres::redact_url;
use tfstate_meta::PgPoolConfig;

use crate::error::{ServerError, ServerResult};
use crate::router::DEFAULT_MAX_BODY_BYTES;

const REDACTED: &str = "<redacted>";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Free-form deployment name (`local`, `dev`, `production`).
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            environment: "local".into(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Shared API token. `None` disables authentication.
    pub api_token: Option<String>,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            api_token: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. `None` keeps metadata in memory.
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Apply embedded migrations when the server starts.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 20,
            min_connections: 2,
            acquire_timeout_secs: 5,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    pub fn pool_config(&self) -> Option<PgPoolConfig> {
        self.url.as_ref().map(|url| PgPoolConfig {
            url: url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            acquire_timeout_secs: self.acquire_timeout_secs,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Minio,
    S3,
}

impl std::str::FromStr for StorageBackend {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "minio" => Ok(Self::Minio),
            "s3" => Ok(Self::S3),
            other => Err(ServerError::Config(format!(
                "unknown storage type {other:?} (expected memory, minio or s3)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3: S3Config,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ServerError::Config(format!(
                "unknown log format {other:?} (expected text or json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `tfstate_engine=debug,info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

impl ServiceConfig {
    /// Read `path` if given, then apply process environment overrides.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Apply `BIND_ADDR`, `API_TOKEN`, `DATABASE_URL`, ... from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ServerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr
                .parse()
                .map_err(|e| ServerError::Config(format!("BIND_ADDR {addr:?}: {e}")))?;
        }
        if let Some(token) = lookup("API_TOKEN") {
            self.server.api_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(max) = lookup("DB_MAX_CONNECTIONS") {
            self.database.max_connections = max
                .parse()
                .map_err(|e| ServerError::Config(format!("DB_MAX_CONNECTIONS {max:?}: {e}")))?;
        }

        if let Some(kind) = lookup("STORAGE_TYPE") {
            self.storage.backend = kind.parse()?;
            if self.storage.backend == StorageBackend::S3 && lookup("MINIO_ENDPOINT").is_none() {
                self.storage.s3.endpoint = None;
                self.storage.s3.force_path_style = false;
            }
        }
        let s3 = &mut self.storage.s3;
        if let Some(endpoint) = lookup("MINIO_ENDPOINT") {
            s3.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("MINIO_ACCESS_KEY") {
            s3.access_key = Some(key);
        }
        if let Some(secret) = lookup("MINIO_SECRET_KEY") {
            s3.secret_key = Some(secret);
        }
        if let Some(secure) = lookup("MINIO_SECURE") {
            s3.secure = parse_bool("MINIO_SECURE", &secure)?;
        }
        if let Some(bucket) = lookup("MINIO_BUCKET_NAME") {
            s3.bucket = bucket;
        }
        if let Some(region) = lookup("S3_REGION") {
            s3.region = region;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level.to_ascii_lowercase();
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        if let Some(environment) = lookup("ENVIRONMENT") {
            self.environment = environment;
        }
        Ok(())
    }

    /// A copy safe to print: tokens, passwords and secret keys are masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.server.api_token.is_some() {
            config.server.api_token = Some(REDACTED.into());
        }
        config.database.url = config.database.url.as_deref().map(redact_url);
        if config.storage.s3.secret_key.is_some() {
            config.storage.s3.secret_key = Some(REDACTED.into());
        }
        config
    }
}

fn parse_bool(key: &str, value: &str) -> ServerResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ServerError::Config(format!("{key} {value:?} is not a boolean"))),
    }
}

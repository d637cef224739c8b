//! Storage backends behind one contract.
//!
//! Every backend stores a blob plus its [`StorageMetadata`] record under a
//! caller-chosen filename. The adapter does not dedupe: callers are
//! responsible for picking unique names.
//!
//! Absence is a value (`Ok(None)`, `Ok(false)`), not an error. Deleting a
//! name whose blob or record is missing reports `NotFound`.

pub mod cloud;
pub mod local;
pub mod volume;

use crate::models::{ExtraMetadata, StorageMetadata};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{fmt, io, path::PathBuf, sync::Arc};
use thiserror::Error;

pub use cloud::{CloudProvider, CloudStorage};
pub use local::LocalStorage;
pub use volume::VolumeStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{kind} storage requires {field} in config")]
    MissingConfig {
        kind: StorageKind,
        field: &'static str,
    },
    #[error("invalid filename `{0}`")]
    InvalidFilename(String),
    #[error("file `{0}` not found")]
    NotFound(String),
    #[error("cloud storage for {provider} not yet implemented")]
    Unimplemented { provider: CloudProvider },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Persist `data` and its record under `filename`; returns the record written.
    async fn store(
        &self,
        data: Bytes,
        filename: &str,
        mime_type: &str,
        extra: ExtraMetadata,
    ) -> StorageResult<StorageMetadata>;

    async fn retrieve(&self, filename: &str) -> StorageResult<Option<Bytes>>;

    /// Remove blob and record. Not idempotent.
    async fn delete(&self, filename: &str) -> StorageResult<()>;

    async fn exists(&self, filename: &str) -> StorageResult<bool>;

    async fn get_metadata(&self, filename: &str) -> StorageResult<Option<StorageMetadata>>;

    /// Public link for `filename`, derived without touching the backend.
    fn get_url(&self, filename: &str) -> Option<String>;
}

/// Shared handle used by the service and the HTTP layer.
pub type SharedStorage = Arc<dyn StorageAdapter>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    Volume,
    Cloud,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageKind::Local => "local",
            StorageKind::Volume => "volume",
            StorageKind::Cloud => "cloud",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStorageConfig {
    pub path: PathBuf,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeStorageConfig {
    pub volume_path: PathBuf,
    pub base_url: Option<String>,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct CloudCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub project_id: Option<String>,
}

// Secrets stay out of logs.
impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "<redacted>"))
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("project_id", &self.project_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudStorageConfig {
    pub provider: CloudProvider,
    pub bucket: String,
    pub region: Option<String>,
    pub credentials: CloudCredentials,
    pub base_url: Option<String>,
}

/// Backend selection, one variant per storage kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Local(LocalStorageConfig),
    Volume(VolumeStorageConfig),
    Cloud(CloudStorageConfig),
}

impl StorageConfig {
    pub fn kind(&self) -> StorageKind {
        match self {
            StorageConfig::Local(_) => StorageKind::Local,
            StorageConfig::Volume(_) => StorageKind::Volume,
            StorageConfig::Cloud(_) => StorageKind::Cloud,
        }
    }
}

/// Build the adapter for `config`, rejecting empty required fields up front.
pub fn create_storage_adapter(config: StorageConfig) -> StorageResult<SharedStorage> {
    let kind = config.kind();
    match config {
        StorageConfig::Local(cfg) => {
            if cfg.path.as_os_str().is_empty() {
                return Err(StorageError::MissingConfig { kind, field: "path" });
            }
            Ok(Arc::new(LocalStorage::new(cfg.path, cfg.base_url)))
        }
        StorageConfig::Volume(cfg) => {
            if cfg.volume_path.as_os_str().is_empty() {
                return Err(StorageError::MissingConfig {
                    kind,
                    field: "volume_path",
                });
            }
            Ok(Arc::new(VolumeStorage::new(cfg.volume_path, cfg.base_url)))
        }
        StorageConfig::Cloud(cfg) => {
            if cfg.bucket.trim().is_empty() {
                return Err(StorageError::MissingConfig {
                    kind,
                    field: "bucket",
                });
            }
            Ok(Arc::new(CloudStorage::new(cfg)))
        }
    }
}

/// Suffix of the record stored next to each blob.
pub(crate) const METADATA_SUFFIX: &str = ".meta.json";

/// Longest accepted filename: the record's name must still fit in one
/// 255-byte path component.
pub const MAX_FILENAME_LEN: usize = 255 - METADATA_SUFFIX.len();

/// Filenames must be a single, plain path component.
pub(crate) fn ensure_filename_safe(filename: &str) -> StorageResult<()> {
    let invalid = filename.is_empty()
        || filename.len() > MAX_FILENAME_LEN
        || filename == "."
        || filename.contains("..")
        || filename
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'/' || b == b'\\');
    if invalid {
        return Err(StorageError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// `{base}/{filename}` with any trailing slash on `base` dropped.
pub(crate) fn join_url(base: &str, filename: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), filename)
}

//! Remote object storage.
//!
//! Link construction works for every provider. No provider SDK is wired
//! in, so every operation that would touch the network fails with
//! [`StorageError::Unimplemented`].

use super::{
    CloudCredentials, CloudStorageConfig, StorageAdapter, StorageError, StorageResult, join_url,
};
use crate::models::{ExtraMetadata, StorageMetadata};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::warn;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Gcp,
    Azure,
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Gcp => "gcp",
            CloudProvider::Azure => "azure",
        })
    }
}

impl FromStr for CloudProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(CloudProvider::Aws),
            "gcp" => Ok(CloudProvider::Gcp),
            "azure" => Ok(CloudProvider::Azure),
            other => Err(format!("unknown cloud provider `{other}`")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CloudStorage {
    provider: CloudProvider,
    bucket: String,
    #[allow(dead_code)]
    region: Option<String>,
    #[allow(dead_code)]
    credentials: CloudCredentials,
    base_url: Option<String>,
}

impl CloudStorage {
    pub fn new(config: CloudStorageConfig) -> Self {
        Self {
            provider: config.provider,
            bucket: config.bucket,
            region: config.region,
            credentials: config.credentials,
            base_url: config.base_url,
        }
    }

    pub fn provider(&self) -> CloudProvider {
        self.provider
    }

    fn unimplemented<T>(&self, operation: &str) -> StorageResult<T> {
        warn!(provider = %self.provider, operation, "cloud storage operation unavailable");
        Err(StorageError::Unimplemented {
            provider: self.provider,
        })
    }
}

#[async_trait]
impl StorageAdapter for CloudStorage {
    async fn store(
        &self,
        _data: Bytes,
        _filename: &str,
        _mime_type: &str,
        _extra: ExtraMetadata,
    ) -> StorageResult<StorageMetadata> {
        self.unimplemented("store")
    }

    async fn retrieve(&self, _filename: &str) -> StorageResult<Option<Bytes>> {
        self.unimplemented("retrieve")
    }

    async fn delete(&self, _filename: &str) -> StorageResult<()> {
        self.unimplemented("delete")
    }

    async fn exists(&self, _filename: &str) -> StorageResult<bool> {
        self.unimplemented("exists")
    }

    async fn get_metadata(&self, _filename: &str) -> StorageResult<Option<StorageMetadata>> {
        self.unimplemented("get_metadata")
    }

    fn get_url(&self, filename: &str) -> Option<String> {
        if let Some(base) = &self.base_url {
            return Some(join_url(base, filename));
        }
        let bucket = &self.bucket;
        Some(match self.provider {
            CloudProvider::Aws => format!("https://{bucket}.s3.amazonaws.com/{filename}"),
            CloudProvider::Gcp => format!("https://storage.googleapis.com/{bucket}/{filename}"),
            CloudProvider::Azure => format!("https://{bucket}.blob.core.windows.net/{filename}"),
        })
    }
}

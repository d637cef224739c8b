//! Mounted-volume storage. Same layout and semantics as [`LocalStorage`];
//! only the deployment topology differs.

use super::{LocalStorage, StorageAdapter, StorageResult};
use crate::models::{ExtraMetadata, StorageMetadata};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct VolumeStorage {
    inner: LocalStorage,
}

impl VolumeStorage {
    pub fn new(volume_path: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        Self {
            inner: LocalStorage::new(volume_path, base_url),
        }
    }

    pub fn volume_path(&self) -> &Path {
        self.inner.base_path()
    }
}

#[async_trait]
impl StorageAdapter for VolumeStorage {
    async fn store(
        &self,
        data: Bytes,
        filename: &str,
        mime_type: &str,
        extra: ExtraMetadata,
    ) -> StorageResult<StorageMetadata> {
        self.inner.store(data, filename, mime_type, extra).await
    }

    async fn retrieve(&self, filename: &str) -> StorageResult<Option<Bytes>> {
        self.inner.retrieve(filename).await
    }

    async fn delete(&self, filename: &str) -> StorageResult<()> {
        self.inner.delete(filename).await
    }

    async fn exists(&self, filename: &str) -> StorageResult<bool> {
        self.inner.exists(filename).await
    }

    async fn get_metadata(&self, filename: &str) -> StorageResult<Option<StorageMetadata>> {
        self.inner.get_metadata(filename).await
    }

    fn get_url(&self, filename: &str) -> Option<String> {
        self.inner.get_url(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn behaves_like_local_storage_under_the_volume_path() {
        let dir = tempdir().unwrap();
        let storage = VolumeStorage::new(dir.path().join("vol"), Some("http://cdn".into()));

        let record = storage
            .store(Bytes::from_static(b"abc"), "v.txt", "text/plain", ExtraMetadata::new())
            .await
            .unwrap();
        assert_eq!(record.url.as_deref(), Some("http://cdn/v.txt"));
        assert!(storage.volume_path().join("v.txt.meta.json").exists());
        assert_eq!(
            storage.retrieve("v.txt").await.unwrap(),
            Some(Bytes::from_static(b"abc"))
        );

        storage.delete("v.txt").await.unwrap();
        assert!(storage.delete("v.txt").await.is_err());
    }
}

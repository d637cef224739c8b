//! Filesystem storage: `<base>/<name>` for the blob and
//! `<base>/<name>.meta.json` for its record.
//!
//! Each artifact is written to a temp file, fsynced and renamed into place,
//! blob first. If the record cannot be written the blob is removed again,
//! so a failed `store` leaves nothing behind. A crash between the two
//! renames can still leave an orphaned blob without a record; readers treat
//! such a blob as present for `retrieve`/`exists` and absent for
//! `get_metadata`.

use super::{
    METADATA_SUFFIX, StorageAdapter, StorageError, StorageResult, ensure_filename_safe, join_url,
};
use crate::models::{ExtraMetadata, StorageMetadata};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct LocalStorage {
    /// Directory holding blobs and sidecars. Created on first store.
    base_path: PathBuf,

    /// Prefix for public links; no links without it.
    base_url: Option<String>,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        Self {
            base_path: base_path.into(),
            base_url,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn blob_path(&self, filename: &str) -> PathBuf {
        self.base_path.join(filename)
    }

    fn metadata_path(&self, filename: &str) -> PathBuf {
        self.base_path.join(format!("{filename}{METADATA_SUFFIX}"))
    }

    async fn ensure_directory(&self) -> io::Result<()> {
        if !fs::try_exists(&self.base_path).await? {
            fs::create_dir_all(&self.base_path).await?;
            debug!("created storage directory {}", self.base_path.display());
        }
        Ok(())
    }

    /// Write `contents` to `target` through a temp file in the same directory.
    async fn write_atomic(&self, target: &Path, contents: &[u8]) -> io::Result<()> {
        let tmp_path = self.base_path.join(format!(".tmp-{}", Uuid::new_v4()));

        let written = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(contents).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        if let Err(err) = fs::rename(&tmp_path, target).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(target).await?;
                fs::rename(&tmp_path, target).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(err);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for LocalStorage {
    async fn store(
        &self,
        data: Bytes,
        filename: &str,
        mime_type: &str,
        extra: ExtraMetadata,
    ) -> StorageResult<StorageMetadata> {
        ensure_filename_safe(filename)?;
        self.ensure_directory().await?;

        let blob_path = self.blob_path(filename);
        let metadata_path = self.metadata_path(filename);

        let mut record = StorageMetadata::new(filename, mime_type, data.len() as u64, extra);
        record.path = Some(blob_path.display().to_string());
        record.url = self.get_url(filename);
        let encoded = serde_json::to_vec_pretty(&record)?;

        self.write_atomic(&blob_path, &data).await?;

        if let Err(err) = self.write_atomic(&metadata_path, &encoded).await {
            warn!(
                "metadata write for {} failed, removing blob: {}",
                filename, err
            );
            if let Err(cleanup) = fs::remove_file(&blob_path).await {
                warn!("could not remove orphaned blob {}: {}", blob_path.display(), cleanup);
            }
            return Err(StorageError::Io(err));
        }

        debug!("stored {} ({} bytes)", blob_path.display(), record.size);
        Ok(record)
    }

    async fn retrieve(&self, filename: &str) -> StorageResult<Option<Bytes>> {
        if ensure_filename_safe(filename).is_err() {
            return Ok(None);
        }
        match fs::read(self.blob_path(filename)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    async fn delete(&self, filename: &str) -> StorageResult<()> {
        ensure_filename_safe(filename)?;

        let blob_path = self.blob_path(filename);
        match fs::remove_file(&blob_path).await {
            Ok(_) => debug!("removed blob {}", blob_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(filename.to_string()));
            }
            Err(err) => return Err(StorageError::Io(err)),
        }

        let metadata_path = self.metadata_path(filename);
        match fs::remove_file(&metadata_path).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("blob {} had no metadata record", filename);
                Err(StorageError::NotFound(format!("{filename}{METADATA_SUFFIX}")))
            }
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    async fn exists(&self, filename: &str) -> StorageResult<bool> {
        if ensure_filename_safe(filename).is_err() {
            return Ok(false);
        }
        Ok(fs::try_exists(self.blob_path(filename)).await?)
    }

    async fn get_metadata(&self, filename: &str) -> StorageResult<Option<StorageMetadata>> {
        if ensure_filename_safe(filename).is_err() {
            return Ok(None);
        }
        let raw = match fs::read(self.metadata_path(filename)).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::Io(err)),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn get_url(&self, filename: &str) -> Option<String> {
        self.base_url
            .as_deref()
            .map(|base| join_url(base, filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn extra(value: serde_json::Value) -> ExtraMetadata {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn store_creates_directory_lazily_and_round_trips() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("nested").join("uploads");
        let storage = LocalStorage::new(&base, None);
        assert!(!base.exists());

        let payload = Bytes::from_static(b"\x89PNG\r");
        let record = storage
            .store(payload.clone(), "a.png", "image/png", extra(json!({ "originalName": "cat.png" })))
            .await
            .unwrap();

        assert!(base.join("a.png").exists());
        assert!(base.join("a.png.meta.json").exists());
        assert_eq!(record.size, 5);
        assert_eq!(record.original_name, "cat.png");
        assert_eq!(record.url, None);

        assert_eq!(storage.retrieve("a.png").await.unwrap(), Some(payload));
        let meta = storage.get_metadata("a.png").await.unwrap().unwrap();
        assert_eq!(meta.size, 5);
        assert_eq!(meta, record);
    }

    #[tokio::test]
    async fn absent_files_read_as_none() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), None);

        assert_eq!(storage.retrieve("missing.png").await.unwrap(), None);
        assert_eq!(storage.get_metadata("missing.png").await.unwrap(), None);
        assert!(!storage.exists("missing.png").await.unwrap());
        assert_eq!(storage.retrieve("../escape").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_is_not_idempotent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), None);
        storage
            .store(Bytes::from_static(b"bye"), "gone.txt", "text/plain", ExtraMetadata::new())
            .await
            .unwrap();

        storage.delete("gone.txt").await.unwrap();
        assert!(!storage.exists("gone.txt").await.unwrap());
        assert!(!dir.path().join("gone.txt.meta.json").exists());

        let again = storage.delete("gone.txt").await;
        assert!(matches!(again, Err(StorageError::NotFound(_))));
        assert!(matches!(
            storage.delete("never-existed").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_reports_missing_sidecar() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), None);
        storage
            .store(Bytes::from_static(b"x"), "half.bin", "application/octet-stream", ExtraMetadata::new())
            .await
            .unwrap();
        std::fs::remove_file(dir.path().join("half.bin.meta.json")).unwrap();

        assert!(storage.delete("half.bin").await.is_err());
        assert!(!dir.path().join("half.bin").exists());
    }

    #[tokio::test]
    async fn sidecar_carries_url_and_extras() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), Some("https://files.example.com/".into()));
        let record = storage
            .store(
                Bytes::from_static(b"hi"),
                "note.txt",
                "text/plain",
                extra(json!({ "author": "sam", "mimeType": "spoofed/type" })),
            )
            .await
            .unwrap();

        assert_eq!(record.url.as_deref(), Some("https://files.example.com/note.txt"));
        assert_eq!(record.mime_type, "text/plain");

        let raw = std::fs::read_to_string(dir.path().join("note.txt.meta.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["author"], json!("sam"));
        assert_eq!(value["mimeType"], json!("text/plain"));
        assert_eq!(value["size"], json!(2));
    }

    #[tokio::test]
    async fn store_rejects_path_components() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), None);
        let result = storage
            .store(Bytes::from_static(b"x"), "../x", "text/plain", ExtraMetadata::new())
            .await;
        assert!(matches!(result, Err(StorageError::InvalidFilename(_))));
    }

    #[tokio::test]
    async fn concurrent_stores_of_distinct_names_do_not_interfere() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), None);

        let writes = (0..16).map(|i| {
            let storage = storage.clone();
            async move {
                storage
                    .store(
                        Bytes::from(vec![i as u8; i + 1]),
                        &format!("f{i}.bin"),
                        "application/octet-stream",
                        ExtraMetadata::new(),
                    )
                    .await
            }
        });
        for result in futures::future::join_all(writes).await {
            result.unwrap();
        }

        for i in 0..16usize {
            let data = storage.retrieve(&format!("f{i}.bin")).await.unwrap().unwrap();
            assert_eq!(data.len(), i + 1);
        }
    }
}

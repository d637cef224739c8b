//! UploadService: sequences validate → process → name → store for one
//! file and fans the same pipeline out over a batch.
//!
//! Each stage reports a verdict value; the service stops at the first
//! failing stage without touching the later ones. Only the storage backend
//! is shared between pipelines, and the service adds no locking around it.

use crate::{
    errors::UploadError,
    models::{
        ExtraMetadata, FileCategory, StorageMetadata, UploadFailure, UploadOptions, UploadResult,
        UploadedFile,
    },
    naming::{format_bytes, generate_filename},
    processors::{ProcessingOptions, ProcessorKind, create_processor, merge_options},
    storage::{SharedStorage, StorageResult},
    validators::{ValidationRules, create_validator},
};
use bytes::Bytes;
use futures::{StreamExt, stream};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 8;

/// Defaults applied to every upload; per-call options override them.
#[derive(Debug, Clone)]
pub struct UploadServiceConfig {
    pub default_category: FileCategory,
    pub default_validation_rules: ValidationRules,
    pub default_processing_options: ProcessingOptions,
    /// Upper bound on pipelines in flight during a batch upload.
    pub max_concurrent_uploads: usize,
}

impl Default for UploadServiceConfig {
    fn default() -> Self {
        Self {
            default_category: FileCategory::Image,
            default_validation_rules: ValidationRules::default(),
            default_processing_options: ProcessingOptions::new(),
            max_concurrent_uploads: DEFAULT_MAX_CONCURRENT_UPLOADS,
        }
    }
}

#[derive(Clone)]
pub struct UploadService {
    storage: SharedStorage,
    config: Arc<UploadServiceConfig>,
}

impl UploadService {
    pub fn new(storage: SharedStorage, config: UploadServiceConfig) -> Self {
        Self {
            storage,
            config: Arc::new(config),
        }
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub fn config(&self) -> &UploadServiceConfig {
        &self.config
    }

    /// Run one file through the pipeline.
    pub async fn upload_file(&self, file: &UploadedFile, options: &UploadOptions) -> UploadResult {
        let category = options.category.unwrap_or(self.config.default_category);
        debug!(
            "received {} ({}, {}) as {}",
            file.original_name,
            file.mime_type,
            format_bytes(file.size(), 2),
            category
        );

        // Validating
        let rules = self
            .config
            .default_validation_rules
            .merge(&options.validation_rules);
        let validator = match create_validator(category, &rules) {
            Ok(validator) => validator,
            Err(err) => return unsupported(file, err),
        };
        let verdict = validator.validate(&file.data, &file.original_name, &file.mime_type);
        if !verdict.valid {
            info!(
                "rejected {}: {} violation(s)",
                file.original_name,
                verdict.errors.len()
            );
            return UploadResult::failed(file, UploadFailure::Rejected, verdict.errors);
        }

        // Processing
        let processing_options = merge_options(
            &self.config.default_processing_options,
            &options.processing_options,
        );
        let processor = match create_processor(
            ProcessorKind::from(category),
            ProcessingOptions::new(),
        ) {
            Ok(processor) => processor,
            Err(err) => return unsupported(file, err),
        };
        let processed = processor
            .process(
                file.data.clone(),
                &file.original_name,
                &file.mime_type,
                &processing_options,
            )
            .await;
        if !processed.success {
            info!("processing failed for {}: {:?}", file.original_name, processed.errors);
            return UploadResult::failed(file, UploadFailure::ProcessingFailed, processed.errors);
        }

        // Naming
        let filename = match &options.generate_filename {
            Some(generate) => generate(&file.original_name, &file.mime_type),
            None => generate_filename(options.naming, &file.original_name, &file.mime_type),
        };

        // Storing
        let mut extra = ExtraMetadata::new();
        extra.insert(
            "originalName".into(),
            Value::String(file.original_name.clone()),
        );
        extra.extend(options.metadata.clone());
        extra.extend(processed.metadata);

        match self
            .storage
            .store(processed.data, &filename, &file.mime_type, extra)
            .await
        {
            Ok(record) => {
                info!(
                    "stored {} as {} ({} bytes)",
                    file.original_name, record.filename, record.size
                );
                UploadResult::stored(file, &record)
            }
            Err(err) => {
                warn!("storing {} failed: {}", file.original_name, err);
                UploadResult::failed(file, UploadFailure::StorageFailed, vec![err.to_string()])
            }
        }
    }

    /// Run every file through its own pipeline, at most
    /// `max_concurrent_uploads` at a time. Results keep input order.
    pub async fn upload_files(
        &self,
        files: &[UploadedFile],
        options: &UploadOptions,
    ) -> Vec<UploadResult> {
        let limit = self.config.max_concurrent_uploads.max(1);
        // Futures are built up front so the stream holds no borrowing closure.
        let pending: Vec<_> = files
            .iter()
            .map(|file| self.upload_file(file, options))
            .collect();
        stream::iter(pending).buffered(limit).collect().await
    }

    pub async fn retrieve_file(&self, filename: &str) -> StorageResult<Option<Bytes>> {
        self.storage.retrieve(filename).await
    }

    /// `true` only when both blob and record were removed.
    pub async fn delete_file(&self, filename: &str) -> bool {
        match self.storage.delete(filename).await {
            Ok(()) => true,
            Err(err) => {
                debug!("delete of {} failed: {}", filename, err);
                false
            }
        }
    }

    pub async fn file_exists(&self, filename: &str) -> StorageResult<bool> {
        self.storage.exists(filename).await
    }

    pub async fn get_file_metadata(&self, filename: &str) -> StorageResult<Option<StorageMetadata>> {
        self.storage.get_metadata(filename).await
    }

    pub fn get_file_url(&self, filename: &str) -> Option<String> {
        self.storage.get_url(filename)
    }
}

fn unsupported(file: &UploadedFile, err: UploadError) -> UploadResult {
    warn!("cannot upload {}: {}", file.original_name, err);
    UploadResult::failed(file, UploadFailure::UnsupportedCategory, vec![err.to_string()])
}

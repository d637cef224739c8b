//! Represents an uploaded file, the options it was uploaded with, and the
//! terminal record the pipeline hands back to the caller.

use crate::{
    models::metadata::{ExtraMetadata, StorageMetadata},
    processors::ProcessingOptions,
    validators::ValidationRules,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// The declared kind of an upload. Selects the validator and processor.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    #[default]
    Image,
    Document,
    Video,
    Audio,
    Generic,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Document => "document",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Generic => "generic",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded file as handed over by the HTTP layer.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// Multipart field the file arrived in.
    pub field_name: String,

    /// Client-side filename.
    pub original_name: String,

    /// Declared content type.
    pub mime_type: String,

    /// Raw payload.
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(
        field_name: impl Into<String>,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Caller-supplied storage name generator: `(original_name, mime_type) -> filename`.
pub type FilenameGenerator = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Built-in naming schemes selectable from an options payload.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum NamingStrategy {
    /// `{millis}-{random}.{ext}`
    #[default]
    Unique,
    /// `{millis}-{random}-{sanitized original stem}.{ext}`
    WithOriginal,
}

/// Per-call options. Everything is optional and overrides service defaults.
#[derive(Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadOptions {
    /// Category override; the service default applies when absent.
    #[serde(alias = "fileType")]
    pub category: Option<FileCategory>,

    /// Field-wise overrides of the merged validation rules.
    pub validation_rules: ValidationRules,

    /// Shallow overrides of the merged processing options.
    pub processing_options: ProcessingOptions,

    /// Built-in naming scheme, used when no custom generator is set.
    pub naming: NamingStrategy,

    /// Custom naming function; wins over `naming`.
    #[serde(skip)]
    pub generate_filename: Option<FilenameGenerator>,

    /// Extra pairs merged into the stored record.
    pub metadata: ExtraMetadata,
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("category", &self.category)
            .field("validation_rules", &self.validation_rules)
            .field("processing_options", &self.processing_options)
            .field("naming", &self.naming)
            .field("generate_filename", &self.generate_filename.is_some())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Stage at which a single-file upload stopped.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum UploadFailure {
    /// Validation found one or more rule violations.
    Rejected,
    /// The processor reported failure.
    ProcessingFailed,
    /// The backend could not persist the blob or its record.
    StorageFailed,
    /// No validator or processor exists for the category.
    UnsupportedCategory,
}

impl UploadFailure {
    /// Whether the client can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadFailure::StorageFailed)
    }
}

/// The caller-facing outcome of one upload. Never carries payload bytes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExtraMetadata>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<UploadFailure>,
}

impl UploadResult {
    /// Successful outcome populated from the record the backend wrote.
    pub fn stored(file: &UploadedFile, record: &StorageMetadata) -> Self {
        Self {
            success: true,
            filename: Some(record.filename.clone()),
            original_name: Some(file.original_name.clone()),
            url: record.url.clone(),
            size: Some(record.size),
            mime_type: Some(file.mime_type.clone()),
            metadata: Some(record.to_map()),
            errors: Vec::new(),
            failure: None,
        }
    }

    pub fn failed(file: &UploadedFile, failure: UploadFailure, errors: Vec<String>) -> Self {
        Self {
            success: false,
            filename: None,
            original_name: Some(file.original_name.clone()),
            url: None,
            size: None,
            mime_type: None,
            metadata: None,
            errors,
            failure: Some(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_parse_from_json_payload() {
        let options: UploadOptions = serde_json::from_value(json!({
            "fileType": "generic",
            "validationRules": { "maxSize": 1024 },
            "processingOptions": { "quality": 80 },
            "naming": "withOriginal",
            "metadata": { "album": "summer" }
        }))
        .unwrap();

        assert_eq!(options.category, Some(FileCategory::Generic));
        assert_eq!(options.validation_rules.max_size, Some(1024));
        assert_eq!(options.processing_options.get("quality"), Some(&json!(80)));
        assert_eq!(options.naming, NamingStrategy::WithOriginal);
        assert!(options.generate_filename.is_none());
    }

    #[test]
    fn empty_payload_yields_defaults() {
        let options: UploadOptions = serde_json::from_value(json!({})).unwrap();
        assert!(options.category.is_none());
        assert!(options.metadata.is_empty());
        assert_eq!(options.naming, NamingStrategy::Unique);
    }

    #[test]
    fn failed_result_keeps_original_name_and_omits_bytes() {
        let file = UploadedFile::new("file", "cat.gif", "image/gif", vec![1, 2, 3]);
        let result = UploadResult::failed(&file, UploadFailure::Rejected, vec!["nope".into()]);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["originalName"], json!("cat.gif"));
        assert_eq!(value["failure"], json!("rejected"));
        assert!(value.get("size").is_none());
    }
}

//! Represents the sidecar record stored next to every blob.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form key/value pairs merged into a stored record.
pub type ExtraMetadata = Map<String, Value>;

/// Keys owned by [`StorageMetadata`] itself. Extra metadata may not shadow them.
pub const RESERVED_KEYS: [&str; 7] = [
    "filename",
    "originalName",
    "mimeType",
    "size",
    "uploadedAt",
    "path",
    "url",
];

/// The durable description of a stored blob.
///
/// Filesystem backends persist this as `<filename>.meta.json`; the extra
/// pairs are flattened into the same JSON object.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageMetadata {
    /// Canonical name the blob is stored under.
    pub filename: String,

    /// Name the client uploaded the file with.
    pub original_name: String,

    /// Declared content type.
    pub mime_type: String,

    /// Size of the stored payload in bytes.
    pub size: u64,

    /// When the record was written.
    pub uploaded_at: DateTime<Utc>,

    /// Physical location, for filesystem-backed storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Public link, when the backend has an addressing scheme for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Caller- and processor-supplied pairs.
    #[serde(flatten)]
    pub extra: ExtraMetadata,
}

impl StorageMetadata {
    /// Build a record for `filename`, folding `extra` in.
    ///
    /// A string `originalName` in `extra` becomes the record's original name
    /// (falling back to `filename`); every other reserved key is discarded.
    pub fn new(filename: &str, mime_type: &str, size: u64, mut extra: ExtraMetadata) -> Self {
        let original_name = match extra.remove("originalName") {
            Some(Value::String(name)) => name,
            _ => filename.to_string(),
        };
        extra.retain(|key, _| !RESERVED_KEYS.contains(&key.as_str()));

        Self {
            filename: filename.to_string(),
            original_name,
            mime_type: mime_type.to_string(),
            size,
            uploaded_at: Utc::now(),
            path: None,
            url: None,
            extra,
        }
    }

    /// Render the whole record, extras included, as one JSON object.
    pub fn to_map(&self) -> ExtraMetadata {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => ExtraMetadata::new(),
        }
    }
}

//! Presentation helpers for upload results.

use crate::models::{ExtraMetadata, UploadResult};
use serde::Serialize;

/// Public-facing fields of a successful upload.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileSummary {
    pub filename: Option<String>,
    pub original_name: Option<String>,
    pub url: Option<String>,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    pub metadata: Option<ExtraMetadata>,
}

impl From<&UploadResult> for UploadedFileSummary {
    fn from(result: &UploadResult) -> Self {
        Self {
            filename: result.filename.clone(),
            original_name: result.original_name.clone(),
            url: result.url.clone(),
            size: result.size,
            mime_type: result.mime_type.clone(),
            metadata: result.metadata.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailedUpload {
    pub original_name: Option<String>,
    pub errors: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BatchData {
    pub uploaded: usize,
    pub failed: usize,
    pub files: Vec<UploadedFileSummary>,
    pub errors: Vec<FailedUpload>,
}

/// Aggregated outcome of a batch; `success` is true only when nothing failed.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub success: bool,
    pub data: BatchData,
}

pub fn summarize(results: &[UploadResult]) -> BatchSummary {
    let (successful, failed): (Vec<&UploadResult>, Vec<&UploadResult>) =
        results.iter().partition(|r| r.success);

    BatchSummary {
        success: failed.is_empty(),
        data: BatchData {
            uploaded: successful.len(),
            failed: failed.len(),
            files: successful.into_iter().map(UploadedFileSummary::from).collect(),
            errors: failed
                .into_iter()
                .map(|r| FailedUpload {
                    original_name: r.original_name.clone(),
                    errors: r.errors.clone(),
                })
                .collect(),
        },
    }
}

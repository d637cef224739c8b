//! Pass-through processor.

use super::{FileProcessor, ProcessingOptions, ProcessingResult};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

/// Returns its input untouched, echoing the options into the metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProcessor;

#[async_trait]
impl FileProcessor for IdentityProcessor {
    async fn process(
        &self,
        data: Bytes,
        filename: &str,
        mime_type: &str,
        options: &ProcessingOptions,
    ) -> ProcessingResult {
        let mut metadata = options.clone();
        metadata.insert("originalFilename".into(), Value::from(filename));
        metadata.insert("originalMimeType".into(), Value::from(mime_type));
        metadata.insert("processed".into(), Value::Bool(false));
        ProcessingResult::succeeded(data, metadata)
    }
}

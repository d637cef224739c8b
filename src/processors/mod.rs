//! Per-category file processing.
//!
//! A processor turns validated bytes into the bytes that get stored, plus
//! derived metadata. Failures come back as a [`ProcessingResult`] with
//! `success == false`; the caller checks the flag before storing.

pub mod identity;
pub mod image;

use crate::{errors::UploadError, models::FileCategory};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};

pub use identity::IdentityProcessor;
pub use image::{ImageProcessingOptions, ImageProcessor};

/// JSON-shaped processing options, merged by top-level key.
pub type ProcessingOptions = Map<String, Value>;

#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub success: bool,
    /// Processed payload; the input bytes when nothing changed or on failure.
    pub data: Bytes,
    pub metadata: Map<String, Value>,
    pub errors: Vec<String>,
}

impl ProcessingResult {
    pub fn succeeded(data: Bytes, metadata: Map<String, Value>) -> Self {
        Self {
            success: true,
            data,
            metadata,
            errors: Vec::new(),
        }
    }

    pub fn failed(data: Bytes, metadata: Map<String, Value>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            data,
            metadata,
            errors,
        }
    }
}

#[async_trait]
pub trait FileProcessor: Send + Sync {
    async fn process(
        &self,
        data: Bytes,
        filename: &str,
        mime_type: &str,
        options: &ProcessingOptions,
    ) -> ProcessingResult;
}

/// Which processor a category runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorKind {
    Image,
    Document,
    Video,
    Audio,
    /// Pass-through.
    None,
}

impl From<FileCategory> for ProcessorKind {
    fn from(category: FileCategory) -> Self {
        match category {
            FileCategory::Image => ProcessorKind::Image,
            FileCategory::Document => ProcessorKind::Document,
            FileCategory::Video => ProcessorKind::Video,
            FileCategory::Audio => ProcessorKind::Audio,
            FileCategory::Generic => ProcessorKind::None,
        }
    }
}

/// Shallow, key-level override: keys in `overrides` win.
pub fn merge_options(base: &ProcessingOptions, overrides: &ProcessingOptions) -> ProcessingOptions {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Build the processor for `kind`; `defaults` become the processor's own
/// defaults, under whatever options a call passes.
pub fn create_processor(
    kind: ProcessorKind,
    defaults: ProcessingOptions,
) -> Result<Box<dyn FileProcessor>, UploadError> {
    match kind {
        ProcessorKind::Image => Ok(Box::new(ImageProcessor::new(defaults))),
        ProcessorKind::None => Ok(Box::new(IdentityProcessor)),
        ProcessorKind::Document => Err(UploadError::UnsupportedProcessor(FileCategory::Document)),
        ProcessorKind::Video => Err(UploadError::UnsupportedProcessor(FileCategory::Video)),
        ProcessorKind::Audio => Err(UploadError::UnsupportedProcessor(FileCategory::Audio)),
    }
}

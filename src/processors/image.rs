//! Image processing contract.
//!
//! Options are resolved and checked here and the image header is probed for
//! its dimensions. Pixel transforms are not performed: the payload is
//! stored as uploaded, with the requested options recorded alongside it.

use super::{FileProcessor, ProcessingOptions, ProcessingResult, merge_options};
use crate::validators::image::probe_dimensions;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFit {
    Cover,
    Contain,
    Fill,
    Inside,
    Outside,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ResizeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<ResizeFit>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageProcessingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    /// 1..=100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize: Option<bool>,
}

impl ImageProcessingOptions {
    /// Parse a merged option map and check value ranges.
    pub fn from_options(options: &ProcessingOptions) -> Result<Self, Vec<String>> {
        let parsed: Self = serde_json::from_value(Value::Object(options.clone()))
            .map_err(|err| vec![format!("Invalid image processing options: {err}")])?;

        let mut errors = Vec::new();
        if let Some(quality) = parsed.quality {
            if !(1..=100).contains(&quality) {
                errors.push(format!("Image quality {quality} must be between 1 and 100"));
            }
        }
        if let Some(resize) = &parsed.resize {
            if resize.width == Some(0) || resize.height == Some(0) {
                errors.push("Resize dimensions must be greater than zero".to_string());
            }
        }

        if errors.is_empty() {
            Ok(parsed)
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageProcessor {
    defaults: ProcessingOptions,
}

impl ImageProcessor {
    pub fn new(defaults: ProcessingOptions) -> Self {
        Self { defaults }
    }
}

fn base_metadata(filename: &str, mime_type: &str, processed: bool) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("originalFilename".into(), Value::from(filename));
    metadata.insert("originalMimeType".into(), Value::from(mime_type));
    metadata.insert("processed".into(), Value::Bool(processed));
    metadata
}

#[async_trait]
impl FileProcessor for ImageProcessor {
    async fn process(
        &self,
        data: Bytes,
        filename: &str,
        mime_type: &str,
        options: &ProcessingOptions,
    ) -> ProcessingResult {
        let merged = merge_options(&self.defaults, options);
        let resolved = match ImageProcessingOptions::from_options(&merged) {
            Ok(resolved) => resolved,
            Err(errors) => {
                return ProcessingResult::failed(
                    data,
                    base_metadata(filename, mime_type, false),
                    errors,
                );
            }
        };

        let probe_input = data.clone();
        let dimensions =
            match tokio::task::spawn_blocking(move || probe_dimensions(&probe_input)).await {
                Ok(dimensions) => dimensions,
                Err(err) => {
                    return ProcessingResult::failed(
                        data,
                        base_metadata(filename, mime_type, false),
                        vec![format!("Image inspection failed: {err}")],
                    );
                }
            };
        debug!(filename, ?dimensions, "image inspected");

        let mut metadata = base_metadata(filename, mime_type, true);
        metadata.insert(
            "processingOptions".into(),
            serde_json::to_value(&resolved).unwrap_or(Value::Null),
        );
        if let Some((width, height)) = dimensions {
            metadata.insert("width".into(), Value::from(width));
            metadata.insert("height".into(), Value::from(height));
        }

        ProcessingResult::succeeded(data, metadata)
    }
}

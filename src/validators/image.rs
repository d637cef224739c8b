//! Image validation: shared rules plus pixel-dimension bounds.

use super::{FileValidator, ValidationResult, ValidationRules, strings, validate_common};
use image::ImageReader;
use std::io::Cursor;

pub const IMAGE_MIME_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "image/bmp",
];

pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp"];

pub const MAX_IMAGE_SIZE: u64 = 10 * 1024 * 1024;
pub const MAX_IMAGE_DIMENSION: u32 = 4096;

pub fn default_rules() -> ValidationRules {
    ValidationRules {
        max_size: Some(MAX_IMAGE_SIZE),
        allowed_mime_types: Some(strings(&IMAGE_MIME_TYPES)),
        allowed_extensions: Some(strings(&IMAGE_EXTENSIONS)),
        min_width: None,
        min_height: None,
        max_width: Some(MAX_IMAGE_DIMENSION),
        max_height: Some(MAX_IMAGE_DIMENSION),
    }
}

/// Read `(width, height)` from the image header without decoding pixels.
///
/// `None` for formats the decoder does not know (SVG) and for payloads that
/// are not images at all.
pub fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[derive(Debug, Clone)]
pub struct ImageValidator {
    rules: ValidationRules,
}

impl ImageValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    fn validate_dimensions(&self, data: &[u8]) -> ValidationResult {
        let rules = &self.rules;
        let bounded = rules.min_width.is_some()
            || rules.min_height.is_some()
            || rules.max_width.is_some()
            || rules.max_height.is_some();
        if !bounded {
            return ValidationResult::ok();
        }
        let Some((width, height)) = probe_dimensions(data) else {
            return ValidationResult::ok();
        };

        let mut errors = Vec::new();
        if let Some(min) = rules.min_width.filter(|min| width < *min) {
            errors.push(format!("Image width {width}px is below minimum {min}px"));
        }
        if let Some(max) = rules.max_width.filter(|max| width > *max) {
            errors.push(format!("Image width {width}px exceeds maximum {max}px"));
        }
        if let Some(min) = rules.min_height.filter(|min| height < *min) {
            errors.push(format!("Image height {height}px is below minimum {min}px"));
        }
        if let Some(max) = rules.max_height.filter(|max| height > *max) {
            errors.push(format!("Image height {height}px exceeds maximum {max}px"));
        }
        ValidationResult::from_errors(errors)
    }
}

impl FileValidator for ImageValidator {
    fn validate(&self, data: &[u8], filename: &str, mime_type: &str) -> ValidationResult {
        let mut results = validate_common(&self.rules, data, filename, mime_type);
        results.push(self.validate_dimensions(data));
        ValidationResult::combine(results)
    }
}

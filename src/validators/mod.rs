//! Per-category file validation.
//!
//! Rules are plain data ([`ValidationRules`]). A validator evaluates every
//! rule and concatenates the messages, so one response lists every
//! violation. Validation is pure: no I/O, no side effects.

pub mod generic;
pub mod image;

use crate::{errors::UploadError, models::FileCategory};
use serde::{Deserialize, Serialize};

pub use generic::GenericValidator;
pub use image::ImageValidator;

/// Verdict plus every collected violation, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// AND the verdicts together and concatenate the error lists.
    pub fn combine(results: impl IntoIterator<Item = ValidationResult>) -> Self {
        let mut valid = true;
        let mut errors = Vec::new();
        for result in results {
            valid &= result.valid;
            errors.extend(result.errors);
        }
        Self {
            valid: valid && errors.is_empty(),
            errors,
        }
    }
}

/// Declarative rule set. Absent fields are not checked.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mime_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<u32>,
}

impl ValidationRules {
    /// Field-wise override: every field present in `overrides` replaces
    /// the one in `self`. Lists are replaced, not unioned.
    pub fn merge(&self, overrides: &ValidationRules) -> ValidationRules {
        ValidationRules {
            max_size: overrides.max_size.or(self.max_size),
            allowed_mime_types: overrides
                .allowed_mime_types
                .clone()
                .or_else(|| self.allowed_mime_types.clone()),
            allowed_extensions: overrides
                .allowed_extensions
                .clone()
                .or_else(|| self.allowed_extensions.clone()),
            min_width: overrides.min_width.or(self.min_width),
            min_height: overrides.min_height.or(self.min_height),
            max_width: overrides.max_width.or(self.max_width),
            max_height: overrides.max_height.or(self.max_height),
        }
    }
}

pub trait FileValidator: Send + Sync {
    fn validate(&self, data: &[u8], filename: &str, mime_type: &str) -> ValidationResult;
}

/// Build the validator for `category`, layering `overrides` over the
/// category defaults.
pub fn create_validator(
    category: FileCategory,
    overrides: &ValidationRules,
) -> Result<Box<dyn FileValidator>, UploadError> {
    match category {
        FileCategory::Image => Ok(Box::new(ImageValidator::new(
            image::default_rules().merge(overrides),
        ))),
        FileCategory::Generic => Ok(Box::new(GenericValidator::new(
            generic::default_rules().merge(overrides),
        ))),
        FileCategory::Document | FileCategory::Video | FileCategory::Audio => {
            Err(UploadError::UnsupportedValidator(category))
        }
    }
}

pub fn validate_size(size: u64, max_size: Option<u64>) -> ValidationResult {
    let mut errors = Vec::new();
    if let Some(max) = max_size {
        if size > max {
            errors.push(format!(
                "File size {size} bytes exceeds maximum allowed size {max} bytes"
            ));
        }
    }
    ValidationResult::from_errors(errors)
}

pub fn validate_mime_type(mime_type: &str, allowed: Option<&[String]>) -> ValidationResult {
    let mut errors = Vec::new();
    if let Some(allowed) = allowed {
        if !allowed.iter().any(|candidate| candidate == mime_type) {
            errors.push(format!(
                "MIME type {mime_type} is not allowed. Allowed types: {}",
                allowed.join(", ")
            ));
        }
    }
    ValidationResult::from_errors(errors)
}

pub fn validate_extension(filename: &str, allowed: Option<&[String]>) -> ValidationResult {
    let mut errors = Vec::new();
    if let Some(allowed) = allowed {
        let extension = checked_extension(filename);
        if !allowed
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(&extension))
        {
            errors.push(format!(
                "File extension .{extension} is not allowed. Allowed extensions: {}",
                allowed.join(", ")
            ));
        }
    }
    ValidationResult::from_errors(errors)
}

/// The size, MIME type and extension rules every category shares.
/// Text after the last `.`, lowercased; empty without a dot. Dotfiles such
/// as `.png` count as having an extension.
fn checked_extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .unwrap_or_default()
}

pub fn validate_common(
    rules: &ValidationRules,
    data: &[u8],
    filename: &str,
    mime_type: &str,
) -> Vec<ValidationResult> {
    vec![
        validate_size(data.len() as u64, rules.max_size),
        validate_mime_type(mime_type, rules.allowed_mime_types.as_deref()),
        validate_extension(filename, rules.allowed_extensions.as_deref()),
    ]
}

pub(crate) fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

//! Category-agnostic validation: only the shared rules apply.

use super::{FileValidator, ValidationResult, ValidationRules, validate_common};

pub const MAX_GENERIC_SIZE: u64 = 10 * 1024 * 1024;

pub fn default_rules() -> ValidationRules {
    ValidationRules {
        max_size: Some(MAX_GENERIC_SIZE),
        ..Default::default()
    }
}

#[derive(Debug, Clone)]
pub struct GenericValidator {
    rules: ValidationRules,
}

impl GenericValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }
}

impl FileValidator for GenericValidator {
    fn validate(&self, data: &[u8], filename: &str, mime_type: &str) -> ValidationResult {
        ValidationResult::combine(validate_common(&self.rules, data, filename, mime_type))
    }
}

//! Shared state handed to every HTTP handler.

use crate::services::UploadService;
use std::{sync::Arc, time::Instant};

/// Per-request limits enforced while decoding multipart bodies.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_size: u64,
    pub max_files: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_files: 10,
        }
    }
}

impl UploadLimits {
    /// Largest request body worth reading: every file at its ceiling, plus
    /// headroom for multipart framing and the options field.
    pub fn body_limit(&self) -> usize {
        let files = self.max_file_size.saturating_mul(self.max_files as u64);
        usize::try_from(files.saturating_add(64 * 1024)).unwrap_or(usize::MAX)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadService,
    pub limits: UploadLimits,
    pub environment: Arc<str>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(uploads: UploadService, limits: UploadLimits, environment: impl Into<Arc<str>>) -> Self {
        Self {
            uploads,
            limits,
            environment: environment.into(),
            started_at: Instant::now(),
        }
    }
}

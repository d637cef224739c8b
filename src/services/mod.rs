pub mod summary;
pub mod upload_service;

pub use summary::{BatchSummary, summarize};
pub use upload_service::{UploadService, UploadServiceConfig};

//! Core data models for the upload pipeline.
//!
//! These entities describe a file on its way through the pipeline and the
//! durable record the storage backend keeps for it. They serialize as
//! camelCase JSON via `serde`, matching the sidecar layout on disk.

pub mod file;
pub mod metadata;

pub use file::{
    FileCategory, FilenameGenerator, NamingStrategy, UploadFailure, UploadOptions, UploadResult,
    UploadedFile,
};
pub use metadata::{ExtraMetadata, StorageMetadata};

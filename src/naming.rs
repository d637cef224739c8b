//! Storage filename generation and MIME/extension helpers.

use crate::{models::NamingStrategy, storage::MAX_FILENAME_LEN};
use chrono::Utc;
use std::path::Path;

/// Longest extension carried into a generated name.
const MAX_EXTENSION_LEN: usize = 16;

/// `{unix_millis}-{16 hex chars}[.ext]`.
///
/// The extension comes from the MIME type when it is known, otherwise from
/// the original filename.
pub fn generate_unique_filename(original_name: &str, mime_type: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let suffix: u64 = rand::random();
    let extension = extension_from_mime(mime_type)
        .map(str::to_string)
        .unwrap_or_else(|| stored_extension(original_name));

    with_extension(format!("{timestamp}-{suffix:016x}"), &extension)
}

/// `{unix_millis}-{8 hex chars}-{sanitized stem}[.ext]`, keeping the
/// original extension. The stem is shortened so the name stays within
/// [`MAX_FILENAME_LEN`].
pub fn generate_filename_with_original(original_name: &str, _mime_type: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let suffix: u32 = rand::random();
    let prefix = format!("{timestamp}-{suffix:08x}-");
    let extension = stored_extension(original_name);

    let reserved = prefix.len() + if extension.is_empty() { 0 } else { extension.len() + 1 };
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let mut stem = sanitize_filename(stem);
    // Sanitized output is ASCII, so any byte index is a char boundary.
    stem.truncate(MAX_FILENAME_LEN.saturating_sub(reserved));
    let stem = stem.trim_matches('.');

    with_extension(format!("{prefix}{stem}"), &extension)
}

/// Dispatch to the generator for a built-in strategy.
pub fn generate_filename(strategy: NamingStrategy, original_name: &str, mime_type: &str) -> String {
    match strategy {
        NamingStrategy::Unique => generate_unique_filename(original_name, mime_type),
        NamingStrategy::WithOriginal => generate_filename_with_original(original_name, mime_type),
    }
}

fn with_extension(base: String, extension: &str) -> String {
    if extension.is_empty() {
        base
    } else {
        format!("{base}.{extension}")
    }
}

/// The original extension, sanitized and capped for use in a stored name.
fn stored_extension(original_name: &str) -> String {
    let mut extension = sanitize_filename(&extension_from_filename(original_name))
        .trim_matches(|c| c == '.' || c == '_')
        .to_string();
    extension.truncate(MAX_EXTENSION_LEN);
    extension
}

/// Replace anything outside `[A-Za-z0-9._-]` with `_`, collapse runs of
/// underscores or dots and lowercase the result.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c.to_ascii_lowercase()
        } else {
            '_'
        };
        if matches!(c, '_' | '.') && out.ends_with(c) {
            continue;
        }
        out.push(c);
    }
    out
}

/// Lowercased extension of `filename` without the dot, or empty.
pub fn extension_from_filename(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

pub fn extension_from_mime(mime_type: &str) -> Option<&'static str> {
    let ext = match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/bmp" => "bmp",
        "application/pdf" => "pdf",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "text/plain" => "txt",
        "text/csv" => "csv",
        "application/json" => "json",
        "video/mp4" => "mp4",
        "video/mpeg" => "mpeg",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        "audio/mpeg" => "mp3",
        "audio/wav" => "wav",
        "audio/ogg" => "ogg",
        _ => return None,
    };
    Some(ext)
}

/// Human-readable byte count, 1024-based: `0 Bytes`, `1.5 KB`, `10 MB`.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{value:.decimals$}");
    let trimmed = if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.')
    } else {
        rendered.as_str()
    };
    format!("{trimmed} {}", UNITS[unit])
}

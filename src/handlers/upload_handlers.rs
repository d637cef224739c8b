//! HTTP handlers for uploads, downloads, metadata and deletion.
//! Multipart decoding happens here; everything else is delegated to
//! `UploadService`.

use crate::{
    errors::{AppError, UploadError},
    models::{UploadOptions, UploadedFile},
    services::{summarize, summary::UploadedFileSummary},
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, info};

const OPTIONS_FIELD: &str = "options";
const SINGLE_FILE_FIELD: &str = "file";
const MULTIPLE_FILES_FIELD: &str = "files";

/// Decoded multipart body: every part named `file_field`, plus the optional
/// JSON `options` part.
async fn read_multipart(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(Vec<UploadedFile>, UploadOptions), AppError> {
    let mut files = Vec::new();
    let mut options = UploadOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::new(err.status(), format!("invalid multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == OPTIONS_FIELD {
            let text = field
                .text()
                .await
                .map_err(|err| AppError::bad_request(format!("invalid options field: {err}")))?;
            if !text.trim().is_empty() {
                options = serde_json::from_str(&text).map_err(UploadError::from)?;
            }
        } else if name == file_field {
            let original_name = field.file_name().unwrap_or_default().to_string();
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|err| AppError::new(err.status(), format!("could not read file: {err}")))?;
            files.push(UploadedFile::new(name, original_name, mime_type, data));
        } else {
            debug!("ignoring multipart field `{}`", name);
        }
    }

    Ok((files, options))
}

/// `POST /api/uploads/single`
pub async fn upload_single_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (files, options) = read_multipart(multipart, SINGLE_FILE_FIELD).await?;
    let Some(file) = files.into_iter().next() else {
        return Err(AppError::bad_request("No file uploaded"));
    };

    let result = state.uploads.upload_file(&file, &options).await;
    if result.success {
        let body = json!({ "success": true, "data": UploadedFileSummary::from(&result) });
        return Ok((StatusCode::CREATED, Json(body)).into_response());
    }

    let status = match result.failure {
        Some(failure) if !failure.is_client_error() => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    let body = json!({ "success": false, "errors": result.errors });
    Ok((status, Json(body)).into_response())
}

/// `POST /api/uploads/multiple`. Never all-or-nothing; per-file outcomes
/// are itemized in the body.
pub async fn upload_multiple_files(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (files, options) = read_multipart(multipart, MULTIPLE_FILES_FIELD).await?;
    if files.is_empty() {
        return Err(AppError::bad_request("No files uploaded"));
    }
    if files.len() > state.limits.max_files {
        return Err(AppError::bad_request(format!(
            "Too many files: {} (max {})",
            files.len(),
            state.limits.max_files
        )));
    }

    let results = state.uploads.upload_files(&files, &options).await;
    let summary = summarize(&results);
    info!(
        "batch upload finished: {} stored, {} failed",
        summary.data.uploaded, summary.data.failed
    );
    Ok((StatusCode::CREATED, Json(summary)).into_response())
}

/// `GET /api/uploads/{filename}`: raw bytes with the recorded content type.
pub async fn get_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let Some(data) = state.uploads.retrieve_file(&filename).await? else {
        return Err(AppError::not_found("File not found"));
    };

    let mut response = Response::new(Body::from(data));
    if let Some(meta) = state.uploads.get_file_metadata(&filename).await? {
        if let Ok(value) = HeaderValue::from_str(&meta.mime_type) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
    }
    Ok(response)
}

/// `DELETE /api/uploads/{filename}`
pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.uploads.delete_file(&filename).await {
        return Err(AppError::not_found("File not found or could not be deleted"));
    }
    Ok(Json(json!({ "success": true, "message": "File deleted successfully" })))
}

/// `GET /api/uploads/{filename}/metadata`
pub async fn get_file_metadata(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match state.uploads.get_file_metadata(&filename).await? {
        Some(meta) => Ok(Json(json!({ "success": true, "data": meta }))),
        None => Err(AppError::not_found("File not found")),
    }
}

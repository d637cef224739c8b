//! Defines routes for the upload API.
//!
//! ## Structure
//! - **Service endpoints**
//!   - `GET    /api/health` — liveness
//!   - `GET    /api/ready`  — storage round-trip readiness
//!
//! - **Upload endpoints**
//!   - `POST   /api/uploads/single`              — one file (`file` part)
//!   - `POST   /api/uploads/multiple`            — a batch (`files` parts)
//!   - `GET    /api/uploads/{filename}`          — download
//!   - `DELETE /api/uploads/{filename}`          — delete blob and record
//!   - `GET    /api/uploads/{filename}/metadata` — stored record
//!
//! Both upload endpoints accept an optional `options` part holding JSON
//! upload options.

use crate::{
    handlers::{
        health_handlers::{health, ready},
        upload_handlers::{
            delete_file, get_file, get_file_metadata, upload_multiple_files, upload_single_file,
        },
    },
    state::{AppState, UploadLimits},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build the router for the upload API.
///
/// The router carries shared state (`AppState`) to all handlers; the
/// request body limit is derived from `limits`.
pub fn routes(limits: UploadLimits) -> Router<AppState> {
    let uploads = Router::new()
        .route("/single", post(upload_single_file))
        .route("/multiple", post(upload_multiple_files))
        .route("/{filename}", get(get_file).delete(delete_file))
        .route("/{filename}/metadata", get(get_file_metadata))
        .layer(DefaultBodyLimit::max(limits.body_limit()));

    Router::new()
        .route("/api/health", get(health))
        .route("/api/ready", get(ready))
        .nest("/api/uploads", uploads)
}

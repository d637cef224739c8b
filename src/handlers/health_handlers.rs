//! Health & readiness handlers.
//!
//! - GET /api/health -> liveness with uptime and environment
//! - GET /api/ready  -> readiness that round-trips a probe file through storage

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

const PROBE_CONTENT: &[u8] = b"readyz";

/// `GET /api/health`
///
/// Cheap liveness probe; never performs I/O.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
            timestamp: Utc::now().to_rfc3339(),
            uptime_seconds: state.started_at.elapsed().as_secs_f64(),
            environment: state.environment.to_string(),
        }),
    )
}

/// `GET /api/ready`
///
/// Stores, reads back and deletes a probe file through the configured
/// backend. HTTP 200 when every step passes, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let storage = state.uploads.storage();
    let probe = format!(".readyz-{}", Uuid::new_v4());

    let storage_check = match storage
        .store(
            Bytes::from_static(PROBE_CONTENT),
            &probe,
            "text/plain",
            Default::default(),
        )
        .await
    {
        Ok(_) => {
            let read_back = storage.retrieve(&probe).await;
            let cleanup = storage.delete(&probe).await;
            match (read_back, cleanup) {
                (Ok(Some(bytes)), Ok(())) if bytes.as_ref() == PROBE_CONTENT => (true, None),
                (Ok(Some(bytes)), Err(e)) if bytes.as_ref() == PROBE_CONTENT => {
                    (false, Some(format!("could not remove probe: {}", e)))
                }
                (Ok(Some(_)), _) => (false, Some("probe content mismatch".to_string())),
                (Ok(None), _) => (false, Some("probe file vanished".to_string())),
                (Err(e), _) => (false, Some(format!("could not read probe: {}", e))),
            }
        }
        Err(e) => (false, Some(format!("could not write probe: {}", e))),
    };

    let overall_ok = storage_check.0;
    let mut checks = HashMap::new();
    checks.insert(
        "storage",
        CheckStatus {
            ok: storage_check.0,
            error: storage_check.1,
        },
    );

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    timestamp: String,
    uptime_seconds: f64,
    environment: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

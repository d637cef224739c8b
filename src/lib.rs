//! File upload pipeline: validate → process → name → store, over
//! interchangeable storage backends, plus the axum surface that hosts it.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod naming;
pub mod processors;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod validators;

use axum::Router;

/// Build the full application router around an upload service.
pub fn app(state: state::AppState) -> Router {
    routes::routes::routes(state.limits).with_state(state)
}

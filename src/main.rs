use anyhow::Result;
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use upload_pipeline::{
    config::AppConfig, services::UploadService, state::AppState, storage::create_storage_adapter,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting upload-pipeline with config: {:?}", cfg);

    // --- Initialize storage backend ---
    let storage_config = cfg.storage_config()?;
    tracing::info!("Using {} storage", storage_config.kind());
    let storage = create_storage_adapter(storage_config)?;

    // --- Initialize core service ---
    let uploads = UploadService::new(storage, cfg.service_config());
    let state = AppState::new(uploads, cfg.upload_limits(), cfg.environment.clone());

    // --- Build router ---
    let app = upload_pipeline::app(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

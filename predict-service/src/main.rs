use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use predict_service::{router, AppState, LogFormat, ServiceConfig};

const SERVICE_NAME: &str = "predict-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env();

    match config.log_format {
        LogFormat::Json => predict_core::init_tracing_json(SERVICE_NAME),
        LogFormat::Text => predict_core::init_tracing(SERVICE_NAME),
    }

    // Without a pipeline no prediction can be served: fail before binding.
    let pipeline = ml_pipeline::load_shared(&config.pipeline_path).map_err(|e| {
        error!(path = %config.pipeline_path.display(), error = %e, "Cannot start without a prediction pipeline");
        anyhow::Error::new(e)
    })?;

    if let Err(e) = predict_service::metrics::init_metrics() {
        error!(error = %e, "Metrics disabled: failed to install Prometheus recorder");
    }

    let state = AppState::new(pipeline, &config);
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(
        addr = %config.bind_addr,
        pipeline = %config.pipeline_path.display(),
        preview_rows = config.preview_rows,
        "Prediction service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Prediction service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

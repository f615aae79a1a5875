//! Diabetes Prediction Service
//!
//! Interactive front-end for the pre-trained diabetes classifier:
//! - Manual Input mode: one patient entered through a bounded form
//! - Upload CSV mode: a whole table scored at once and offered for download
//!
//! Endpoints:
//! - GET  /                          - Mode selection (`?mode=manual|upload`)
//! - POST /manual/predict            - Predict from the manual input form
//! - POST /upload                    - Upload a CSV file and preview it
//! - POST /upload/{id}/predict       - Predict for the uploaded data
//! - GET  /upload/{id}/download      - Download `diabetes_predictions.csv`
//! - POST /api/predict               - JSON prediction for one record
//! - POST /api/predict/batch         - CSV in, CSV with predictions out
//! - GET  /health                    - Health check
//! - GET  /ready                     - Readiness check
//! - GET  /metrics                   - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;
pub mod views;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use config::{LogFormat, ServiceConfig};
pub use state::AppState;

/// Build the application router.
///
/// Uploads have no size limit, so the default body limit is lifted.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/manual/predict", post(handlers::manual_predict))
        .route("/upload", post(handlers::upload))
        .route("/upload/{id}/predict", post(handlers::upload_predict))
        .route("/upload/{id}/download", get(handlers::upload_download))
        .route("/api/predict", post(handlers::api_predict))
        .route("/api/predict/batch", post(handlers::api_predict_batch))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

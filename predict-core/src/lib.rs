//! Predict Core Library
//!
//! Provides the types shared by the pipeline and the service:
//! - Feature records collected from the manual input form
//! - Feature tables parsed from uploaded CSV files
//! - Prediction labels and probability formatting
//! - Tracing initialisation

pub mod label;
pub mod record;
pub mod table;

// Re-export commonly used items
pub use label::{format_probability, PredictionLabel, PREDICTION_COLUMN};
pub use record::{FeatureRecord, GenHealth, RecordError, Sex, FEATURE_COLUMNS};
pub use table::{FeatureTable, TableError};

/// Initialize tracing with standard configuration
pub fn init_tracing(service_name: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name, "debug")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();
}

/// Initialize tracing with JSON output (for production)
pub fn init_tracing_json(service_name: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name, "info")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();
}

/// Crate names use underscores in tracing targets.
fn default_directives(service_name: &str, http_level: &str) -> String {
    let target = service_name.replace('-', "_");
    format!("{target}=info,ml_pipeline=info,predict_core=info,tower_http={http_level}")
}

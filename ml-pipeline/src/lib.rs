//! ML Pipeline - loader and evaluator for the pre-trained classifier
//!
//! This crate reads the prediction pipeline exported by the training job and
//! evaluates it over feature tables.
//!
//! # Architecture
//!
//! The pipeline is loaded once per process and cached:
//! - [`load_shared`] deserializes the file on first use and returns the same
//!   `Arc<Pipeline>` on every later call
//! - a failed load is fatal for the caller; nothing is retried in here
//! - the loaded pipeline is never mutated, so it is shared without locks
//!
//! # Example
//!
//! ```ignore
//! use ml_pipeline::{load_shared, Classifier};
//! use predict_core::FeatureRecord;
//!
//! fn main() -> anyhow::Result<()> {
//!     let pipeline = load_shared("diabetes_pipeline.json")?;
//!     let table = FeatureRecord::default().to_table();
//!
//!     let label = pipeline.default_model().predict(&table)?[0];
//!     let [_, p] = pipeline.default_model().predict_proba(&table)?[0];
//!
//!     println!("{label}: {p:.2}");
//!     Ok(())
//! }
//! ```

mod error;
mod loader;
mod model;

// Re-export main types for convenience
pub use error::PipelineError;
pub use loader::{load_shared, shared, Pipeline, DEFAULT_MODEL, DEFAULT_PIPELINE_PATH};
pub use model::{CategoricalTerm, Classifier, LogisticRegression, ModelKind, NumericTerm};

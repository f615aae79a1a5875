use std::path::PathBuf;
use thiserror::Error;

use crate::model::ModelKind;

/// Errors that can occur while loading or evaluating the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read pipeline file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to deserialize pipeline: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("pipeline does not contain a fitted {0} model")]
    MissingModel(ModelKind),

    #[error("{model} model has an invalid parameter: {detail}")]
    InvalidParameter { model: ModelKind, detail: String },

    #[error("input is missing column '{column}' required by the model")]
    MissingColumn { column: String },

    #[error("row {row}: column '{column}' has invalid value '{value}'")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },
}

impl PipelineError {
    /// True for errors caused by the submitted table rather than the
    /// pipeline file itself.
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::MissingColumn { .. } | Self::InvalidValue { .. })
    }
}

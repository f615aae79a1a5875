//! Pipeline loading and the process-wide cached instance.
//!
//! The pipeline file is produced by an external training job. It is read
//! once, checked, and from then on shared read-only: nothing in this crate
//! mutates a [`Pipeline`] after construction, so the cached instance is
//! handed out as a plain `Arc` without any locking.

use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::PipelineError;
use crate::model::{LogisticRegression, ModelKind};

/// Default location of the pipeline file, relative to the working directory.
pub const DEFAULT_PIPELINE_PATH: &str = "diabetes_pipeline.json";

/// The model every prediction goes through.
pub const DEFAULT_MODEL: ModelKind = ModelKind::LogisticRegression;

/// Cached pipeline shared by every request for the life of the process.
static SHARED_PIPELINE: OnceCell<Arc<Pipeline>> = OnceCell::new();

/// Pre-trained prediction pipeline: a collection of fitted models.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    models: BTreeMap<ModelKind, LogisticRegression>,
}

/// On-disk layout, turned into a [`Pipeline`] only after checking.
#[derive(Deserialize)]
struct PipelineFile {
    models: BTreeMap<ModelKind, LogisticRegression>,
}

impl Pipeline {
    /// Read and check a pipeline file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading prediction pipeline");

        let file = std::fs::File::open(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let pipeline = Self::from_reader(std::io::BufReader::new(file))?;

        info!(
            path = %path.display(),
            models = pipeline.models.len(),
            "Prediction pipeline loaded"
        );
        Ok(pipeline)
    }

    /// Deserialize a pipeline from JSON read out of `reader`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PipelineError> {
        Self::checked(serde_json::from_reader(reader)?)
    }

    /// Deserialize a pipeline from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        Self::checked(serde_json::from_str(json)?)
    }

    fn checked(file: PipelineFile) -> Result<Self, PipelineError> {
        if !file.models.contains_key(&DEFAULT_MODEL) {
            return Err(PipelineError::MissingModel(DEFAULT_MODEL));
        }
        for (kind, model) in &file.models {
            model.check(*kind)?;
            debug!(
                model = %kind,
                columns = model.columns().count(),
                "Model parameters checked"
            );
        }
        Ok(Self {
            models: file.models,
        })
    }

    /// Look up a fitted model.
    pub fn model(&self, kind: ModelKind) -> Result<&LogisticRegression, PipelineError> {
        self.models
            .get(&kind)
            .ok_or(PipelineError::MissingModel(kind))
    }

    /// The model used for all predictions.
    ///
    /// Presence is checked when the pipeline is constructed, so this cannot
    /// fail on a loaded pipeline.
    pub fn default_model(&self) -> &LogisticRegression {
        &self.models[&DEFAULT_MODEL]
    }

    /// Kinds of the fitted models in the pipeline.
    pub fn kinds(&self) -> impl Iterator<Item = ModelKind> + '_ {
        self.models.keys().copied()
    }
}

/// Load the pipeline on first call; return the same instance afterwards.
///
/// Later calls never touch the file system, whatever `path` they pass. A
/// failed load leaves nothing cached, so the next call tries again.
pub fn load_shared(path: impl AsRef<Path>) -> Result<Arc<Pipeline>, PipelineError> {
    SHARED_PIPELINE
        .get_or_try_init(|| {
            Pipeline::from_path(path.as_ref())
                .map(Arc::new)
                .inspect_err(|e| error!(error = %e, "Failed to load prediction pipeline"))
        })
        .cloned()
}

/// The cached pipeline, if [`load_shared`] has succeeded.
pub fn shared() -> Option<Arc<Pipeline>> {
    SHARED_PIPELINE.get().cloned()
}

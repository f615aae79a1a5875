//! Fitted models contained in the pipeline.
//!
//! The trainer exports a logistic regression together with the parameters of
//! its preprocessing steps (standard scaling for numeric columns, one-hot
//! weights for categorical columns). Evaluation here is a pure function of
//! those parameters and the input row.

use predict_core::{FeatureTable, PredictionLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::PipelineError;

/// Models the pipeline can contain, keyed in the file by their display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "Logistic Regression", alias = "logistic_regression")]
    LogisticRegression,
}

impl ModelKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LogisticRegression => "Logistic Regression",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predict and predict-probability over a feature table.
pub trait Classifier {
    /// Per-row `[P(class 0), P(class 1)]`.
    fn predict_proba(&self, table: &FeatureTable) -> Result<Vec<[f64; 2]>, PipelineError>;

    /// Per-row predicted label.
    fn predict(&self, table: &FeatureTable) -> Result<Vec<PredictionLabel>, PipelineError>;
}

/// Standard-scaled numeric input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericTerm {
    pub column: String,
    pub center: f64,
    pub scale: f64,
    pub coefficient: f64,
}

/// One-hot encoded categorical input; unseen levels contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalTerm {
    pub column: String,
    pub levels: BTreeMap<String, f64>,
}

fn default_threshold() -> f64 {
    0.5
}

/// Binary logistic regression over scaled and encoded features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub numeric: Vec<NumericTerm>,
    #[serde(default)]
    pub categorical: Vec<CategoricalTerm>,
}

/// Column positions resolved against one table.
struct Binding<'a> {
    numeric: Vec<(usize, &'a NumericTerm)>,
    categorical: Vec<(usize, &'a CategoricalTerm)>,
}

impl LogisticRegression {
    /// Structural checks run once at load time.
    pub(crate) fn check(&self, kind: ModelKind) -> Result<(), PipelineError> {
        let invalid = |detail: String| PipelineError::InvalidParameter {
            model: kind,
            detail,
        };

        if !self.intercept.is_finite() {
            return Err(invalid("intercept is not finite".to_string()));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(invalid(format!(
                "threshold {} is outside (0, 1)",
                self.threshold
            )));
        }
        for term in &self.numeric {
            if !(term.center.is_finite() && term.coefficient.is_finite()) {
                return Err(invalid(format!("{} has a non-finite parameter", term.column)));
            }
            if !term.scale.is_finite() || term.scale == 0.0 {
                return Err(invalid(format!("{} has scale {}", term.column, term.scale)));
            }
        }
        for term in &self.categorical {
            if let Some((level, _)) = term.levels.iter().find(|(_, w)| !w.is_finite()) {
                return Err(invalid(format!(
                    "{} level '{}' has a non-finite weight",
                    term.column, level
                )));
            }
        }
        Ok(())
    }

    /// Every column name the model reads.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .map(|t| t.column.as_str())
            .chain(self.categorical.iter().map(|t| t.column.as_str()))
    }

    fn bind<'a>(&'a self, table: &FeatureTable) -> Result<Binding<'a>, PipelineError> {
        let locate = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| PipelineError::MissingColumn {
                    column: column.to_string(),
                })
        };

        Ok(Binding {
            numeric: self
                .numeric
                .iter()
                .map(|t| locate(&t.column).map(|idx| (idx, t)))
                .collect::<Result<_, PipelineError>>()?,
            categorical: self
                .categorical
                .iter()
                .map(|t| locate(&t.column).map(|idx| (idx, t)))
                .collect::<Result<_, PipelineError>>()?,
        })
    }

    /// Linear decision value for one row. `row_number` is 1-based and only
    /// used for error reporting.
    fn decision(
        &self,
        binding: &Binding<'_>,
        row: &[String],
        row_number: usize,
    ) -> Result<f64, PipelineError> {
        let mut z = self.intercept;

        for (idx, term) in &binding.numeric {
            let cell = row[*idx].trim();
            let x = cell
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .ok_or_else(|| PipelineError::InvalidValue {
                    column: term.column.clone(),
                    row: row_number,
                    value: cell.to_string(),
                })?;
            z += term.coefficient * (x - term.center) / term.scale;
        }

        for (idx, term) in &binding.categorical {
            z += term.levels.get(row[*idx].trim()).copied().unwrap_or(0.0);
        }

        Ok(z)
    }

    fn positive_probabilities(&self, table: &FeatureTable) -> Result<Vec<f64>, PipelineError> {
        let binding = self.bind(table)?;
        table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| self.decision(&binding, row, i + 1).map(sigmoid))
            .collect()
    }
}

impl Classifier for LogisticRegression {
    fn predict_proba(&self, table: &FeatureTable) -> Result<Vec<[f64; 2]>, PipelineError> {
        Ok(self
            .positive_probabilities(table)?
            .into_iter()
            .map(|p| [1.0 - p, p])
            .collect())
    }

    fn predict(&self, table: &FeatureTable) -> Result<Vec<PredictionLabel>, PipelineError> {
        Ok(self
            .positive_probabilities(table)?
            .into_iter()
            .map(|p| {
                // A tie is the negative class.
                if p > self.threshold {
                    PredictionLabel::Diabetic
                } else {
                    PredictionLabel::NonDiabetic
                }
            })
            .collect())
    }
}

/// Logistic function, split on sign to avoid overflow in `exp`.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

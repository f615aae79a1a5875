use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the column appended to uploaded tables.
pub const PREDICTION_COLUMN: &str = "Prediction";

/// Binary outcome of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionLabel {
    #[serde(rename = "Non-Diabetic")]
    NonDiabetic,
    Diabetic,
}

impl PredictionLabel {
    /// Map a class index (0 or 1) to its label.
    pub const fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(Self::NonDiabetic),
            1 => Some(Self::Diabetic),
            _ => None,
        }
    }

    pub const fn class(self) -> u8 {
        match self {
            Self::NonDiabetic => 0,
            Self::Diabetic => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NonDiabetic => "Non-Diabetic",
            Self::Diabetic => "Diabetic",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a probability as a percentage with two decimals, e.g. `12.34%`.
pub fn format_probability(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

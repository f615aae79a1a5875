//! Single-patient feature record collected by the manual input form.
//!
//! Field names double as the column names the pipeline was trained on, so a
//! record can be turned into a one-row [`FeatureTable`] without any mapping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::table::FeatureTable;

/// Column names in the order the pipeline expects them.
pub const FEATURE_COLUMNS: [&str; 15] = [
    "bmi",
    "phys_health",
    "high_blood_pressure",
    "high_cholesterol",
    "smoker",
    "stroke",
    "heart_disease_or_attack",
    "physical_activity",
    "fruits",
    "veggies",
    "heavy_alcohol_consumption",
    "gen_health",
    "sex",
    "age",
    "income",
];

/// Widget bounds for the numeric fields.
pub const BMI_RANGE: RangeInclusive<f64> = 10.0..=60.0;
pub const PHYS_HEALTH_RANGE: RangeInclusive<u8> = 0..=30;
pub const AGE_RANGE: RangeInclusive<u8> = 18..=80;
pub const INCOME_RANGE: RangeInclusive<u8> = 1..=8;

/// Errors raised when a record falls outside the form widget bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: String,
        max: String,
        value: String,
    },

    #[error("{field} must be 0 or 1, got {value}")]
    InvalidFlag { field: &'static str, value: u8 },
}

/// Self-reported general health category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GenHealth {
    #[default]
    Poor,
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Excellent,
}

impl GenHealth {
    pub const ALL: [Self; 5] = [
        Self::Poor,
        Self::Fair,
        Self::Good,
        Self::VeryGood,
        Self::Excellent,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "Poor",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::VeryGood => "Very Good",
            Self::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for GenHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One patient's input values for all model-required attributes.
///
/// Binary risk flags are kept as `0`/`1` integers because that is how they
/// appear in the training data and in uploaded files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub bmi: f64,
    pub phys_health: u8,
    pub high_blood_pressure: u8,
    pub high_cholesterol: u8,
    pub smoker: u8,
    pub stroke: u8,
    pub heart_disease_or_attack: u8,
    pub physical_activity: u8,
    pub fruits: u8,
    pub veggies: u8,
    pub heavy_alcohol_consumption: u8,
    pub gen_health: GenHealth,
    pub sex: Sex,
    pub age: u8,
    pub income: u8,
}

impl Default for FeatureRecord {
    /// The values the manual input form starts with.
    fn default() -> Self {
        Self {
            bmi: 25.0,
            phys_health: 5,
            high_blood_pressure: 0,
            high_cholesterol: 0,
            smoker: 0,
            stroke: 0,
            heart_disease_or_attack: 0,
            physical_activity: 0,
            fruits: 0,
            veggies: 0,
            heavy_alcohol_consumption: 0,
            gen_health: GenHealth::default(),
            sex: Sex::default(),
            age: 35,
            income: 4,
        }
    }
}

impl FeatureRecord {
    /// Binary flag fields paired with their column names.
    pub fn flags(&self) -> [(&'static str, u8); 9] {
        [
            ("high_blood_pressure", self.high_blood_pressure),
            ("high_cholesterol", self.high_cholesterol),
            ("smoker", self.smoker),
            ("stroke", self.stroke),
            ("heart_disease_or_attack", self.heart_disease_or_attack),
            ("physical_activity", self.physical_activity),
            ("fruits", self.fruits),
            ("veggies", self.veggies),
            ("heavy_alcohol_consumption", self.heavy_alcohol_consumption),
        ]
    }

    /// Check the record against the bounds of the input widgets.
    pub fn validate(&self) -> Result<(), RecordError> {
        if !self.bmi.is_finite() || !BMI_RANGE.contains(&self.bmi) {
            return Err(out_of_range("bmi", &BMI_RANGE, self.bmi));
        }
        if !PHYS_HEALTH_RANGE.contains(&self.phys_health) {
            return Err(out_of_range(
                "phys_health",
                &PHYS_HEALTH_RANGE,
                self.phys_health,
            ));
        }
        for (field, value) in self.flags() {
            if value > 1 {
                return Err(RecordError::InvalidFlag { field, value });
            }
        }
        if !AGE_RANGE.contains(&self.age) {
            return Err(out_of_range("age", &AGE_RANGE, self.age));
        }
        if !INCOME_RANGE.contains(&self.income) {
            return Err(out_of_range("income", &INCOME_RANGE, self.income));
        }
        Ok(())
    }

    /// Cell values in [`FEATURE_COLUMNS`] order.
    pub fn values(&self) -> Vec<String> {
        let mut values = Vec::with_capacity(FEATURE_COLUMNS.len());
        values.push(self.bmi.to_string());
        values.push(self.phys_health.to_string());
        values.extend(self.flags().iter().map(|(_, v)| v.to_string()));
        values.push(self.gen_health.as_str().to_string());
        values.push(self.sex.as_str().to_string());
        values.push(self.age.to_string());
        values.push(self.income.to_string());
        values
    }

    /// Build the one-row table submitted to the pipeline.
    pub fn to_table(&self) -> FeatureTable {
        FeatureTable::from_parts(
            FEATURE_COLUMNS.iter().map(ToString::to_string).collect(),
            vec![self.values()],
        )
    }
}

fn out_of_range<T: fmt::Display>(
    field: &'static str,
    range: &RangeInclusive<T>,
    value: T,
) -> RecordError {
    RecordError::OutOfRange {
        field,
        min: range.start().to_string(),
        max: range.end().to_string(),
        value: value.to_string(),
    }
}

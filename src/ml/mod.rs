//! Machine Learning Module
//!
//! Inference for the pretrained demand, production and price regressors.
//!
//! # Architecture
//! - Feature schemas fix the column order each model was trained on
//! - Artifacts are loaded once at startup and shared read-only
//! - Every model is a pure `FeatureVector -> f64` function

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};

pub mod inference;
pub mod models;
pub mod xgboost;

pub use inference::{load_model, ModelSet};
pub use models::{DenseNetwork, LinearRegressionModel, Regressor};
pub use xgboost::GradientBoostedTrees;

/// Weather-only inputs, in model order
pub const WEATHER_FIELDS: [&str; 8] = [
    "temperature",
    "feels_like",
    "humidity",
    "pressure",
    "wind_speed",
    "wind_direction",
    "cloud_coverage",
    "precipitation",
];

/// Calendar inputs followed by the weather inputs, in model order
pub const CALENDAR_FIELDS: [&str; 14] = [
    "hour",
    "day_of_week",
    "day",
    "month",
    "year",
    "season",
    "temperature",
    "feels_like",
    "humidity",
    "pressure",
    "wind_speed",
    "wind_direction",
    "cloud_coverage",
    "precipitation",
];

/// Ordered input layout expected by a model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeatureSchema {
    /// 8 weather fields (dense network models)
    Weather,
    /// 6 calendar fields + 8 weather fields (gradient boosted models)
    Calendar,
}

impl FeatureSchema {
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            FeatureSchema::Weather => &WEATHER_FIELDS,
            FeatureSchema::Calendar => &CALENDAR_FIELDS,
        }
    }

    pub fn width(&self) -> usize {
        self.field_names().len()
    }
}

/// On-disk artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelFormat {
    /// XGBoost JSON model (`Booster.save_model("*.json")`)
    Xgboost,
    /// Dense network weights exported from Keras as JSON
    Dense,
    /// Coefficients + intercept
    Linear,
}

/// Feature row tagged with the schema it was built for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub schema: FeatureSchema,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(schema: FeatureSchema, values: Vec<f64>) -> ForecastResult<Self> {
        if values.len() != schema.width() {
            return Err(ForecastError::Validation(format!(
                "{} schema expects {} features, got {}",
                schema,
                schema.width(),
                values.len()
            )));
        }
        Ok(Self { schema, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        self.schema.field_names()
    }

    /// Value of a named field, if the schema has it
    pub fn get(&self, name: &str) -> Option<f64> {
        self.feature_names()
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.values.get(i).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_widths() {
        assert_eq!(FeatureSchema::Weather.width(), 8);
        assert_eq!(FeatureSchema::Calendar.width(), 14);
    }

    #[test]
    fn test_calendar_schema_ends_with_weather_schema() {
        assert_eq!(&CALENDAR_FIELDS[6..], &WEATHER_FIELDS[..]);
    }

    #[test]
    fn test_feature_vector_width_checked() {
        let err = FeatureVector::new(FeatureSchema::Weather, vec![1.0; 14]).unwrap_err();
        assert!(matches!(err, ForecastError::Validation(_)));

        let fv = FeatureVector::new(FeatureSchema::Weather, vec![0.0; 8]).unwrap();
        assert_eq!(fv.len(), 8);
        assert!(!fv.is_empty());
    }

    #[test]
    fn test_feature_lookup_by_name() {
        let values = (0..14).map(f64::from).collect();
        let fv = FeatureVector::new(FeatureSchema::Calendar, values).unwrap();
        assert_eq!(fv.get("hour"), Some(0.0));
        assert_eq!(fv.get("season"), Some(5.0));
        assert_eq!(fv.get("precipitation"), Some(13.0));
        assert_eq!(fv.get("unknown"), None);
    }

    #[test]
    fn test_format_display() {
        assert_eq!(ModelFormat::Xgboost.to_string(), "xgboost");
        assert_eq!(FeatureSchema::Calendar.to_string(), "calendar");
    }
}

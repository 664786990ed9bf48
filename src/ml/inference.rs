//! Model loading and the process-wide model set.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::{DenseNetwork, FeatureSchema, FeatureVector, GradientBoostedTrees, LinearRegressionModel, ModelFormat, Regressor};
use crate::config::{ModelArtifactConfig, ModelsConfig};
use crate::domain::Prediction;
use crate::error::{ForecastError, ForecastResult};

/// Load one artifact and check it accepts `schema`'s input width.
pub fn load_model(
    artifact: &ModelArtifactConfig,
    schema: FeatureSchema,
) -> ForecastResult<Arc<dyn Regressor>> {
    let raw = read_artifact(&artifact.path)?;
    let model: Arc<dyn Regressor> = match artifact.format {
        ModelFormat::Xgboost => {
            let ensemble = GradientBoostedTrees::from_json_str(&raw)?;
            debug!(path = %artifact.path.display(), trees = ensemble.tree_count(), "parsed tree ensemble");
            Arc::new(ensemble)
        }
        ModelFormat::Dense => Arc::new(DenseNetwork::from_json_str(&raw)?),
        ModelFormat::Linear => Arc::new(serde_json::from_str::<LinearRegressionModel>(&raw)?),
    };

    if model.input_width() != schema.width() {
        return Err(ForecastError::Model(format!(
            "{} takes {} inputs but the {} schema has {}",
            artifact.path.display(),
            model.input_width(),
            schema,
            schema.width()
        )));
    }

    info!(
        path = %artifact.path.display(),
        format = %artifact.format,
        %schema,
        "loaded model"
    );
    Ok(model)
}

fn read_artifact(path: &Path) -> ForecastResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        ForecastError::Model(format!("cannot read model artifact {}: {e}", path.display()))
    })
}

/// Regressors consuming the 8-field weather schema
#[derive(Clone)]
pub struct WeatherModels {
    pub demand: Arc<dyn Regressor>,
    pub production: Arc<dyn Regressor>,
    pub price: Arc<dyn Regressor>,
}

/// Regressors consuming the 14-field calendar schema
#[derive(Clone)]
pub struct CalendarModels {
    pub demand: Arc<dyn Regressor>,
    pub production: Arc<dyn Regressor>,
}

/// Every model the service uses, loaded once at startup
#[derive(Clone)]
pub struct ModelSet {
    pub weather: WeatherModels,
    pub calendar: CalendarModels,
}

impl ModelSet {
    pub fn load(cfg: &ModelsConfig) -> ForecastResult<Self> {
        Ok(Self {
            weather: WeatherModels {
                demand: load_model(&cfg.weather.demand, FeatureSchema::Weather)?,
                production: load_model(&cfg.weather.production, FeatureSchema::Weather)?,
                price: load_model(&cfg.weather.price, FeatureSchema::Weather)?,
            },
            calendar: CalendarModels {
                demand: load_model(&cfg.calendar.demand, FeatureSchema::Calendar)?,
                production: load_model(&cfg.calendar.production, FeatureSchema::Calendar)?,
            },
        })
    }

    /// Raw demand/production/price for one weather-schema row
    pub fn predict_weather(&self, features: &FeatureVector) -> ForecastResult<Prediction> {
        expect_schema(features, FeatureSchema::Weather)?;
        Ok(Prediction {
            demand: self.weather.demand.predict(features)?,
            production: self.weather.production.predict(features)?,
            price: self.weather.price.predict(features)?,
        })
    }

    /// Demand and production series for calendar-schema rows
    pub fn predict_calendar(&self, rows: &[FeatureVector]) -> ForecastResult<(Vec<f64>, Vec<f64>)> {
        for row in rows {
            expect_schema(row, FeatureSchema::Calendar)?;
        }
        let demand = self.calendar.demand.predict_batch(rows)?;
        let production = self.calendar.production.predict_batch(rows)?;
        Ok((demand, production))
    }
}

fn expect_schema(features: &FeatureVector, schema: FeatureSchema) -> ForecastResult<()> {
    if features.schema != schema {
        return Err(ForecastError::Model(format!(
            "expected {schema} features, got {}",
            features.schema
        )));
    }
    Ok(())
}

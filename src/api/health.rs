use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::ml::{FeatureSchema, Regressor};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    models: Vec<ModelStatus>,
    charts_enabled: bool,
    price_per_unit: f64,
}

/// One loaded model. Width mismatches fail startup, so every listed model is usable.
#[derive(Debug, Serialize)]
pub struct ModelStatus {
    name: &'static str,
    schema: FeatureSchema,
    input_width: usize,
}

impl ModelStatus {
    fn new(name: &'static str, schema: FeatureSchema, model: &dyn Regressor) -> Self {
        Self {
            name,
            schema,
            input_width: model.input_width(),
        }
    }
}

fn model_statuses(state: &AppState) -> Vec<ModelStatus> {
    let models = &state.engine.models;
    vec![
        ModelStatus::new("demand", FeatureSchema::Weather, models.weather.demand.as_ref()),
        ModelStatus::new("production", FeatureSchema::Weather, models.weather.production.as_ref()),
        ModelStatus::new("price", FeatureSchema::Weather, models.weather.price.as_ref()),
        ModelStatus::new("demand", FeatureSchema::Calendar, models.calendar.demand.as_ref()),
        ModelStatus::new(
            "production",
            FeatureSchema::Calendar,
            models.calendar.production.as_ref(),
        ),
    ]
}

/// GET /health - loaded models and current pricing
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let models = model_statuses(&state);
    tracing::debug!(models = models.len(), "Health check completed");

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now(),
        models,
        charts_enabled: state.charts.is_some(),
        price_per_unit: state.pricing.current(),
    })
}

/// GET /healthz - liveness check
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}

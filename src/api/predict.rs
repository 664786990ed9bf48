use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::api::error::{ApiError, ApiJson};
use crate::app::AppState;

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct PredictRequest {
    #[validate(custom(function = "not_blank"))]
    pub location: String,
    /// Defaults to now
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Forecast slot the prediction was made for
    pub timestamp: DateTime<Utc>,
    pub energy_demand: f64,
    pub energy_produced: f64,
    pub surplus: f64,
    pub wastage: f64,
    pub price: f64,
    pub demand_indexed_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_graph: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_graph: Option<String>,
}

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    req.validate()?;
    let location = req.location.trim();
    let at = req.timestamp.unwrap_or_else(Utc::now);
    let price_per_unit = state.pricing.current();

    let forecast = state.engine.fetch(location).await?;
    let point = state.engine.point_forecast(&forecast, at, price_per_unit)?;

    let (hourly_graph, daily_graph) = match state.charts.clone() {
        Some(renderer) => {
            let hourly = state.engine.hourly_series(&forecast)?;
            let daily = state.engine.daily_series(&forecast)?;
            let name = forecast.location.name.clone();
            let (hourly, daily) = tokio::task::spawn_blocking(move || {
                (
                    renderer.render_hourly(&name, &hourly),
                    renderer.render_daily(&name, &daily),
                )
            })
            .await?;
            (Some(hourly?), Some(daily?))
        }
        None => (None, None),
    };

    info!(
        location,
        slot = %point.timestamp,
        demand = point.prediction.demand,
        production = point.prediction.production,
        "prediction served"
    );
    if point.metrics.wastage > 0.0 {
        warn!(location, wastage = point.metrics.wastage, "production exceeds demand");
    }

    Ok(Json(PredictResponse {
        timestamp: point.timestamp,
        energy_demand: point.prediction.demand,
        energy_produced: point.prediction.production,
        surplus: point.metrics.surplus,
        wastage: point.metrics.wastage,
        price: point.prediction.price,
        demand_indexed_price: point.demand_indexed_price,
        hourly_graph,
        daily_graph,
    }))
}

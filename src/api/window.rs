//! Multi-day summaries over the daily-slot window: revenue, wastage and both combined.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::predict::not_blank;
use crate::api::error::{ApiError, ApiJson};
use crate::app::AppState;
use crate::domain::WindowForecast;
use crate::forecast::metrics;

#[derive(Debug, Deserialize, Validate)]
pub struct WindowRequest {
    #[validate(custom(function = "not_blank"))]
    pub location: String,
    /// Overrides the current base price for this request only
    #[serde(default, alias = "price_per_mw")]
    pub price_per_unit: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RevenueResponse {
    pub location: String,
    pub total_revenue: f64,
    pub price_per_unit: f64,
    pub predicted_production: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct WastageResponse {
    pub location: String,
    pub total_energy_produced: f64,
    pub total_energy_demand: f64,
    pub total_wastage: f64,
    pub suggestion: String,
}

#[derive(Debug, Serialize)]
pub struct CombinedResponse {
    pub location: String,
    pub total_revenue: f64,
    pub total_energy_produced: f64,
    pub total_energy_demand: f64,
    pub total_wastage: f64,
    pub suggested_price: f64,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

async fn load_window(state: &AppState, req: &WindowRequest) -> Result<(WindowForecast, f64), ApiError> {
    req.validate()?;
    let price_per_unit = state.pricing.resolve(req.price_per_unit);
    let window = state.engine.window_forecast(req.location.trim()).await?;
    info!(
        location = %window.location,
        slots = window.points.len(),
        price_per_unit,
        "window forecast"
    );
    Ok((window, price_per_unit))
}

/// POST /predict_revenue
pub async fn predict_revenue(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<WindowRequest>,
) -> Result<Json<RevenueResponse>, ApiError> {
    let (window, price) = load_window(&state, &req).await?;
    let summary = metrics::revenue_summary(&window, price);
    Ok(Json(RevenueResponse {
        location: window.location,
        total_revenue: round2(summary.total_revenue),
        price_per_unit: summary.price_per_unit,
        predicted_production: summary.predicted_production,
    }))
}

/// POST /predict_wastage
pub async fn predict_wastage(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<WindowRequest>,
) -> Result<Json<WastageResponse>, ApiError> {
    let (window, price) = load_window(&state, &req).await?;
    let summary = metrics::wastage_summary(&window, price);
    Ok(Json(WastageResponse {
        location: window.location,
        total_energy_produced: summary.total_energy_produced,
        total_energy_demand: summary.total_energy_demand,
        total_wastage: round2(summary.total_wastage),
        suggestion: summary.suggestion,
    }))
}

/// POST /predict_combined
pub async fn predict_combined(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<WindowRequest>,
) -> Result<Json<CombinedResponse>, ApiError> {
    let (window, price) = load_window(&state, &req).await?;
    let summary = metrics::combined_summary(&window, price);
    Ok(Json(CombinedResponse {
        location: window.location,
        total_revenue: round2(summary.total_revenue),
        total_energy_produced: summary.total_energy_produced,
        total_energy_demand: summary.total_energy_demand,
        total_wastage: round2(summary.total_wastage),
        suggested_price: summary.suggested_price,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2.5, 2.5)]
    #[case(12.3456, 12.35)]
    #[case(-0.004, -0.0)]
    #[case(0.0, 0.0)]
    fn test_round2(#[case] value: f64, #[case] expected: f64) {
        assert_eq!(round2(value), expected);
    }

    #[test]
    fn test_price_alias() {
        let req: WindowRequest =
            serde_json::from_str(r#"{"location": "London", "price_per_mw": 12.5}"#).unwrap();
        assert_eq!(req.price_per_unit, Some(12.5));

        let req: WindowRequest = serde_json::from_str(r#"{"location": "London"}"#).unwrap();
        assert_eq!(req.price_per_unit, None);
    }
}

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::api::error::{ApiError, ApiJson};
use crate::app::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePriceRequest {
    #[validate(range(exclusive_min = 0.0))]
    pub new_price: f64,
}

#[derive(Debug, Serialize)]
pub struct UpdatePriceResponse {
    pub message: String,
    pub price_per_unit: f64,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub price_per_unit: f64,
}

/// POST /update_price
pub async fn update_price(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdatePriceRequest>,
) -> Result<Json<UpdatePriceResponse>, ApiError> {
    req.validate()?;
    let previous = state.pricing.update(req.new_price);
    info!(previous, current = req.new_price, "base price updated");

    Ok(Json(UpdatePriceResponse {
        message: format!("Price updated to {}/unit", req.new_price),
        price_per_unit: req.new_price,
    }))
}

/// GET /price
pub async fn current_price(State(state): State<AppState>) -> Json<PriceResponse> {
    Json(PriceResponse {
        price_per_unit: state.pricing.current(),
    })
}

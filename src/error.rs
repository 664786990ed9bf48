//! Domain error type shared by the weather client, feature pipeline, models
//! and renderer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("location not found: {0}")]
    LocationNotFound(String),

    #[error("weather service error: {0}")]
    Upstream(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForecastError {
    pub fn missing_field(field: &str) -> Self {
        ForecastError::Validation(format!("missing required weather field '{field}'"))
    }
}

impl From<reqwest::Error> for ForecastError {
    fn from(e: reqwest::Error) -> Self {
        ForecastError::Upstream(e.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(e: serde_json::Error) -> Self {
        ForecastError::Model(format!("artifact parse error: {e}"))
    }
}

pub type ForecastResult<T> = Result<T, ForecastError>;

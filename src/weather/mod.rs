//! Weather forecast integration (OpenWeather)
//!
//! Resolves place names to coordinates and fetches the 5-day / 3-hour forecast
//! that feeds the prediction models.

pub mod models;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::WeatherConfig;
use crate::domain::{GeoLocation, WeatherForecast, WeatherRecord};
use crate::error::{ForecastError, ForecastResult};
use models::{ApiErrorBody, CurrentWeatherResponse, ForecastResponse};

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Resolve a place name to coordinates
    async fn locate(&self, place: &str) -> ForecastResult<GeoLocation>;

    /// Fetch the forecast for resolved coordinates
    async fn forecast(&self, location: &GeoLocation) -> ForecastResult<WeatherForecast>;

    async fn forecast_for(&self, place: &str) -> ForecastResult<WeatherForecast> {
        let location = self.locate(place).await?;
        self.forecast(&location).await
    }
}

type ForecastCache = Arc<RwLock<HashMap<String, (Instant, WeatherForecast)>>>;

/// OpenWeather API client
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    units: String,
    cache: ForecastCache,
    ttl: Duration,
}

impl OpenWeatherClient {
    pub fn new(cfg: &WeatherConfig) -> ForecastResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_seconds))
            .user_agent(concat!("energy-forecast/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            units: cfg.units.clone(),
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_secs(cfg.cache_ttl_seconds),
        })
    }

    fn cache_key(location: &GeoLocation) -> String {
        format!("{:.4},{:.4}", location.latitude, location.longitude)
    }

    async fn cached(&self, key: &str) -> Option<WeatherForecast> {
        if self.ttl.is_zero() {
            return None;
        }
        let cache = self.cache.read().await;
        cache
            .get(key)
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, forecast)| forecast.clone())
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> ForecastResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "requesting OpenWeather");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str()), ("units", self.units.as_str())])
            .send()
            .await?;
        Ok(resp)
    }
}

/// Pull the API's own message out of an error body when there is one.
async fn error_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(ApiErrorBody { message: Some(m) }) => format!("HTTP {status}: {m}"),
        _ => format!("HTTP {status}: {body}"),
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn locate(&self, place: &str) -> ForecastResult<GeoLocation> {
        let resp = self
            .get("/data/2.5/weather", &[("q", place.to_string())])
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ForecastError::LocationNotFound(place.to_string()));
        }
        if !resp.status().is_success() {
            let message = error_message(resp).await;
            warn!(place, %message, "geocoding request failed");
            return Err(ForecastError::Upstream(message));
        }

        let current: CurrentWeatherResponse = resp.json().await?;
        let coord = current
            .coord
            .ok_or_else(|| ForecastError::Upstream(format!("no coordinates returned for '{place}'")))?;

        Ok(GeoLocation {
            name: current.name.unwrap_or_else(|| place.to_string()),
            latitude: coord.lat,
            longitude: coord.lon,
        })
    }

    async fn forecast(&self, location: &GeoLocation) -> ForecastResult<WeatherForecast> {
        let key = Self::cache_key(location);
        if let Some(hit) = self.cached(&key).await {
            debug!(location = %location.name, "weather forecast cache hit");
            return Ok(hit);
        }

        let resp = self
            .get(
                "/data/2.5/forecast",
                &[
                    ("lat", location.latitude.to_string()),
                    ("lon", location.longitude.to_string()),
                ],
            )
            .await?;

        if !resp.status().is_success() {
            let message = error_message(resp).await;
            warn!(location = %location.name, %message, "forecast request failed");
            return Err(ForecastError::Upstream(message));
        }

        let raw: ForecastResponse = resp.json().await?;
        let mut records = raw
            .list
            .into_iter()
            .map(WeatherRecord::try_from)
            .collect::<ForecastResult<Vec<_>>>()?;
        records.sort_by_key(|r| r.timestamp);

        info!(
            location = %location.name,
            slots = records.len(),
            "fetched weather forecast"
        );

        let forecast = WeatherForecast {
            location: location.clone(),
            generated_at: Utc::now(),
            records,
        };

        if !self.ttl.is_zero() {
            let mut cache = self.cache.write().await;
            cache.retain(|_, (at, _)| at.elapsed() < self.ttl);
            cache.insert(key, (Instant::now(), forecast.clone()));
        }
        Ok(forecast)
    }
}

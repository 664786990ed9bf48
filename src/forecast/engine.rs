use chrono::{DateTime, Timelike, Utc};
use std::sync::Arc;
use tracing::debug;

use super::features::FeatureExtractor;
use super::metrics;
use crate::config::WeatherConfig;
use crate::domain::{
    DailyPoint, HourlyPoint, PointForecast, WeatherForecast, WindowForecast, WindowPoint,
};
use crate::error::{ForecastError, ForecastResult};
use crate::ml::{FeatureSchema, ModelSet};
use crate::weather::WeatherProvider;

/// Forecast slots plotted on the hourly chart
pub const HOURLY_SLOTS: usize = 24;
/// Slots per day in a 3-hourly forecast
pub const DAILY_STRIDE: usize = 8;

/// Which forecast slots make up the multi-day window
#[derive(Debug, Clone, Copy)]
pub struct WindowSelection {
    /// UTC hour of the slot kept for each day
    pub slot_hour: u32,
    pub max_slots: usize,
}

impl From<&WeatherConfig> for WindowSelection {
    fn from(cfg: &WeatherConfig) -> Self {
        Self {
            slot_hour: cfg.daily_slot_hour,
            max_slots: cfg.daily_slots,
        }
    }
}

impl Default for WindowSelection {
    fn default() -> Self {
        Self {
            slot_hour: 18,
            max_slots: 5,
        }
    }
}

pub struct ForecastEngine {
    pub weather: Arc<dyn WeatherProvider>,
    pub models: ModelSet,
    pub extractor: FeatureExtractor,
    pub window: WindowSelection,
}

impl ForecastEngine {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        models: ModelSet,
        extractor: FeatureExtractor,
        window: WindowSelection,
    ) -> Self {
        Self {
            weather,
            models,
            extractor,
            window,
        }
    }

    pub async fn fetch(&self, place: &str) -> ForecastResult<WeatherForecast> {
        let forecast = self.weather.forecast_for(place).await?;
        if forecast.is_empty() {
            return Err(ForecastError::Upstream(format!(
                "weather service returned no forecast slots for '{place}'"
            )));
        }
        Ok(forecast)
    }

    /// Forecast at the slot closest to `at`.
    ///
    /// The peak surcharge is keyed on the requested hour, not the slot's.
    pub fn point_forecast(
        &self,
        forecast: &WeatherForecast,
        at: DateTime<Utc>,
        price_per_unit: f64,
    ) -> ForecastResult<PointForecast> {
        let record = forecast.closest_to(at).ok_or_else(|| {
            ForecastError::Upstream("forecast has no slots".to_string())
        })?;

        let features = self.extractor.weather_features(record)?;
        let mut prediction = self.models.predict_weather(&features)?;
        prediction.price = metrics::peak_hour_price(prediction.price, at.hour());

        debug!(
            location = %forecast.location.name,
            slot = %record.timestamp,
            demand = prediction.demand,
            production = prediction.production,
            price = prediction.price,
            "point forecast"
        );

        Ok(PointForecast {
            timestamp: record.timestamp,
            prediction,
            metrics: metrics::derive(&prediction, price_per_unit),
            demand_indexed_price: metrics::demand_indexed_price(prediction.demand),
        })
    }

    /// Demand, production and peak-adjusted price for the first 24 slots
    pub fn hourly_series(&self, forecast: &WeatherForecast) -> ForecastResult<Vec<HourlyPoint>> {
        forecast
            .records
            .iter()
            .take(HOURLY_SLOTS)
            .map(|record| {
                let p = self
                    .models
                    .predict_weather(&self.extractor.weather_features(record)?)?;
                Ok(HourlyPoint {
                    timestamp: record.timestamp,
                    demand: p.demand,
                    production: p.production,
                    price: metrics::peak_hour_price(p.price, record.timestamp.hour()),
                })
            })
            .collect()
    }

    /// Demand and surge-adjusted price for one slot per day
    pub fn daily_series(&self, forecast: &WeatherForecast) -> ForecastResult<Vec<DailyPoint>> {
        forecast
            .records
            .iter()
            .step_by(DAILY_STRIDE)
            .map(|record| {
                let p = self
                    .models
                    .predict_weather(&self.extractor.weather_features(record)?)?;
                Ok(DailyPoint {
                    date: record.timestamp.date_naive(),
                    demand: p.demand,
                    price: metrics::daily_surge_price(p.price, p.demand),
                })
            })
            .collect()
    }

    /// Calendar-model demand and production at the daily slot over the next days
    pub async fn window_forecast(&self, place: &str) -> ForecastResult<WindowForecast> {
        let forecast = self.fetch(place).await?;
        self.window_from(&forecast)
    }

    pub fn window_from(&self, forecast: &WeatherForecast) -> ForecastResult<WindowForecast> {
        let records: Vec<_> = forecast
            .records
            .iter()
            .filter(|r| r.timestamp.hour() == self.window.slot_hour && r.timestamp.minute() == 0)
            .take(self.window.max_slots)
            .cloned()
            .collect();

        if records.is_empty() {
            return Err(ForecastError::Upstream(format!(
                "forecast for '{}' has no {:02}:00 slots",
                forecast.location.name, self.window.slot_hour
            )));
        }

        let rows = self.extractor.extract_all(&records, FeatureSchema::Calendar)?;
        let (demand, production) = self.models.predict_calendar(&rows)?;

        let points = records
            .iter()
            .zip(demand.into_iter().zip(production))
            .map(|(record, (demand, production))| WindowPoint {
                timestamp: record.timestamp,
                demand,
                production,
            })
            .collect();

        Ok(WindowForecast {
            location: forecast.location.name.clone(),
            points,
        })
    }
}

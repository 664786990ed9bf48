//! OpenWeather response payloads

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::WeatherRecord;
use crate::error::{ForecastError, ForecastResult};

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub coord: Option<Coord>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
    pub city: Option<City>,
}

#[derive(Debug, Deserialize)]
pub struct City {
    pub name: Option<String>,
    pub coord: Option<Coord>,
}

/// Error body returned alongside non-2xx statuses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: Option<MainBlock>,
    pub wind: Option<WindBlock>,
    pub clouds: Option<CloudsBlock>,
    pub rain: Option<RainBlock>,
    pub dt_txt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainBlock {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindBlock {
    pub speed: Option<f64>,
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudsBlock {
    pub all: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RainBlock {
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

impl TryFrom<ForecastEntry> for WeatherRecord {
    type Error = ForecastError;

    fn try_from(entry: ForecastEntry) -> ForecastResult<Self> {
        let timestamp = DateTime::<Utc>::from_timestamp(entry.dt, 0).ok_or_else(|| {
            ForecastError::Validation(format!("forecast timestamp {} out of range", entry.dt))
        })?;

        let main = entry.main.ok_or_else(|| ForecastError::missing_field("main"))?;
        let wind = entry.wind.ok_or_else(|| ForecastError::missing_field("wind"))?;
        let clouds = entry.clouds.ok_or_else(|| ForecastError::missing_field("clouds"))?;

        Ok(WeatherRecord {
            timestamp,
            temperature: main.temp.ok_or_else(|| ForecastError::missing_field("main.temp"))?,
            feels_like: main
                .feels_like
                .ok_or_else(|| ForecastError::missing_field("main.feels_like"))?,
            humidity: main
                .humidity
                .ok_or_else(|| ForecastError::missing_field("main.humidity"))?,
            pressure: main
                .pressure
                .ok_or_else(|| ForecastError::missing_field("main.pressure"))?,
            wind_speed: wind.speed.ok_or_else(|| ForecastError::missing_field("wind.speed"))?,
            wind_direction: wind.deg.ok_or_else(|| ForecastError::missing_field("wind.deg"))?,
            cloud_coverage: clouds
                .all
                .ok_or_else(|| ForecastError::missing_field("clouds.all"))?,
            precipitation: entry.rain.and_then(|r| r.three_hours).unwrap_or(0.0),
        })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic location resolved from a place name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One forecast slot as reported by the weather service.
///
/// Units follow the client's configured unit system (metric by default):
/// temperatures in °C, pressure in hPa, wind speed in m/s, wind direction in
/// degrees, cloud coverage and humidity in percent, precipitation in mm over
/// the 3-hour slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub cloud_coverage: f64,
    pub precipitation: f64,
}

/// Forecast for a location, records ordered by timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub location: GeoLocation,
    pub generated_at: DateTime<Utc>,
    pub records: Vec<WeatherRecord>,
}

impl WeatherForecast {
    /// Record whose timestamp is closest to `at`. Ties resolve to the earlier slot.
    pub fn closest_to(&self, at: DateTime<Utc>) -> Option<&WeatherRecord> {
        self.records
            .iter()
            .min_by_key(|r| (r.timestamp - at).num_seconds().abs())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record_at(hour: u32) -> WeatherRecord {
        WeatherRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap(),
            temperature: 10.0,
            feels_like: 8.0,
            humidity: 70.0,
            pressure: 1012.0,
            wind_speed: 4.0,
            wind_direction: 180.0,
            cloud_coverage: 40.0,
            precipitation: 0.0,
        }
    }

    #[test]
    fn test_closest_to_picks_nearest_slot() {
        let forecast = WeatherForecast {
            location: GeoLocation {
                name: "London".to_string(),
                latitude: 51.5,
                longitude: -0.12,
            },
            generated_at: Utc::now(),
            records: vec![record_at(0), record_at(3), record_at(6), record_at(9)],
        };

        let at = Utc.with_ymd_and_hms(2025, 3, 1, 7, 10, 0).unwrap();
        assert_eq!(forecast.closest_to(at).unwrap().timestamp, record_at(6).timestamp);

        let tie = Utc.with_ymd_and_hms(2025, 3, 1, 4, 30, 0).unwrap();
        assert_eq!(forecast.closest_to(tie).unwrap().timestamp, record_at(3).timestamp);
    }

    #[test]
    fn test_closest_to_empty() {
        let forecast = WeatherForecast {
            location: GeoLocation {
                name: "Nowhere".to_string(),
                latitude: 0.0,
                longitude: 0.0,
            },
            generated_at: Utc::now(),
            records: vec![],
        };
        assert!(forecast.is_empty());
        assert!(forecast.closest_to(Utc::now()).is_none());
    }
}

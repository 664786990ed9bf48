//! Feature engineering for the prediction models
//!
//! Turns weather records into the fixed-order rows each model family was
//! trained on. See [`FeatureSchema`] for the column layouts.

use chrono::{Datelike, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::FeaturesConfig;
use crate::domain::WeatherRecord;
use crate::error::{ForecastError, ForecastResult};
use crate::ml::{FeatureSchema, FeatureVector};

/// Meteorological season (northern hemisphere months)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Season {
    Winter = 0,
    Spring = 1,
    Summer = 2,
    Autumn = 3,
}

/// Month (1-12) to season; out-of-range months fall back to winter
pub fn month_to_season(month: u32) -> Season {
    match month {
        3..=5 => Season::Spring,
        6..=8 => Season::Summer,
        9..=11 => Season::Autumn,
        _ => Season::Winter,
    }
}

/// Feature extractor for weather records
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    timezone: Tz,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl FeatureExtractor {
    /// Calendar fields are computed in `timezone`
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn from_config(cfg: &FeaturesConfig) -> ForecastResult<Self> {
        let timezone: Tz = cfg.timezone.parse().map_err(|_| {
            ForecastError::Validation(format!("unknown time zone '{}'", cfg.timezone))
        })?;
        Ok(Self::new(timezone))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    fn weather_values(record: &WeatherRecord) -> [f64; 8] {
        [
            record.temperature,
            record.feels_like,
            record.humidity,
            record.pressure,
            record.wind_speed,
            record.wind_direction,
            record.cloud_coverage,
            record.precipitation,
        ]
    }

    /// 8-field weather row
    pub fn weather_features(&self, record: &WeatherRecord) -> ForecastResult<FeatureVector> {
        FeatureVector::new(FeatureSchema::Weather, Self::weather_values(record).to_vec())
    }

    /// 14-field calendar + weather row
    pub fn calendar_features(&self, record: &WeatherRecord) -> ForecastResult<FeatureVector> {
        let local = record.timestamp.with_timezone(&self.timezone);
        let month = local.month();

        let mut values = Vec::with_capacity(FeatureSchema::Calendar.width());
        values.extend_from_slice(&[
            f64::from(local.hour()),
            f64::from(local.weekday().num_days_from_monday()),
            f64::from(local.day()),
            f64::from(month),
            f64::from(local.year()),
            month_to_season(month) as u8 as f64,
        ]);
        values.extend_from_slice(&Self::weather_values(record));

        FeatureVector::new(FeatureSchema::Calendar, values)
    }

    pub fn extract(&self, record: &WeatherRecord, schema: FeatureSchema) -> ForecastResult<FeatureVector> {
        match schema {
            FeatureSchema::Weather => self.weather_features(record),
            FeatureSchema::Calendar => self.calendar_features(record),
        }
    }

    pub fn extract_all(
        &self,
        records: &[WeatherRecord],
        schema: FeatureSchema,
    ) -> ForecastResult<Vec<FeatureVector>> {
        records.iter().map(|r| self.extract(r, schema)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn record() -> WeatherRecord {
        WeatherRecord {
            // Saturday
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap(),
            temperature: 7.5,
            feels_like: 5.1,
            humidity: 81.0,
            pressure: 1021.0,
            wind_speed: 4.6,
            wind_direction: 230.0,
            cloud_coverage: 90.0,
            precipitation: 0.42,
        }
    }

    #[rstest]
    #[case(12, Season::Winter)]
    #[case(1, Season::Winter)]
    #[case(2, Season::Winter)]
    #[case(3, Season::Spring)]
    #[case(5, Season::Spring)]
    #[case(6, Season::Summer)]
    #[case(8, Season::Summer)]
    #[case(9, Season::Autumn)]
    #[case(11, Season::Autumn)]
    fn test_month_to_season(#[case] month: u32, #[case] expected: Season) {
        assert_eq!(month_to_season(month), expected);
    }

    #[test]
    fn test_weather_features_order() {
        let fv = FeatureExtractor::default().weather_features(&record()).unwrap();
        assert_eq!(fv.schema, FeatureSchema::Weather);
        assert_eq!(fv.values, vec![7.5, 5.1, 81.0, 1021.0, 4.6, 230.0, 90.0, 0.42]);
    }

    #[test]
    fn test_calendar_features_order() {
        let fv = FeatureExtractor::default().calendar_features(&record()).unwrap();
        assert_eq!(fv.schema, FeatureSchema::Calendar);
        assert_eq!(
            fv.values,
            vec![18.0, 5.0, 1.0, 3.0, 2025.0, 1.0, 7.5, 5.1, 81.0, 1021.0, 4.6, 230.0, 90.0, 0.42]
        );
        for (name, value) in fv.feature_names().iter().zip(fv.values.iter()) {
            assert_eq!(fv.get(name), Some(*value));
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = FeatureExtractor::default();
        let a = extractor.extract(&record(), FeatureSchema::Calendar).unwrap();
        let b = extractor.extract(&record(), FeatureSchema::Calendar).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_calendar_uses_configured_timezone() {
        let extractor = FeatureExtractor::from_config(&FeaturesConfig {
            timezone: "Asia/Kolkata".to_string(),
        })
        .unwrap();
        // 18:00 UTC is 23:30 in Kolkata, same day
        let fv = extractor.calendar_features(&record()).unwrap();
        assert_eq!(fv.get("hour"), Some(23.0));
        assert_eq!(fv.get("day"), Some(1.0));

        let mut late = record();
        late.timestamp = Utc.with_ymd_and_hms(2025, 2, 28, 21, 0, 0).unwrap();
        let fv = extractor.calendar_features(&late).unwrap();
        // rolls over into March -> spring
        assert_eq!(fv.get("month"), Some(3.0));
        assert_eq!(fv.get("season"), Some(1.0));
    }

    #[test]
    fn test_extract_all_rows_match_schema_width() {
        let records = vec![record(); 3];
        let extractor = FeatureExtractor::default();
        for schema in [FeatureSchema::Weather, FeatureSchema::Calendar] {
            let rows = extractor.extract_all(&records, schema).unwrap();
            assert_eq!(rows.len(), 3);
            assert!(rows.iter().all(|r| r.schema == schema && r.len() == schema.width()));
        }
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let err = FeatureExtractor::from_config(&FeaturesConfig {
            timezone: "Mars/Olympus".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, ForecastError::Validation(_)));
    }
}

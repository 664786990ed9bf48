use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Model outputs for one time point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub demand: f64,
    pub production: f64,
    pub price: f64,
}

/// Business figures derived from one prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// production - demand, may be negative
    pub surplus: f64,
    pub revenue: f64,
    pub wastage: f64,
    pub suggested_price: f64,
}

/// Single-timestamp forecast produced by the weather-schema models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointForecast {
    pub timestamp: DateTime<Utc>,
    pub prediction: Prediction,
    pub metrics: DerivedMetrics,
    /// demand / 300
    pub demand_indexed_price: f64,
}

/// One point of the hourly chart series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub timestamp: DateTime<Utc>,
    pub demand: f64,
    pub production: f64,
    /// Model price with the peak-hour surcharge applied
    pub price: f64,
}

/// One point of the daily chart series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: chrono::NaiveDate,
    pub demand: f64,
    /// Model price with the demand surge applied
    pub price: f64,
}

/// Demand and production for one slot of the multi-day window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowPoint {
    pub timestamp: DateTime<Utc>,
    pub demand: f64,
    pub production: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowForecast {
    pub location: String,
    pub points: Vec<WindowPoint>,
}

impl WindowForecast {
    pub fn production(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.production).collect()
    }

    pub fn demand(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.demand).collect()
    }

    pub fn total_production(&self) -> f64 {
        self.points.iter().map(|p| p.production).sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.points.iter().map(|p| p.demand).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub total_revenue: f64,
    pub price_per_unit: f64,
    pub predicted_production: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WastageSummary {
    pub total_energy_produced: f64,
    pub total_energy_demand: f64,
    pub total_wastage: f64,
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedSummary {
    pub total_revenue: f64,
    pub total_energy_produced: f64,
    pub total_energy_demand: f64,
    pub total_wastage: f64,
    pub suggested_price: f64,
}

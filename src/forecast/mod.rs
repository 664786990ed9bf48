pub mod engine;
pub mod features;
pub mod metrics;

pub use engine::{ForecastEngine, WindowSelection, DAILY_STRIDE, HOURLY_SLOTS};
pub use features::{month_to_season, FeatureExtractor, Season};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::forecast::{FeatureExtractor, ForecastEngine, WindowSelection};
use crate::ml::ModelSet;
use crate::render::ChartRenderer;
use crate::weather::{OpenWeatherClient, WeatherProvider};

/// Seller's base price per unit, adjustable at runtime.
///
/// Handlers take a snapshot with [`PricingState::current`] at the start of a
/// request and pass that value down explicitly.
#[derive(Debug)]
pub struct PricingState {
    base_price_per_unit: RwLock<f64>,
}

impl PricingState {
    pub fn new(base_price_per_unit: f64) -> Self {
        Self {
            base_price_per_unit: RwLock::new(base_price_per_unit),
        }
    }

    pub fn current(&self) -> f64 {
        *self.base_price_per_unit.read()
    }

    /// Replace the base price, returning the previous one
    pub fn update(&self, price: f64) -> f64 {
        std::mem::replace(&mut *self.base_price_per_unit.write(), price)
    }

    /// Request override if given, otherwise the current base price
    pub fn resolve(&self, requested: Option<f64>) -> f64 {
        requested.unwrap_or_else(|| self.current())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub engine: Arc<ForecastEngine>,
    pub pricing: Arc<PricingState>,
    /// `None` when chart rendering is disabled
    pub charts: Option<ChartRenderer>,
}

impl AppState {
    /// Build the weather client and load every model artifact
    pub fn new(cfg: Config) -> Result<Self> {
        let weather: Arc<dyn WeatherProvider> =
            Arc::new(OpenWeatherClient::new(&cfg.weather).context("building weather client")?);
        let models = ModelSet::load(&cfg.models).context("loading model artifacts")?;
        let extractor = FeatureExtractor::from_config(&cfg.features)?;
        info!(timezone = %extractor.timezone(), "models loaded");

        let engine = ForecastEngine::new(
            weather,
            models,
            extractor,
            WindowSelection::from(&cfg.weather),
        );
        Ok(Self::from_parts(cfg, engine))
    }

    pub fn from_parts(cfg: Config, engine: ForecastEngine) -> Self {
        let charts = cfg
            .charts
            .enabled
            .then(|| ChartRenderer::new(cfg.charts.static_dir.clone()));
        Self {
            pricing: Arc::new(PricingState::new(cfg.pricing.base_price_per_unit)),
            engine: Arc::new(engine),
            charts,
            cfg: Arc::new(cfg),
        }
    }
}

use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ml::ModelFormat;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub weather: WeatherConfig,
    pub features: FeaturesConfig,
    pub models: ModelsConfig,
    pub pricing: PricingConfig,
    pub charts: ChartsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub enable_cors: bool,
}
impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub base_url: String,
    pub api_key: String,
    pub units: String,
    pub http_timeout_seconds: u64,
    pub cache_ttl_seconds: u64,
    /// Hour (UTC) of the forecast slot used for the multi-day window
    pub daily_slot_hour: u32,
    pub daily_slots: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeaturesConfig {
    /// IANA zone used for calendar features
    pub timezone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifactConfig {
    pub path: PathBuf,
    pub format: ModelFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherModelsConfig {
    pub demand: ModelArtifactConfig,
    pub production: ModelArtifactConfig,
    pub price: ModelArtifactConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarModelsConfig {
    pub demand: ModelArtifactConfig,
    pub production: ModelArtifactConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    pub weather: WeatherModelsConfig,
    pub calendar: CalendarModelsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig { pub base_price_per_unit: f64 }

#[derive(Debug, Clone, Deserialize)]
pub struct ChartsConfig {
    pub enabled: bool,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,hyper=warn,reqwest=warn,tower_http=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("EF__").split("__"));
        Ok(figment.extract()?)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(Figment::from(Toml::string(raw)).extract()?)
    }
}

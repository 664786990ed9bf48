pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod ml;
pub mod render;
pub mod telemetry;
pub mod weather;

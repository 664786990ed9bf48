//! SVG line charts for the hourly and daily forecasts.

use plotters::prelude::*;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::{DailyPoint, HourlyPoint};
use crate::error::{ForecastError, ForecastResult};

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 500;
/// URL prefix the static directory is served under
pub const STATIC_PREFIX: &str = "/static";

struct Series {
    label: &'static str,
    color: RGBColor,
    values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct ChartRenderer {
    static_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(static_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
        }
    }

    /// Demand, production and price over the hourly slots. Returns the chart URL.
    pub fn render_hourly(&self, location: &str, points: &[HourlyPoint]) -> ForecastResult<String> {
        let labels = points
            .iter()
            .map(|p| p.timestamp.format("%m-%d %H:%M").to_string())
            .collect::<Vec<_>>();
        let series = [
            Series {
                label: "Energy Demand (kWh)",
                color: RED,
                values: points.iter().map(|p| p.demand).collect(),
            },
            Series {
                label: "Energy Production (kWh)",
                color: GREEN,
                values: points.iter().map(|p| p.production).collect(),
            },
            Series {
                label: "Price (per kWh)",
                color: BLUE,
                values: points.iter().map(|p| p.price).collect(),
            },
        ];
        self.render(
            &format!("hourly_forecast_{}.svg", slug(location)),
            &format!("Hourly Energy Forecast - {location}"),
            "Time",
            &labels,
            &series,
        )
    }

    /// Demand and surged price, one point per day. Returns the chart URL.
    pub fn render_daily(&self, location: &str, points: &[DailyPoint]) -> ForecastResult<String> {
        let labels = points
            .iter()
            .map(|p| p.date.format("%Y-%m-%d").to_string())
            .collect::<Vec<_>>();
        let series = [
            Series {
                label: "Daily Energy Demand (kWh)",
                color: RED,
                values: points.iter().map(|p| p.demand).collect(),
            },
            Series {
                label: "Daily Price (per kWh)",
                color: BLUE,
                values: points.iter().map(|p| p.price).collect(),
            },
        ];
        self.render(
            &format!("daily_forecast_{}.svg", slug(location)),
            &format!("Daily Energy Forecast - {location}"),
            "Date",
            &labels,
            &series,
        )
    }

    fn render(
        &self,
        file_name: &str,
        title: &str,
        x_desc: &str,
        labels: &[String],
        series: &[Series],
    ) -> ForecastResult<String> {
        if labels.is_empty() {
            return Err(ForecastError::Render(format!("no data points for {file_name}")));
        }
        std::fs::create_dir_all(&self.static_dir)?;
        let path = self.static_dir.join(file_name);

        // draw into a scratch file and rename it over the target, so concurrent
        // renders of one location never serve a half-written chart
        let scratch = tempfile::Builder::new()
            .prefix(".chart-")
            .suffix(".tmp")
            .tempfile_in(&self.static_dir)?;
        draw_line_chart(scratch.path(), title, x_desc, labels, series)
            .map_err(|e| ForecastError::Render(e.to_string()))?;
        scratch.persist(&path).map_err(|e| ForecastError::Io(e.error))?;

        debug!(path = %path.display(), "rendered chart");
        Ok(format!("{STATIC_PREFIX}/{file_name}"))
    }
}

/// Filesystem-safe form of a location name.
///
/// The ASCII part keeps file names readable; the digest suffix keeps names
/// that reduce to the same ASCII text (or to none) apart.
pub fn slug(location: &str) -> String {
    let name = location.trim();
    let mut out = String::with_capacity(name.len() + 9);
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    let base = out.trim_end_matches('_');
    let base = if base.is_empty() { "location" } else { base };

    let digest = Sha256::digest(name.as_bytes());
    let tag: String = digest[..4].iter().map(|b| format!("{b:02x}")).collect();
    format!("{base}_{tag}")
}

fn value_range(series: &[Series]) -> (f64, f64) {
    let values = series.iter().flat_map(|s| s.values.iter().copied());
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.1).max(1.0);
    (min.min(0.0) - if min < 0.0 { pad } else { 0.0 }, max + pad)
}

fn draw_line_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    labels: &[String],
    series: &[Series],
) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let (y_min, y_max) = value_range(series);
    let x_max = (labels.len() as i32 - 1).max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Energy/Price")
        .x_labels(labels.len().min(12))
        .x_label_formatter(&|i| {
            usize::try_from(*i)
                .ok()
                .and_then(|i| labels.get(i))
                .cloned()
                .unwrap_or_default()
        })
        .draw()?;

    for s in series {
        let color = s.color;
        chart
            .draw_series(LineSeries::new(
                s.values.iter().enumerate().map(|(i, v)| (i as i32, *v)),
                color.stroke_width(2),
            ))?
            .label(s.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

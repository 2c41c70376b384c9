//! Chart rendering.
//!
//! Renderers are pure functions from derived series to PNG bytes so the
//! HTTP layer and the tests can swap in a stub.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use std::fmt::Debug;
use tracing::error;

use crate::{
    error::{NoData, RenderError},
    series::{ConditionDistribution, DerivedCharts, TimeSeries},
};

pub mod bitmap;

pub use bitmap::BitmapRenderer;

/// The three time-series charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Temperature,
    Humidity,
    Pressure,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Temperature => "temperature",
            ChartKind::Humidity => "humidity",
            ChartKind::Pressure => "pressure",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Temperature => "5-Day Temperature Forecast",
            ChartKind::Humidity => "5-Day Humidity Forecast",
            ChartKind::Pressure => "5-Day Atmospheric Pressure Forecast",
        }
    }

    pub fn y_label(&self) -> &'static str {
        match self {
            ChartKind::Temperature => "Temperature (°C)",
            ChartKind::Humidity => "Humidity (%)",
            ChartKind::Pressure => "Pressure (hPa)",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded image bytes (PNG for the bitmap renderer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob(Vec<u8>);

impl ImageBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

pub trait ChartRenderer: Send + Sync + Debug {
    fn render_series(&self, kind: ChartKind, series: &TimeSeries) -> Result<ImageBlob, RenderError>;

    fn render_distribution(
        &self,
        distribution: &ConditionDistribution,
    ) -> Result<ImageBlob, RenderError>;
}

/// Base64 images keyed the way the dashboard expects them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartImages {
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub weather_distribution: Option<String>,
    pub pressure: Option<String>,
}

impl ChartImages {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.humidity.is_none()
            && self.weather_distribution.is_none()
            && self.pressure.is_none()
    }
}

/// Render every chart; `NoData` yields all `None`.
///
/// A chart that fails to render is logged and left out; the others are kept.
pub fn render_charts(
    renderer: &dyn ChartRenderer,
    derived: Result<DerivedCharts, NoData>,
) -> ChartImages {
    let Ok(charts) = derived else {
        return ChartImages::default();
    };

    let series = |kind: ChartKind, data: &TimeSeries| {
        encode(kind.as_str(), renderer.render_series(kind, data))
    };

    ChartImages {
        temperature: series(ChartKind::Temperature, &charts.temperature),
        humidity: series(ChartKind::Humidity, &charts.humidity),
        weather_distribution: encode(
            "weather_distribution",
            renderer.render_distribution(&charts.distribution),
        ),
        pressure: series(ChartKind::Pressure, &charts.pressure),
    }
}

fn encode(chart: &str, rendered: Result<ImageBlob, RenderError>) -> Option<String> {
    match rendered {
        Ok(blob) => Some(blob.to_base64()),
        Err(e) => {
            error!(chart, error = %e, "Chart rendering failed");
            None
        }
    }
}

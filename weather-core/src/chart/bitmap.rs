//! PNG charts drawn with plotters.
//!
//! Text goes through plotters' ab_glyph backend, which needs one TrueType
//! font registered under "sans-serif" before anything with labels is drawn.

use chrono::{DateTime, Duration, Utc};
use plotters::{
    coord::{Shift, types::RangedDateTime},
    prelude::*,
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tracing::{info, warn};

use super::{ChartKind, ChartRenderer, ImageBlob};
use crate::{
    error::RenderError,
    series::{ConditionDistribution, TimeSeries},
};

/// 12x6 inches at 100 dpi.
pub const SERIES_SIZE: (u32, u32) = (1200, 600);
/// 10x6 inches at 100 dpi.
pub const DISTRIBUTION_SIZE: (u32, u32) = (1000, 600);

const FONT_FAMILY: &str = "sans-serif";

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const LINE_BLUE: RGBColor = RGBColor(31, 119, 180);
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const PRESSURE_GREEN: RGBColor = RGBColor(0, 128, 0);

/// Sampling interval assumed when a series has a single point.
const DEFAULT_INTERVAL_MINUTES: i64 = 180;

static REGISTERED_FONT: OnceLock<Option<PathBuf>> = OnceLock::new();

#[derive(Debug, Clone, Default)]
pub struct BitmapRenderer {
    font: Option<PathBuf>,
}

impl BitmapRenderer {
    /// Use `font_path` when given, otherwise the first well-known system font.
    ///
    /// Only the first renderer in a process registers a font; later ones
    /// reuse it.
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = REGISTERED_FONT
            .get_or_init(|| register_font(font_path))
            .clone();

        Self { font }
    }

    /// Path of the font used for chart text, if one was found.
    pub fn font(&self) -> Option<&Path> {
        self.font.as_deref()
    }
}

fn register_font(configured: Option<&Path>) -> Option<PathBuf> {
    let candidates = configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

    for path in candidates {
        let Ok(bytes) = fs::read(&path) else {
            continue;
        };

        // ab_glyph keeps a 'static reference; this happens once per process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                info!(font = %path.display(), "Registered chart font");
                return Some(path);
            }
            Err(_) => warn!(font = %path.display(), "Unusable chart font, trying next"),
        }
    }

    warn!("No usable TrueType font found; charts with text will fail to render");
    None
}

impl ChartRenderer for BitmapRenderer {
    fn render_series(&self, kind: ChartKind, series: &TimeSeries) -> Result<ImageBlob, RenderError> {
        if series.is_empty() {
            return Err(RenderError::Draw(format!("{kind} series has no points")));
        }

        let file = png_file()?;
        {
            let root = BitMapBackend::new(file.path(), SERIES_SIZE).into_drawing_area();
            draw_time_series(&root, kind, series)?;
            root.present().map_err(RenderError::draw)?;
        }
        read_png(file)
    }

    fn render_distribution(
        &self,
        distribution: &ConditionDistribution,
    ) -> Result<ImageBlob, RenderError> {
        if distribution.slices.is_empty() {
            return Err(RenderError::Draw("distribution has no categories".to_string()));
        }

        let file = png_file()?;
        {
            let root = BitMapBackend::new(file.path(), DISTRIBUTION_SIZE).into_drawing_area();
            draw_distribution(&root, distribution)?;
            root.present().map_err(RenderError::draw)?;
        }
        read_png(file)
    }
}

fn png_file() -> Result<tempfile::NamedTempFile, RenderError> {
    // The bitmap encoder picks the format from the extension.
    Ok(tempfile::Builder::new()
        .prefix("weather-chart-")
        .suffix(".png")
        .tempfile()?)
}

fn read_png(file: tempfile::NamedTempFile) -> Result<ImageBlob, RenderError> {
    Ok(ImageBlob::new(fs::read(file.path())?))
}

fn draw_time_series<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    kind: ChartKind,
    series: &TimeSeries,
) -> Result<(), RenderError> {
    let x_format = |t: &DateTime<Utc>| t.format("%m-%d %H:%M").to_string();
    let y_format = |v: &f64| format!("{v:.0}");

    root.fill(&WHITE).map_err(RenderError::draw)?;

    let interval = sampling_interval(series);
    let (x_start, x_end) = time_bounds(series, interval);
    let (y_min, y_max) = value_bounds(kind, series);

    let mut chart = ChartBuilder::on(root)
        .caption(kind.title(), (FONT_FAMILY, 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(RangedDateTime::from(x_start..x_end), y_min..y_max)
        .map_err(RenderError::draw)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc("Date & Time")
        .y_desc(kind.y_label())
        .x_labels(10)
        .x_label_formatter(&x_format)
        .y_label_formatter(&y_format)
        .axis_desc_style((FONT_FAMILY, 16))
        .bold_line_style(BLACK.mix(0.3))
        .light_line_style(BLACK.mix(0.05));
    if kind == ChartKind::Humidity {
        mesh.disable_x_mesh();
    }
    mesh.draw().map_err(RenderError::draw)?;

    let points: Vec<(DateTime<Utc>, f64)> =
        series.points.iter().map(|p| (p.time, p.value)).collect();

    match kind {
        ChartKind::Temperature => {
            chart
                .draw_series(LineSeries::new(points.iter().copied(), LINE_BLUE.stroke_width(2)))
                .map_err(RenderError::draw)?;
            chart
                .draw_series(points.iter().map(|&p| Circle::new(p, 4, LINE_BLUE.filled())))
                .map_err(RenderError::draw)?;
        }
        ChartKind::Humidity => {
            let half_width = bar_width(interval) / 2;
            chart
                .draw_series(points.iter().map(|&(t, v)| {
                    Rectangle::new(
                        [(t - half_width, 0.0), (t + half_width, v)],
                        SKY_BLUE.mix(0.7).filled(),
                    )
                }))
                .map_err(RenderError::draw)?;
        }
        ChartKind::Pressure => {
            chart
                .draw_series(
                    AreaSeries::new(points.iter().copied(), y_min, PRESSURE_GREEN.mix(0.3))
                        .border_style(PRESSURE_GREEN.mix(0.7).stroke_width(2)),
                )
                .map_err(RenderError::draw)?;
            chart
                .draw_series(points.iter().map(|&p| {
                    EmptyElement::at(p)
                        + Rectangle::new([(-4, -4), (4, 4)], PRESSURE_GREEN.mix(0.7).filled())
                }))
                .map_err(RenderError::draw)?;
        }
    }

    Ok(())
}

fn draw_distribution<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    distribution: &ConditionDistribution,
) -> Result<(), RenderError> {
    root.fill(&WHITE).map_err(RenderError::draw)?;

    let area = root
        .titled(
            "Weather Condition Distribution (5-Day Forecast)",
            (FONT_FAMILY, 28).into_font(),
        )
        .map_err(RenderError::draw)?;

    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.38;

    let sizes: Vec<f64> = distribution.slices.iter().map(|s| s.count as f64).collect();
    let colors = palette(distribution.slices.len());
    let labels: Vec<&str> = distribution
        .slices
        .iter()
        .map(|s| s.condition.as_str())
        .collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    // Screen angles run clockwise from 3 o'clock.
    pie.start_angle(-90.0);
    pie.label_style((FONT_FAMILY, 18).into_font().color(&BLACK));
    pie.percentages((FONT_FAMILY, 16).into_font().color(&BLACK));

    area.draw(&pie).map_err(RenderError::draw)?;
    Ok(())
}

/// Evenly spaced hues, one per wedge.
fn palette(n: usize) -> Vec<RGBColor> {
    (0..n)
        .map(|i| {
            let (r, g, b) = HSLColor(i as f64 / n.max(1) as f64, 0.65, 0.55).rgb();
            RGBColor(r, g, b)
        })
        .collect()
}

/// Smallest positive gap between consecutive points.
fn sampling_interval(series: &TimeSeries) -> Duration {
    series
        .points
        .windows(2)
        .map(|w| (w[1].time - w[0].time).abs())
        .filter(|d| *d > Duration::zero())
        .min()
        .unwrap_or_else(|| Duration::minutes(DEFAULT_INTERVAL_MINUTES))
}

fn bar_width(interval: Duration) -> Duration {
    interval / 4
}

fn time_bounds(series: &TimeSeries, interval: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
    let pad = interval / 2;
    let first = series.points.iter().map(|p| p.time).min().unwrap_or_else(Utc::now);
    let last = series.points.iter().map(|p| p.time).max().unwrap_or(first);
    (first - pad, last + pad)
}

fn value_bounds(kind: ChartKind, series: &TimeSeries) -> (f64, f64) {
    let values = series.points.iter().map(|p| p.value);
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);

    match kind {
        ChartKind::Humidity => (0.0, max.max(100.0) + 5.0),
        _ => {
            let pad = ((max - min) * 0.1).max(1.0);
            (min - pad, max + pad)
        }
    }
}

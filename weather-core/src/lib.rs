//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the `WeatherProvider` abstraction
//! - Chart series extraction and PNG rendering
//! - The bounded in-memory lookup history
//!
//! It is used by `weather-server`, but can also be reused by other binaries or services.

pub mod chart;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod provider;
pub mod series;
pub mod service;

pub use chart::{BitmapRenderer, ChartImages, ChartKind, ChartRenderer, ImageBlob, render_charts};
pub use config::{ChartConfig, Config, OpenWeatherConfig, ServerConfig};
pub use error::{ChartsError, FetchError, NoData, RenderError};
pub use history::{HISTORY_CAPACITY, HistoryLog, QUERY_LIMIT};
pub use model::{CurrentConditions, Forecast, ForecastSeries, HistoryEntry, Observation};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use series::{ConditionDistribution, DerivedCharts, TimeSeries, extract_series};
pub use service::WeatherService;

use crate::{
    CurrentConditions, FetchError, Forecast, config::OpenWeatherConfig,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current conditions and forecasts for a named city.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(&self, city: &str) -> Result<CurrentConditions, FetchError>;

    async fn fetch_forecast(&self, city: &str) -> Result<Forecast, FetchError>;
}

/// Construct the OpenWeather provider from config.
///
/// A missing API key does not fail here; every call reports it instead.
pub fn provider_from_config(
    config: &OpenWeatherConfig,
) -> Result<Box<dyn WeatherProvider>, FetchError> {
    if config.api_key.is_none() {
        tracing::warn!("No OpenWeather API key configured; weather lookups will fail");
    }

    Ok(Box::new(OpenWeatherProvider::new(config)?))
}

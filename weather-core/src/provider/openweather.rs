use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{
    config::OpenWeatherConfig,
    error::FetchError,
    model::{CurrentConditions, Forecast, ForecastSeries, Observation},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(config: &OpenWeatherConfig) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to initialize HTTP client: {e}")))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    fn api_key(&self) -> Result<&str, FetchError> {
        self.api_key.as_deref().ok_or_else(FetchError::missing_api_key)
    }

    /// One metric-unit GET against `{base_url}/{endpoint}`, returning the
    /// decoded document once transport and provider-level errors are ruled out.
    #[instrument(skip(self))]
    async fn get_json(&self, endpoint: &str, city: &str) -> Result<Value, FetchError> {
        let api_key = self.api_key()?;
        let url = format!("{}/{}", self.base_url, endpoint);

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| self.network_error(&e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| self.network_error(&e))?;
        debug!(%status, bytes = body.len(), "OpenWeather responded");

        if !status.is_success() {
            let message = provider_message(&body).unwrap_or_else(|| fallback_message(status, &body));
            warn!(%status, %message, "OpenWeather rejected request");
            return Err(FetchError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let document: Value = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON: {e}")))?;

        check_embedded_code(&document)?;

        Ok(document)
    }

    fn network_error(&self, err: &reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Network(format!(
                "Request to weather provider timed out after {}s",
                self.timeout.as_secs()
            ))
        } else if err.is_connect() {
            FetchError::Network(format!("Could not connect to weather provider: {err}"))
        } else {
            FetchError::Network(format!("Request to weather provider failed: {err}"))
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, city: &str) -> Result<CurrentConditions, FetchError> {
        let document = self.get_json("weather", city).await?;
        parse_current(document)
    }

    async fn fetch_forecast(&self, city: &str) -> Result<Forecast, FetchError> {
        let document = self.get_json("forecast", city).await?;
        let series = parse_forecast(&document)?;
        Ok(Forecast {
            series,
            raw: document,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    clouds: OwClouds,
    sys: OwSys,
    /// Metres.
    #[serde(default)]
    visibility: f64,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    city: Option<OwCity>,
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

fn parse_current(document: Value) -> Result<CurrentConditions, FetchError> {
    let parsed: OwCurrentResponse =
        serde_json::from_value(document).map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    let weather = parsed
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::missing_field("weather[0]"))?;

    Ok(CurrentConditions {
        city: parsed.name,
        country: parsed.sys.country,
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        pressure_hpa: parsed.main.pressure,
        description: weather.description,
        icon: weather.icon,
        condition: weather.main,
        wind_speed_mps: parsed.wind.speed,
        wind_degree: parsed.wind.deg,
        visibility_km: parsed.visibility / 1000.0,
        clouds_pct: parsed.clouds.all,
        sunrise: unix_to_utc(parsed.sys.sunrise, "sys.sunrise")?,
        sunset: unix_to_utc(parsed.sys.sunset, "sys.sunset")?,
        utc_offset_secs: parsed.timezone,
    })
}

fn parse_forecast(document: &Value) -> Result<ForecastSeries, FetchError> {
    let parsed = OwForecastResponse::deserialize(document)
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    let observations = parsed
        .list
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let condition = entry
                .weather
                .into_iter()
                .next()
                .ok_or_else(|| FetchError::missing_field(format!("list[{i}].weather[0]")))?
                .main;

            Ok(Observation {
                time: unix_to_utc(entry.dt, &format!("list[{i}].dt"))?,
                temperature_c: entry.main.temp,
                humidity_pct: entry.main.humidity,
                pressure_hpa: entry.main.pressure,
                condition,
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    let (city, country) = match parsed.city {
        Some(city) => (Some(city.name), city.country),
        None => (None, None),
    };

    Ok(ForecastSeries {
        city,
        country,
        observations,
    })
}

/// OpenWeather embeds its own status in `cod`: a number for current weather,
/// a string for forecasts.
fn check_embedded_code(document: &Value) -> Result<(), FetchError> {
    let code = match document.get("cod") {
        None => return Ok(()),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    if code == Some(200) {
        return Ok(());
    }

    let message = document
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("Unknown error")
        .to_string();

    Err(FetchError::Provider {
        status: code
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(StatusCode::BAD_GATEWAY.as_u16()),
        message,
    })
}

fn provider_message(body: &str) -> Option<String> {
    let document: Value = serde_json::from_str(body).ok()?;
    document
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request to weather provider failed")
            .to_string()
    } else {
        truncate_body(body)
    }
}

fn unix_to_utc(ts: i64, field: &str) -> Result<DateTime<Utc>, FetchError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| FetchError::MalformedResponse(format!("invalid timestamp {ts} in {field}")))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

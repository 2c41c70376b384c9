//! Request handlers for the dashboard and its JSON API.

use axum::{
    Json,
    extract::{Query, State},
    response::Html,
};
use serde::{Deserialize, Serialize};
use weather_core::{ChartImages, CurrentConditions, HistoryEntry};

use crate::{error::ApiError, state::AppState};

/// City used when the request does not name one.
pub const DEFAULT_CITY: &str = "London";

const DASHBOARD_HTML: &str = include_str!("../assets/index.html");

#[derive(Debug, Default, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

impl CityQuery {
    /// The requested city, `London` when absent; blank names are rejected.
    fn city(&self) -> Result<&str, ApiError> {
        match self.city.as_deref().map(str::trim) {
            None => Ok(DEFAULT_CITY),
            Some("") => Err(ApiError::BadRequest("City name must not be empty".to_string())),
            Some(city) => Ok(city),
        }
    }

    /// Optional filter: blank means no filter.
    fn filter(&self) -> Option<&str> {
        self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// Current weather as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherResponse {
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: f64,
    pub description: String,
    pub icon: String,
    pub wind_speed: f64,
    pub wind_degree: f64,
    /// Kilometres.
    pub visibility: f64,
    pub clouds: u8,
    /// `HH:MM:SS`, city local time.
    pub sunrise: String,
    pub sunset: String,
}

impl From<CurrentConditions> for CurrentWeatherResponse {
    fn from(c: CurrentConditions) -> Self {
        let sunrise = c.local_sunrise().format("%H:%M:%S").to_string();
        let sunset = c.local_sunset().format("%H:%M:%S").to_string();

        Self {
            city: c.city,
            country: c.country,
            temperature: c.temperature_c,
            feels_like: c.feels_like_c,
            humidity: c.humidity_pct,
            pressure: c.pressure_hpa,
            description: c.description,
            icon: c.icon,
            wind_speed: c.wind_speed_mps,
            wind_degree: c.wind_degree,
            visibility: c.visibility_km,
            clouds: c.clouds_pct,
            sunrise,
            sunset,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Dashboard page.
pub async fn index() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

/// Liveness check - is the server running?
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/weather?city=` - current conditions; the lookup is recorded.
pub async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<CurrentWeatherResponse>, ApiError> {
    let city = query.city()?;
    let conditions = state.service.current(city).await?;
    Ok(Json(conditions.into()))
}

/// `GET /api/forecast?city=` - provider forecast document, unchanged.
pub async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let city = query.city()?;
    let forecast = state.service.forecast(city).await?;
    Ok(Json(forecast.raw))
}

/// `GET /api/charts?city=` - four base64 PNGs, `null` where nothing was drawn.
pub async fn get_charts(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<ChartImages>, ApiError> {
    let city = query.city()?;
    let charts = state.service.charts(city).await?;
    Ok(Json(charts))
}

/// `GET /api/history?city=` - up to 20 most recent lookups, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Json<Vec<HistoryEntry>> {
    Json(state.service.history(query.filter()))
}

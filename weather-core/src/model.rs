use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions for one city, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city: String,
    pub country: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    pub description: String,
    pub icon: String,
    /// Coarse category such as "Clear" or "Rain".
    pub condition: String,
    pub wind_speed_mps: f64,
    pub wind_degree: f64,
    pub visibility_km: f64,
    pub clouds_pct: u8,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    /// Shift from UTC in seconds for the city.
    pub utc_offset_secs: i32,
}

impl CurrentConditions {
    /// Sunrise as wall-clock time in the city.
    pub fn local_sunrise(&self) -> DateTime<FixedOffset> {
        self.sunrise.with_timezone(&self.offset())
    }

    /// Sunset as wall-clock time in the city.
    pub fn local_sunset(&self) -> DateTime<FixedOffset> {
        self.sunset.with_timezone(&self.offset())
    }

    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or(Utc.fix())
    }
}

/// One timestamped reading within a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    /// Primary condition category (first entry of the provider's list).
    pub condition: String,
}

/// Ordered forecast readings, kept in the order the provider delivered them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub city: Option<String>,
    pub country: Option<String>,
    pub observations: Vec<Observation>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Parsed forecast together with the document it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub series: ForecastSeries,
    pub raw: serde_json::Value,
}

/// One past current-weather lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// City exactly as the caller asked for it.
    pub city: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: u8,
    pub pressure: f64,
    pub description: String,
    pub wind_speed: f64,
}

impl HistoryEntry {
    pub fn from_lookup(
        requested_city: &str,
        conditions: &CurrentConditions,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            city: requested_city.to_string(),
            timestamp,
            temperature: conditions.temperature_c,
            humidity: conditions.humidity_pct,
            pressure: conditions.pressure_hpa,
            description: conditions.description.clone(),
            wind_speed: conditions.wind_speed_mps,
        }
    }
}

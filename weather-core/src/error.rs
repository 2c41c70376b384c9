use thiserror::Error;

/// Failure of a single upstream weather lookup.
///
/// Every provider call resolves to either a value or one of these variants;
/// nothing is retried and nothing panics past the provider boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Credentials or other settings are missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request never produced a response (timeout, DNS, connection reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered but rejected the request.
    #[error("Weather provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// The provider answered with a document we could not interpret.
    #[error("Unexpected data format from provider: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn missing_api_key() -> Self {
        FetchError::Config(
            "OpenWeather API key is not set.\n\
             Hint: set OPENWEATHER_API_KEY or run `weather-dashboard configure`."
                .to_string(),
        )
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        FetchError::MalformedResponse(format!("missing key {}", field.into()))
    }
}

/// A forecast without observation records; charts short-circuit on it.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Forecast contains no observations")]
pub struct NoData;

/// Failure of a whole chart request.
#[derive(Debug, Error)]
pub enum ChartsError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The rendering task panicked or was cancelled.
    #[error("Chart rendering stopped unexpectedly: {0}")]
    RenderTask(String),
}

/// Failure while drawing or encoding a single chart.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),

    #[error("Failed to write chart image: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn draw(err: impl std::fmt::Display) -> Self {
        RenderError::Draw(err.to_string())
    }
}

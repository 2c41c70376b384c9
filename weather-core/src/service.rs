use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::{
    chart::{ChartImages, ChartRenderer, render_charts},
    error::{ChartsError, FetchError},
    history::HistoryLog,
    model::{CurrentConditions, Forecast, HistoryEntry},
    provider::WeatherProvider,
    series::extract_series,
};

/// Everything the dashboard routes need, shared process-wide.
#[derive(Debug)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    renderer: Arc<dyn ChartRenderer>,
    history: HistoryLog,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>, renderer: Arc<dyn ChartRenderer>) -> Self {
        Self {
            provider,
            renderer,
            history: HistoryLog::new(),
        }
    }

    /// Current conditions; a successful lookup is recorded in the history.
    #[instrument(skip(self))]
    pub async fn current(&self, city: &str) -> Result<CurrentConditions, FetchError> {
        let conditions = self.provider.fetch_current(city).await.inspect_err(|e| {
            warn!(error = %e, "Current weather lookup failed");
        })?;

        self.history
            .append(HistoryEntry::from_lookup(city, &conditions, Utc::now()));
        info!(
            resolved = %conditions.city,
            temperature = conditions.temperature_c,
            history_len = self.history.len(),
            "Recorded weather lookup"
        );

        Ok(conditions)
    }

    #[instrument(skip(self))]
    pub async fn forecast(&self, city: &str) -> Result<Forecast, FetchError> {
        self.provider.fetch_forecast(city).await.inspect_err(|e| {
            warn!(error = %e, "Forecast lookup failed");
        })
    }

    /// Fetch the forecast and render all four charts.
    ///
    /// Drawing is CPU-bound, so it runs on the blocking pool. A crashed
    /// rendering task is an error, never an empty set of charts.
    #[instrument(skip(self))]
    pub async fn charts(&self, city: &str) -> Result<ChartImages, ChartsError> {
        let forecast = self.forecast(city).await?;
        let renderer = Arc::clone(&self.renderer);

        let images = tokio::task::spawn_blocking(move || {
            render_charts(renderer.as_ref(), extract_series(&forecast.series))
        })
        .await;

        images.map_err(|e| {
            error!(error = %e, "Chart rendering task did not complete");
            ChartsError::RenderTask(e.to_string())
        })
    }

    pub fn history(&self, city: Option<&str>) -> Vec<HistoryEntry> {
        self.history.query(city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chart::{ChartKind, ImageBlob},
        error::RenderError,
        model::{ForecastSeries, Observation},
        series::{ConditionDistribution, TimeSeries},
    };
    use async_trait::async_trait;
    use chrono::DateTime;

    #[derive(Debug)]
    struct FixedProvider {
        observations: usize,
        fail: bool,
    }

    fn conditions(temp: f64) -> CurrentConditions {
        let t = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        CurrentConditions {
            city: "London".to_string(),
            country: "GB".to_string(),
            temperature_c: temp,
            feels_like_c: temp,
            humidity_pct: 60,
            pressure_hpa: 1012.0,
            description: "clear sky".to_string(),
            icon: "01d".to_string(),
            condition: "Clear".to_string(),
            wind_speed_mps: 3.0,
            wind_degree: 90.0,
            visibility_km: 10.0,
            clouds_pct: 0,
            sunrise: t,
            sunset: t,
            utc_offset_secs: 0,
        }
    }

    #[async_trait]
    impl WeatherProvider for FixedProvider {
        async fn fetch_current(&self, _city: &str) -> Result<CurrentConditions, FetchError> {
            if self.fail {
                return Err(FetchError::Network("timed out".to_string()));
            }
            Ok(conditions(15.0))
        }

        async fn fetch_forecast(&self, _city: &str) -> Result<Forecast, FetchError> {
            if self.fail {
                return Err(FetchError::Network("timed out".to_string()));
            }
            let observations = (0..self.observations)
                .map(|i| Observation {
                    time: DateTime::from_timestamp(1_700_000_000 + i as i64 * 10_800, 0).unwrap(),
                    temperature_c: 10.0,
                    humidity_pct: 70,
                    pressure_hpa: 1015.0,
                    condition: "Rain".to_string(),
                })
                .collect();
            Ok(Forecast {
                series: ForecastSeries {
                    observations,
                    ..Default::default()
                },
                raw: serde_json::json!({ "cod": "200" }),
            })
        }
    }

    #[derive(Debug)]
    struct StubRenderer;

    impl ChartRenderer for StubRenderer {
        fn render_series(&self, kind: ChartKind, _: &TimeSeries) -> Result<ImageBlob, RenderError> {
            Ok(ImageBlob::new(kind.as_str().as_bytes().to_vec()))
        }

        fn render_distribution(&self, _: &ConditionDistribution) -> Result<ImageBlob, RenderError> {
            Ok(ImageBlob::new(b"pie".to_vec()))
        }
    }

    fn service(observations: usize, fail: bool) -> WeatherService {
        WeatherService::new(
            Arc::new(FixedProvider { observations, fail }),
            Arc::new(StubRenderer),
        )
    }

    #[tokio::test]
    async fn current_lookup_is_recorded_under_requested_city() {
        let svc = service(0, false);

        let c = svc.current("london").await.unwrap();
        assert_eq!(c.city, "London");

        let history = svc.history(None);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].city, "london");
        assert_eq!(history[0].temperature, 15.0);
    }

    #[tokio::test]
    async fn failed_lookup_leaves_history_untouched() {
        let svc = service(0, true);

        assert!(svc.current("London").await.is_err());
        assert!(svc.history(None).is_empty());
    }

    #[tokio::test]
    async fn forecast_does_not_touch_history() {
        let svc = service(5, false);

        svc.forecast("London").await.unwrap();
        svc.charts("London").await.unwrap();
        assert!(svc.history(None).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn charts_are_rendered_for_non_empty_forecast() {
        let svc = service(40, false);

        let images = svc.charts("London").await.unwrap();
        assert!(images.temperature.is_some());
        assert!(images.humidity.is_some());
        assert!(images.pressure.is_some());
        assert!(images.weather_distribution.is_some());
    }

    #[tokio::test]
    async fn empty_forecast_yields_null_charts() {
        let svc = service(0, false);

        let images = svc.charts("London").await.unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn chart_fetch_failure_is_an_error() {
        let svc = service(0, true);
        assert!(matches!(
            svc.charts("London").await,
            Err(ChartsError::Fetch(FetchError::Network(_)))
        ));
    }

    #[derive(Debug)]
    struct PanickingRenderer;

    impl ChartRenderer for PanickingRenderer {
        fn render_series(&self, _: ChartKind, _: &TimeSeries) -> Result<ImageBlob, RenderError> {
            panic!("renderer crashed");
        }

        fn render_distribution(&self, _: &ConditionDistribution) -> Result<ImageBlob, RenderError> {
            panic!("renderer crashed");
        }
    }

    #[tokio::test]
    async fn crashed_renderer_is_an_error_not_empty_charts() {
        let svc = WeatherService::new(
            Arc::new(FixedProvider {
                observations: 5,
                fail: false,
            }),
            Arc::new(PanickingRenderer),
        );

        assert!(matches!(
            svc.charts("London").await,
            Err(ChartsError::RenderTask(_))
        ));
    }
}

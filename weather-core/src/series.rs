//! Chart series derived from a forecast.
//!
//! Time series keep the provider's ordering; the condition distribution is
//! ordered by descending count with ties broken by first appearance.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::NoData,
    model::{ForecastSeries, Observation},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    pub points: Vec<SeriesPoint>,
}

impl TimeSeries {
    fn from_observations(observations: &[Observation], value: impl Fn(&Observation) -> f64) -> Self {
        Self {
            points: observations
                .iter()
                .map(|o| SeriesPoint {
                    time: o.time,
                    value: value(o),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionCount {
    pub condition: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConditionDistribution {
    pub slices: Vec<ConditionCount>,
}

impl ConditionDistribution {
    pub fn from_observations(observations: &[Observation]) -> Self {
        // Insertion order doubles as first-appearance order for the tie-break.
        let mut slices: Vec<ConditionCount> = Vec::new();
        for observation in observations {
            match slices
                .iter_mut()
                .find(|s| s.condition == observation.condition)
            {
                Some(slice) => slice.count += 1,
                None => slices.push(ConditionCount {
                    condition: observation.condition.clone(),
                    count: 1,
                }),
            }
        }

        // Stable sort keeps first appearance among equal counts.
        slices.sort_by(|a, b| b.count.cmp(&a.count));

        Self { slices }
    }

    pub fn total(&self) -> usize {
        self.slices.iter().map(|s| s.count).sum()
    }
}

/// The four chart inputs derived from one forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedCharts {
    pub temperature: TimeSeries,
    pub humidity: TimeSeries,
    pub pressure: TimeSeries,
    pub distribution: ConditionDistribution,
}

/// Split a forecast into chart inputs; an empty forecast is [`NoData`].
pub fn extract_series(forecast: &ForecastSeries) -> Result<DerivedCharts, NoData> {
    if forecast.is_empty() {
        return Err(NoData);
    }

    let observations = &forecast.observations;

    Ok(DerivedCharts {
        temperature: TimeSeries::from_observations(observations, |o| o.temperature_c),
        humidity: TimeSeries::from_observations(observations, |o| f64::from(o.humidity_pct)),
        pressure: TimeSeries::from_observations(observations, |o| o.pressure_hpa),
        distribution: ConditionDistribution::from_observations(observations),
    })
}

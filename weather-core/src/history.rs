use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::model::HistoryEntry;

/// Maximum number of lookups kept in memory.
pub const HISTORY_CAPACITY: usize = 100;

/// Maximum number of entries returned by a query.
pub const QUERY_LIMIT: usize = 20;

/// Bounded in-memory log of past lookups, oldest first.
///
/// Appends and queries take the same lock, so a query sees every append
/// either completely or not at all.
#[derive(Debug)]
pub struct HistoryLog {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Record a lookup, evicting the single oldest entry when full.
    pub fn append(&self, entry: HistoryEntry) {
        let mut entries = self.entries.lock();
        entries.push_back(entry);
        if entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Last [`QUERY_LIMIT`] entries, newest last, optionally restricted to a
    /// city (case-insensitive). Filtering happens before truncation.
    pub fn query(&self, city: Option<&str>) -> Vec<HistoryEntry> {
        let entries = self.entries.lock();
        let city = city.map(str::to_lowercase);

        let mut matching: Vec<HistoryEntry> = entries
            .iter()
            .rev()
            .filter(|e| match &city {
                Some(city) => e.city.to_lowercase() == *city,
                None => true,
            })
            .take(QUERY_LIMIT)
            .cloned()
            .collect();

        matching.reverse();
        matching
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn entry(city: &str, n: usize) -> HistoryEntry {
        HistoryEntry {
            city: city.to_string(),
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000 + n as i64, 0).unwrap(),
            temperature: n as f64,
            humidity: 50,
            pressure: 1010.0,
            description: "clear sky".to_string(),
            wind_speed: 1.0,
        }
    }

    #[test]
    fn append_past_capacity_evicts_oldest() {
        let log = HistoryLog::new();
        for n in 0..=HISTORY_CAPACITY {
            log.append(entry("London", n));
        }

        assert_eq!(log.len(), HISTORY_CAPACITY);

        let entries = log.entries.lock();
        assert_eq!(entries.front().unwrap().temperature, 1.0);
        assert_eq!(entries.back().unwrap().temperature, HISTORY_CAPACITY as f64);
        assert!(entries.iter().all(|e| e.temperature != 0.0));
    }

    #[test]
    fn query_returns_latest_twenty_in_append_order() {
        let log = HistoryLog::new();
        for n in 0..50 {
            log.append(entry("Paris", n));
        }

        let result = log.query(None);
        let temps: Vec<_> = result.iter().map(|e| e.temperature as usize).collect();
        assert_eq!(temps, (30..50).collect::<Vec<_>>());
    }

    #[test]
    fn query_filters_case_insensitively_before_truncating() {
        let log = HistoryLog::new();
        for n in 0..30 {
            log.append(entry("Berlin", n));
        }
        log.append(entry("london", 100));
        for n in 30..60 {
            log.append(entry("Berlin", n));
        }
        log.append(entry("LONDON", 101));

        let result = log.query(Some("London"));
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].temperature, 100.0);
        assert_eq!(result[1].temperature, 101.0);
    }

    #[test]
    fn query_on_empty_log_is_empty() {
        let log = HistoryLog::new();
        assert!(log.is_empty());
        assert!(log.query(None).is_empty());
        assert!(log.query(Some("Rome")).is_empty());
    }

    #[test]
    fn concurrent_appends_respect_capacity() {
        let log = Arc::new(HistoryLog::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for n in 0..50 {
                        log.append(entry(&format!("city-{t}"), n));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.len(), HISTORY_CAPACITY);
        assert_eq!(log.query(None).len(), QUERY_LIMIT);
    }

    proptest! {
        #[test]
        fn filtered_query_never_leaks_other_cities(
            cities in prop::collection::vec(prop::sample::select(vec!["Oslo", "OSLO", "Rome", "Lima"]), 0..150),
        ) {
            let log = HistoryLog::new();
            for (n, city) in cities.iter().enumerate() {
                log.append(entry(city, n));
            }

            let result = log.query(Some("oslo"));
            prop_assert!(result.len() <= QUERY_LIMIT);
            prop_assert!(result.iter().all(|e| e.city.eq_ignore_ascii_case("oslo")));
            for pair in result.windows(2) {
                prop_assert!(pair[0].timestamp < pair[1].timestamp);
            }
        }
    }
}

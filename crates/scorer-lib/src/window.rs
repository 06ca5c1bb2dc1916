//! Bounded per-series sample window
//!
//! Keeps the N most recent samples of every series, ordered by timestamp.
//! Once a series is full the oldest sample is evicted first.

use std::collections::{BTreeMap, VecDeque};

use crate::models::{MetricSample, SeriesKey};

/// Default number of samples retained per series
pub const DEFAULT_WINDOW_CAPACITY: usize = 60;

#[derive(Debug, Clone)]
pub struct SampleWindow {
    capacity: usize,
    series: BTreeMap<SeriesKey, VecDeque<MetricSample>>,
}

impl SampleWindow {
    /// Create an empty window retaining at most `capacity` samples per series
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            series: BTreeMap::new(),
        }
    }

    /// Build a window from samples in any order
    pub fn from_samples<I>(capacity: usize, samples: I) -> Self
    where
        I: IntoIterator<Item = MetricSample>,
    {
        let mut window = Self::new(capacity);
        for sample in samples {
            window.push(sample);
        }
        window
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a sample at its timestamp position, evicting the oldest if full
    pub fn push(&mut self, sample: MetricSample) {
        let capacity = self.capacity;
        let samples = self
            .series
            .entry(sample.series_key())
            .or_insert_with(|| VecDeque::with_capacity(capacity.min(1024)));

        // Fast path for in-order arrival
        let in_order = samples
            .back()
            .map(|last| last.timestamp <= sample.timestamp)
            .unwrap_or(true);

        if in_order {
            samples.push_back(sample);
        } else {
            // Equal timestamps keep arrival order
            let pos = samples.partition_point(|s| s.timestamp <= sample.timestamp);
            samples.insert(pos, sample);
        }

        while samples.len() > capacity {
            samples.pop_front();
        }
    }

    /// Iterate series in key order, each oldest-first
    pub fn series(&self) -> impl Iterator<Item = (&SeriesKey, &VecDeque<MetricSample>)> {
        self.series.iter()
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&VecDeque<MetricSample>> {
        self.series.get(key)
    }

    /// Total number of retained samples across all series
    pub fn len(&self) -> usize {
        self.series.values().map(VecDeque::len).sum()
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Newest timestamp across every series
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.series
            .values()
            .filter_map(|samples| samples.back().map(|s| s.timestamp))
            .max()
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(window: &SampleWindow, metric: &str) -> Vec<f64> {
        let key = SeriesKey {
            metric: metric.to_string(),
            service: None,
        };
        window
            .get(&key)
            .map(|s| s.iter().map(|m| m.value).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_fifo_eviction() {
        let mut window = SampleWindow::new(3);
        for i in 0..5 {
            window.push(MetricSample::new("errors", i as f64, i * 60));
        }

        assert_eq!(values(&window, "errors"), vec![2.0, 3.0, 4.0]);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_out_of_order_insert() {
        let window = SampleWindow::from_samples(
            10,
            vec![
                MetricSample::new("errors", 3.0, 180),
                MetricSample::new("errors", 1.0, 60),
                MetricSample::new("errors", 2.0, 120),
            ],
        );

        assert_eq!(values(&window, "errors"), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_eviction_is_by_timestamp() {
        // The late-arriving old sample is the one evicted
        let window = SampleWindow::from_samples(
            2,
            vec![
                MetricSample::new("errors", 2.0, 120),
                MetricSample::new("errors", 3.0, 180),
                MetricSample::new("errors", 1.0, 60),
            ],
        );

        assert_eq!(values(&window, "errors"), vec![2.0, 3.0]);
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        let window = SampleWindow::from_samples(
            10,
            vec![
                MetricSample::new("errors", 1.0, 60),
                MetricSample::new("errors", 5.0, 120),
                MetricSample::new("errors", 2.0, 60),
            ],
        );

        assert_eq!(values(&window, "errors"), vec![1.0, 2.0, 5.0]);
    }

    #[test]
    fn test_series_are_independent() {
        let window = SampleWindow::from_samples(
            10,
            vec![
                MetricSample::new("errors", 1.0, 60),
                MetricSample::new("errors", 1.0, 60).with_service("payments-service"),
                MetricSample::new("latency", 0.2, 90),
            ],
        );

        assert_eq!(window.series_count(), 3);
        assert_eq!(window.len(), 3);
        assert_eq!(window.latest_timestamp(), Some(90));
    }

    #[test]
    fn test_empty_window() {
        let window = SampleWindow::default();
        assert!(window.is_empty());
        assert_eq!(window.latest_timestamp(), None);
        assert_eq!(window.capacity(), DEFAULT_WINDOW_CAPACITY);
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shape an anomalous interval takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Plateau well above the normal range (dominant archetype).
    Elevated,
    /// Plateau far below normal, e.g. cache hits or a service outage.
    Suppressed,
    /// Monotonic growth from the preceding value, e.g. a resource leak.
    Drift,
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Archetype::Elevated => write!(f, "elevated"),
            Archetype::Suppressed => write!(f, "suppressed"),
            Archetype::Drift => write!(f, "drift"),
        }
    }
}

/// A labeled anomalous stretch of a series. `start` is a 0-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalousInterval {
    pub start: usize,
    pub duration: usize,
    pub archetype: Archetype,
}

impl AnomalousInterval {
    /// Exclusive end index.
    pub fn end(&self) -> usize {
        self.start + self.duration
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end()
    }
}

/// One row of a persisted series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: u64,
    pub value: f64,
    pub is_anomaly: u8,
}

/// A labeled metric time series with contiguous 1-based timestamps.
///
/// `values` and `labels` are parallel; `labels[t] == 1` exactly for the
/// indices covered by `intervals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub values: Vec<f64>,
    pub labels: Vec<u8>,
    pub intervals: Vec<AnomalousInterval>,
}

impl MetricSeries {
    /// Build a series from values and intervals, deriving the label array.
    pub fn from_intervals(values: Vec<f64>, intervals: Vec<AnomalousInterval>) -> Self {
        let mut labels = vec![0u8; values.len()];
        for interval in &intervals {
            let end = interval.end().min(labels.len());
            for label in &mut labels[interval.start.min(end)..end] {
                *label = 1;
            }
        }
        Self {
            values,
            labels,
            intervals,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn anomaly_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }

    /// Iterate rows as `(timestamp, value, is_anomaly)` with timestamps from 1.
    pub fn points(&self) -> impl Iterator<Item = SeriesPoint> + '_ {
        self.values
            .iter()
            .zip(&self.labels)
            .enumerate()
            .map(|(i, (&value, &is_anomaly))| SeriesPoint {
                timestamp: i as u64 + 1,
                value,
                is_anomaly,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(start: usize, duration: usize) -> AnomalousInterval {
        AnomalousInterval {
            start,
            duration,
            archetype: Archetype::Elevated,
        }
    }

    #[test]
    fn labels_cover_exactly_the_intervals() {
        let series = MetricSeries::from_intervals(vec![0.0; 20], vec![interval(2, 3), interval(10, 4)]);

        let flagged: Vec<usize> = series
            .labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == 1)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(flagged, vec![2, 3, 4, 10, 11, 12, 13]);
        assert_eq!(series.anomaly_count(), 7);
    }

    #[test]
    fn interval_past_end_is_truncated_in_labels() {
        let series = MetricSeries::from_intervals(vec![0.0; 5], vec![interval(3, 5)]);
        assert_eq!(series.labels, vec![0, 0, 0, 1, 1]);
    }

    #[test]
    fn points_use_one_based_timestamps() {
        let series = MetricSeries::from_intervals(vec![1.5, 2.5], vec![interval(1, 1)]);
        let points: Vec<SeriesPoint> = series.points().collect();

        assert_eq!(points[0].timestamp, 1);
        assert_eq!(points[1].timestamp, 2);
        assert_eq!(points[1].value, 2.5);
        assert_eq!(points[1].is_anomaly, 1);
    }

    #[test]
    fn interval_contains_is_half_open() {
        let iv = interval(4, 2);
        assert!(!iv.contains(3));
        assert!(iv.contains(4));
        assert!(iv.contains(5));
        assert!(!iv.contains(6));
    }
}

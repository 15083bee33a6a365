use serde::{Deserialize, Serialize};

/// How an [`EvaluationRecord`]'s scores were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Scores returned by the detector, unmodified.
    Scored,
    /// Silent detector output on a series configured as anomaly-free,
    /// replaced by a perfect score.
    Overridden,
    /// The detector failed or timed out; scores are zero.
    Failed,
}

/// Per-series evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub metric_name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub outcome: Outcome,
}

impl EvaluationRecord {
    pub fn scored(metric_name: impl Into<String>, precision: f64, recall: f64, f1: f64) -> Self {
        Self {
            metric_name: metric_name.into(),
            precision,
            recall,
            f1,
            outcome: Outcome::Scored,
        }
    }

    pub fn perfect(metric_name: impl Into<String>) -> Self {
        Self {
            metric_name: metric_name.into(),
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
            outcome: Outcome::Overridden,
        }
    }

    pub fn failed(metric_name: impl Into<String>) -> Self {
        Self {
            metric_name: metric_name.into(),
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
            outcome: Outcome::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.outcome == Outcome::Failed
    }
}

/// Corpus-level means over every evaluated series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub series_count: usize,
    pub failed_count: usize,
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DetectionRequest, DetectionScores, Detector, DetectorError};
use crate::eval::scoring::{point_adjust, point_scores};

/// Scale factor making MAD a consistent estimator of the standard deviation
/// for normally distributed data.
const MAD_SCALE: f64 = 1.4826;

/// Default robust z-score above which a test point is flagged.
pub const DEFAULT_THRESHOLD: f64 = 3.5;

/// Learned pattern persisted to the request's pattern path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselinePattern {
    pub median: f64,
    pub scale: f64,
    pub threshold: f64,
    pub m: u32,
    pub p: u32,
    pub train_len: usize,
}

/// Robust z-score detector.
///
/// Fits the median and scaled MAD of the training values and flags test
/// points whose absolute robust z-score exceeds the threshold. `m` and `p`
/// are recorded in the pattern but do not influence detection.
#[derive(Debug, Clone)]
pub struct BaselineDetector {
    threshold: f64,
    point_adjust: bool,
}

impl Default for BaselineDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            point_adjust: true,
        }
    }
}

impl BaselineDetector {
    pub fn new(threshold: f64, point_adjust: bool) -> Self {
        Self {
            threshold,
            point_adjust,
        }
    }

    /// Fit median and scale on training values.
    pub fn fit(train: &[f64]) -> Option<(f64, f64)> {
        let center = median(train.to_vec())?;
        let deviations: Vec<f64> = train.iter().map(|v| (v - center).abs()).collect();
        let mad = median(deviations)?;
        Some((center, (mad * MAD_SCALE).max(f64::EPSILON)))
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

impl Detector for BaselineDetector {
    fn name(&self) -> &str {
        "baseline"
    }

    fn detect(&self, request: &DetectionRequest) -> Result<DetectionScores, DetectorError> {
        if request.test.len() != request.test_labels.len() {
            return Err(DetectorError::Failed(format!(
                "test values ({}) and labels ({}) differ in length",
                request.test.len(),
                request.test_labels.len()
            )));
        }
        let (median, scale) = Self::fit(&request.train)
            .ok_or_else(|| DetectorError::Failed("empty training slice".into()))?;

        let mut predicted: Vec<bool> = request
            .test
            .iter()
            .map(|v| ((v - median) / scale).abs() > self.threshold)
            .collect();
        if self.point_adjust {
            predicted = point_adjust(&predicted, &request.test_labels);
        }
        let scores = point_scores(&predicted, &request.test_labels);

        let pattern = BaselinePattern {
            median,
            scale,
            threshold: self.threshold,
            m: request.params.m,
            p: request.params.p,
            train_len: request.train.len(),
        };
        if let Some(parent) = request.pattern_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&request.pattern_path, serde_json::to_string_pretty(&pattern)?)?;

        debug!(
            metric = %request.metric_name,
            median,
            scale,
            flagged = predicted.iter().filter(|&&p| p).count(),
            f1 = scores.f1,
            "baseline detection done"
        );
        Ok(scores)
    }
}

//! The detector boundary.
//!
//! The harness hands each series to a [`Detector`] as a [`DetectionRequest`]
//! and gets back precision/recall/F1 for the test suffix. The algorithm
//! behind the trait is opaque; `m` and `p` are passed through untouched.

pub mod baseline;
pub mod command;

use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use metricbench_core::DetectionParams;

pub use baseline::BaselineDetector;
pub use command::CommandDetector;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector failed: {0}")]
    Failed(String),

    #[error("detector timed out after {0:?}")]
    TimedOut(Duration),

    #[error("detector panicked: {0}")]
    Panicked(String),

    #[error("detector returned invalid scores (precision={precision}, recall={recall}, f1={f1})")]
    InvalidScores { precision: f64, recall: f64, f1: f64 },

    #[error("series of length {len} has no test points after a training prefix of {train_length}")]
    InsufficientData { len: usize, train_length: usize },

    #[error("detector command `{program}` exited with {status}: {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a detector receives for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRequest {
    pub metric_name: String,
    pub params: DetectionParams,
    pub train: Vec<f64>,
    pub test: Vec<f64>,
    pub test_labels: Vec<u8>,
    /// Where the detector may persist its learned pattern.
    pub pattern_path: PathBuf,
    /// Where the detector may render a figure.
    pub figure_path: PathBuf,
    /// Wall-clock limit for this call. Detectors that own external
    /// resources enforce it themselves so nothing outlives the call.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

/// Precision, recall and F1 on the test suffix.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl DetectionScores {
    pub const fn new(precision: f64, recall: f64, f1: f64) -> Self {
        Self {
            precision,
            recall,
            f1,
        }
    }

    pub fn sum(&self) -> f64 {
        self.precision + self.recall + self.f1
    }

    /// Reject non-finite scores and scores outside `[0, 1]`.
    pub fn validate(self) -> Result<Self, DetectorError> {
        let ok = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if ok(self.precision) && ok(self.recall) && ok(self.f1) {
            Ok(self)
        } else {
            Err(DetectorError::InvalidScores {
                precision: self.precision,
                recall: self.recall,
                f1: self.f1,
            })
        }
    }
}

/// An anomaly detector under evaluation.
///
/// Implemented by [`BaselineDetector`], [`CommandDetector`] and test
/// doubles. Calls may come from several threads at once.
pub trait Detector: Send + Sync {
    fn name(&self) -> &str;

    fn detect(&self, request: &DetectionRequest) -> Result<DetectionScores, DetectorError>;
}

/// Run one detector call on its own thread and wait for it.
///
/// With `Some(timeout)` the wait is bounded; on expiry the worker thread is
/// abandoned and [`DetectorError::TimedOut`] is returned. A panic inside the
/// detector surfaces as [`DetectorError::Panicked`]. Returned scores are
/// validated before they reach the caller.
pub fn run_with_timeout(
    detector: Arc<dyn Detector>,
    request: Arc<DetectionRequest>,
    timeout: Option<Duration>,
) -> Result<DetectionScores, DetectorError> {
    let (tx, rx) = mpsc::channel();
    let thread_name = format!("detect-{}", request.metric_name);
    thread::Builder::new().name(thread_name).spawn(move || {
        let result = detector.detect(&request);
        // The receiver is gone if the harness already gave up on this call.
        let _ = tx.send(result);
    })?;

    let received = match timeout {
        Some(limit) => rx.recv_timeout(limit),
        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
    };

    match received {
        Ok(result) => result.and_then(DetectionScores::validate),
        Err(RecvTimeoutError::Timeout) => Err(DetectorError::TimedOut(
            timeout.unwrap_or_default(),
        )),
        Err(RecvTimeoutError::Disconnected) => Err(DetectorError::Panicked(
            "worker thread exited without a result".into(),
        )),
    }
}

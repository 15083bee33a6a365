use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use metricbench_core::{DatasetParams, DetectionParams, EvaluationRecord, ScoreOverride};

use super::EvalError;
use crate::corpus::{LoadedCorpus, LoadedSeries};
use crate::detector::{run_with_timeout, DetectionRequest, DetectionScores, Detector, DetectorError};

/// Default training prefix length.
pub const DEFAULT_TRAIN_LENGTH: usize = 300;

/// Dataset whose metrics are named `real_{i}` from zero.
const YAHOO_DATASET: &str = "yahoo";

/// How a series is named for params lookup, artifact paths and report rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricNaming {
    /// `{prefix}_{position + first_index}`, by position in the sorted corpus.
    Positional { prefix: String, first_index: usize },
    /// The series file stem.
    FileStem,
}

impl MetricNaming {
    pub fn positional(prefix: impl Into<String>, first_index: usize) -> Self {
        Self::Positional {
            prefix: prefix.into(),
            first_index,
        }
    }

    /// `{dataset}_1, {dataset}_2, ..`, except Yahoo's `real_0, real_1, ..`.
    pub fn for_dataset(dataset: &str) -> Self {
        if dataset == YAHOO_DATASET {
            Self::positional("real", 0)
        } else {
            Self::positional(dataset, 1)
        }
    }

    pub fn name(&self, position: usize, series: &LoadedSeries) -> String {
        match self {
            Self::Positional {
                prefix,
                first_index,
            } => format!("{prefix}_{}", position + first_index),
            Self::FileStem => series.name.clone(),
        }
    }
}

/// How one dataset is evaluated.
#[derive(Debug, Clone)]
pub struct EvaluationPlan {
    pub dataset: String,
    /// Series are split at this index: `[train_skip, train_length)` trains,
    /// `[train_length, len)` is the labeled test suffix.
    pub train_length: usize,
    pub train_skip: usize,
    pub params: DatasetParams,
    pub naming: MetricNaming,
    pub pattern_dir: PathBuf,
    pub figure_dir: PathBuf,
    pub detector_timeout: Option<Duration>,
}

impl EvaluationPlan {
    /// Plan with the conventional `./offline_metrics/{dataset}` and
    /// `./res/{dataset}` artifact directories.
    pub fn new(dataset: impl Into<String>, params: DatasetParams) -> Self {
        let dataset = dataset.into();
        Self {
            pattern_dir: PathBuf::from("offline_metrics").join(&dataset),
            figure_dir: PathBuf::from("res").join(&dataset),
            naming: MetricNaming::for_dataset(&dataset),
            dataset,
            train_length: DEFAULT_TRAIN_LENGTH,
            train_skip: 0,
            params,
            detector_timeout: None,
        }
    }

    pub fn with_train_length(mut self, train_length: usize) -> Self {
        self.train_length = train_length;
        self
    }

    pub fn with_train_skip(mut self, train_skip: usize) -> Self {
        self.train_skip = train_skip;
        self
    }

    pub fn with_naming(mut self, naming: MetricNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_pattern_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pattern_dir = dir.into();
        self
    }

    pub fn with_figure_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.figure_dir = dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.detector_timeout = timeout;
        self
    }

    fn validate(&self) -> Result<(), EvalError> {
        if self.train_length == 0 {
            return Err(EvalError::InvalidPlan("train_length must be positive".into()));
        }
        if self.train_skip >= self.train_length {
            return Err(EvalError::InvalidPlan(format!(
                "train_skip {} leaves no training points before {}",
                self.train_skip, self.train_length
            )));
        }
        Ok(())
    }

    fn pattern_path(&self, name: &str, params: DetectionParams) -> PathBuf {
        self.pattern_dir
            .join(format!("{}_{}_{}.json", name, params.m, params.p))
    }

    fn figure_path(&self, name: &str, params: DetectionParams) -> PathBuf {
        self.figure_dir
            .join(format!("{}_{}_{}.png", name, params.m, params.p))
    }
}

/// Runs a detector over every series of a corpus.
pub struct Harness {
    detector: Arc<dyn Detector>,
    plan: EvaluationPlan,
}

impl Harness {
    pub fn new(detector: Arc<dyn Detector>, plan: EvaluationPlan) -> Self {
        Self { detector, plan }
    }

    /// One record per series, in corpus order.
    ///
    /// Per-series detector failures become zero-score records; only an
    /// invalid plan or unusable artifact directories fail the whole run.
    pub fn evaluate(&self, corpus: &LoadedCorpus) -> Result<Vec<EvaluationRecord>, EvalError> {
        self.plan.validate()?;
        std::fs::create_dir_all(&self.plan.pattern_dir)?;
        std::fs::create_dir_all(&self.plan.figure_dir)?;

        info!(
            dataset = %self.plan.dataset,
            detector = self.detector.name(),
            series = corpus.len(),
            train_length = self.plan.train_length,
            train_skip = self.plan.train_skip,
            "evaluation started"
        );

        let records: Vec<EvaluationRecord> = corpus
            .series
            .par_iter()
            .enumerate()
            .map(|(position, series)| {
                let name = self.plan.naming.name(position, series);
                self.evaluate_series(&name, series)
            })
            .collect();

        let failed = records.iter().filter(|r| r.is_failed()).count();
        info!(
            dataset = %self.plan.dataset,
            evaluated = records.len(),
            failed,
            "evaluation finished"
        );
        Ok(records)
    }

    fn build_request(
        &self,
        name: &str,
        series: &LoadedSeries,
        params: DetectionParams,
    ) -> Result<DetectionRequest, DetectorError> {
        let train_length = self.plan.train_length;
        if series.values.len() <= train_length {
            return Err(DetectorError::InsufficientData {
                len: series.values.len(),
                train_length,
            });
        }

        Ok(DetectionRequest {
            metric_name: name.to_string(),
            params,
            train: series.values[self.plan.train_skip..train_length].to_vec(),
            test: series.values[train_length..].to_vec(),
            test_labels: series.labels[train_length..].to_vec(),
            pattern_path: self.plan.pattern_path(name, params),
            figure_path: self.plan.figure_path(name, params),
            timeout: self.plan.detector_timeout,
        })
    }

    fn evaluate_series(&self, name: &str, series: &LoadedSeries) -> EvaluationRecord {
        let params = self.plan.params.lookup(name);
        info!(
            dataset = %self.plan.dataset,
            metric = name,
            file = %series.name,
            m = params.m,
            p = params.p,
            "evaluating series"
        );

        let scores = self
            .build_request(name, series, params)
            .and_then(|request| {
                run_with_timeout(
                    Arc::clone(&self.detector),
                    Arc::new(request),
                    self.plan.detector_timeout,
                )
            });

        match scores {
            Ok(scores) => self.finalize(name, scores),
            Err(e) => {
                warn!(dataset = %self.plan.dataset, metric = name, error = %e, "detector failed, recording zero scores");
                EvaluationRecord::failed(name)
            }
        }
    }

    fn finalize(&self, name: &str, scores: DetectionScores) -> EvaluationRecord {
        let policy = self.plan.params.score_override(name);
        if policy == Some(ScoreOverride::PerfectIfSilent) && scores.sum() == 0.0 {
            info!(metric = name, "no predictions on anomaly-free series, scoring as perfect");
            return EvaluationRecord::perfect(name);
        }
        debug!(
            metric = name,
            precision = scores.precision,
            recall = scores.recall,
            f1 = scores.f1,
            "series scored"
        );
        EvaluationRecord::scored(name, scores.precision, scores.recall, scores.f1)
    }
}

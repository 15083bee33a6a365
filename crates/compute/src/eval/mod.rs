//! Offline evaluation: run a detector over a corpus and summarize.

pub mod aggregate;
pub mod harness;
pub mod report;
pub mod scoring;

use std::path::PathBuf;

use thiserror::Error;

pub use aggregate::aggregate;
pub use harness::{EvaluationPlan, Harness, MetricNaming};
pub use report::{format_summary, write_report, Report, RunSummary};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid evaluation plan: {0}")]
    InvalidPlan(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

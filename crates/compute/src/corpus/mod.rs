//! On-disk benchmark corpora.
//!
//! A corpus is a flat directory of `timestamp,value,is_anomaly` CSV files,
//! one per series, optionally accompanied by a `manifest.json` written by
//! the generator:
//! ```text
//! response_time_benchmark/
//!   manifest.json
//!   response_time_001.csv
//!   response_time_002.csv
//!   ...
//! ```

pub mod loader;
pub mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use loader::{load_corpus, LoadedCorpus, LoadedSeries};
pub use store::{read_series, write_series, MANIFEST_FILE};

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus directory not found: {0}")]
    NotFound(PathBuf),

    #[error("corpus directory holds no CSV files: {0}")]
    Empty(PathBuf),

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

    #[error("invalid corpus spec: {0}")]
    InvalidSpec(String),

    #[error("malformed series {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

impl CorpusError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

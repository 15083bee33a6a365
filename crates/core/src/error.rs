use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid params file {path}: {source}")]
    Params {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("Invalid length range: {min}..={max}")]
    InvalidLengthRange { min: usize, max: usize },
}

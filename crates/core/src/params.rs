//! Per-metric detector parameter lookup.
//!
//! The params file maps dataset name → metric name → entry:
//!
//! ```json
//! {
//!   "response_time": { "response_time_3": { "m": 8, "p": 95 } },
//!   "yahoo": { "real_28": { "m": 5, "p": 99, "override": "perfect_if_silent" } }
//! }
//! ```
//!
//! Missing entries, and missing fields inside an entry, fall back to the
//! dataset default pair.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;

/// Opaque tuning knobs handed to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetectionParams {
    pub m: u32,
    pub p: u32,
}

impl DetectionParams {
    pub const fn new(m: u32, p: u32) -> Self {
        Self { m, p }
    }
}

/// Default pair for a dataset when the params file has no entry.
pub fn default_params_for(dataset: &str) -> DetectionParams {
    match dataset {
        "error_rate" => DetectionParams::new(50, 10),
        _ => DetectionParams::new(5, 99),
    }
}

/// Policy applied to a series' raw detector scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOverride {
    /// The series holds no true anomalies: when the detector also predicts
    /// nothing (scores sum to zero) the series scores `(1, 1, 1)`.
    PerfectIfSilent,
}

/// One metric's entry in the params file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<u32>,
    #[serde(default, rename = "override", skip_serializing_if = "Option::is_none")]
    pub score_override: Option<ScoreOverride>,
}

/// The whole params file, keyed by dataset then metric name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamTable {
    datasets: BTreeMap<String, BTreeMap<String, ParamEntry>>,
}

impl ParamTable {
    /// Load the params file. A missing file yields an empty table so every
    /// lookup falls back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "params file not found, using defaults for every metric");
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let table: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Params {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), datasets = table.datasets.len(), "params file loaded");
        Ok(table)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Extract the lookup table for one dataset.
    pub fn dataset(&self, dataset: &str, defaults: DetectionParams) -> DatasetParams {
        DatasetParams {
            dataset: dataset.to_string(),
            defaults,
            entries: self.datasets.get(dataset).cloned().unwrap_or_default(),
        }
    }

    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }
}

/// Read-only parameter lookup for a single dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetParams {
    dataset: String,
    defaults: DetectionParams,
    entries: BTreeMap<String, ParamEntry>,
}

impl DatasetParams {
    pub fn new(dataset: impl Into<String>, defaults: DetectionParams) -> Self {
        Self {
            dataset: dataset.into(),
            defaults,
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, metric_name: impl Into<String>, entry: ParamEntry) -> Self {
        self.entries.insert(metric_name.into(), entry);
        self
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn defaults(&self) -> DetectionParams {
        self.defaults
    }

    /// Resolve `(m, p)` for a metric, field by field.
    pub fn lookup(&self, metric_name: &str) -> DetectionParams {
        match self.entries.get(metric_name) {
            Some(entry) => DetectionParams {
                m: entry.m.unwrap_or(self.defaults.m),
                p: entry.p.unwrap_or(self.defaults.p),
            },
            None => {
                info!(
                    dataset = %self.dataset,
                    metric = metric_name,
                    m = self.defaults.m,
                    p = self.defaults.p,
                    "no params entry, using dataset defaults"
                );
                self.defaults
            }
        }
    }

    pub fn score_override(&self, metric_name: &str) -> Option<ScoreOverride> {
        self.entries
            .get(metric_name)
            .and_then(|entry| entry.score_override)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "response_time": {
            "response_time_1": { "m": 8, "p": 95 },
            "response_time_2": { "m": 12 }
        },
        "yahoo": {
            "real_28": { "m": 5, "p": 99, "override": "perfect_if_silent" }
        }
    }"#;

    #[test]
    fn lookup_hit_returns_entry() {
        let table = ParamTable::from_json_str(SAMPLE).unwrap();
        let params = table.dataset("response_time", DetectionParams::new(5, 99));
        assert_eq!(params.lookup("response_time_1"), DetectionParams::new(8, 95));
    }

    #[test]
    fn lookup_fills_missing_fields_from_defaults() {
        let table = ParamTable::from_json_str(SAMPLE).unwrap();
        let params = table.dataset("response_time", DetectionParams::new(5, 99));
        assert_eq!(params.lookup("response_time_2"), DetectionParams::new(12, 99));
    }

    #[test]
    fn lookup_miss_falls_back_to_defaults() {
        let table = ParamTable::from_json_str(SAMPLE).unwrap();
        let params = table.dataset("error_rate", default_params_for("error_rate"));
        assert_eq!(params.lookup("error_rate_7"), DetectionParams::new(50, 10));
    }

    #[test]
    fn override_is_read_from_entry() {
        let table = ParamTable::from_json_str(SAMPLE).unwrap();
        let params = table.dataset("yahoo", DetectionParams::new(5, 99));
        assert_eq!(params.score_override("real_28"), Some(ScoreOverride::PerfectIfSilent));
        assert_eq!(params.score_override("real_1"), None);
    }

    #[test]
    fn unknown_entry_field_is_rejected() {
        let err = ParamTable::from_json_str(r#"{ "x": { "a": { "k": 1 } } }"#);
        assert!(err.is_err());
    }

    #[test]
    fn load_missing_file_is_empty_table() {
        let tmp = tempfile::tempdir().unwrap();
        let table = ParamTable::load(&tmp.path().join("params.json")).unwrap();
        assert_eq!(table.dataset_names().count(), 0);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("params.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let table = ParamTable::load(&path).unwrap();
        let names: Vec<&str> = table.dataset_names().collect();
        assert_eq!(names, vec!["response_time", "yahoo"]);
    }

    #[test]
    fn load_reports_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("params.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(ParamTable::load(&path), Err(ConfigError::Params { .. })));
    }
}

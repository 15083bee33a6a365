use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub storage: StorageConfig,
    pub generator: GeneratorConfig,
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `METRICBENCH_PROFILE`. When set (e.g. `CI`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("METRICBENCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            storage: StorageConfig::from_env_profiled(p),
            generator: GeneratorConfig::from_env_profiled(p),
            evaluation: EvaluationConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  storage:     data_dir={}, results_dir={}, pattern_dir={}, params={}",
            self.storage.data_dir.display(),
            self.storage.results_dir.display(),
            self.storage.pattern_dir.display(),
            self.storage.params_path.display()
        );
        tracing::info!(
            "  generator:   files={}, length={}..={}, base_seed={}",
            self.generator.num_files,
            self.generator.min_length,
            self.generator.max_length,
            self.generator.base_seed
        );
        tracing::info!(
            "  evaluation:  train_length={}, timeout_secs={}, workers={}",
            self.evaluation.train_length,
            self.evaluation.detector_timeout_secs,
            self.evaluation.workers
        );
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root under which `{domain}_benchmark/` corpora live.
    pub data_dir: PathBuf,
    /// Root for per-dataset result reports.
    pub results_dir: PathBuf,
    /// Root for learned pattern artifacts written by detectors.
    pub pattern_dir: PathBuf,
    pub params_path: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
            results_dir: PathBuf::from(profiled_env_or(p, "RESULTS_DIR", "res")),
            pattern_dir: PathBuf::from(profiled_env_or(p, "PATTERN_DIR", "offline_metrics")),
            params_path: PathBuf::from(profiled_env_or(p, "PARAMS_PATH", "params.json")),
        }
    }
}

// ── Generator ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub num_files: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub base_seed: u64,
}

impl GeneratorConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            num_files: profiled_env_usize(p, "NUM_FILES", 50),
            min_length: profiled_env_usize(p, "MIN_LENGTH", 800),
            max_length: profiled_env_usize(p, "MAX_LENGTH", 1000),
            base_seed: profiled_env_u64(p, "BASE_SEED", 0),
        }
    }

    /// Inclusive series length range.
    pub fn length_range(&self) -> Result<std::ops::RangeInclusive<usize>, ConfigError> {
        if self.min_length == 0 || self.min_length > self.max_length {
            return Err(ConfigError::InvalidLengthRange {
                min: self.min_length,
                max: self.max_length,
            });
        }
        Ok(self.min_length..=self.max_length)
    }
}

// ── Evaluation ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Length of the training prefix; the rest of each series is the test suffix.
    pub train_length: usize,
    /// Per-series detector timeout; 0 disables the guard.
    pub detector_timeout_secs: u64,
    /// Worker threads for per-series work; 0 = rayon default.
    pub workers: usize,
}

impl EvaluationConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            train_length: profiled_env_usize(p, "TRAIN_LENGTH", 300),
            detector_timeout_secs: profiled_env_u64(p, "DETECTOR_TIMEOUT_SECS", 300),
            workers: profiled_env_usize(p, "WORKERS", 0),
        }
    }

    pub fn detector_timeout(&self) -> Option<Duration> {
        (self.detector_timeout_secs > 0).then(|| Duration::from_secs(self.detector_timeout_secs))
    }
}

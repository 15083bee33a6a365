use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use metricbench_core::{AnomalousInterval, Domain, MetricSeries};

use super::profile::DomainProfile;
use super::synthesizer::synthesize_with_rng;
use super::GenerationError;
use crate::corpus::{write_series, CorpusError, MANIFEST_FILE};

/// What to build: how many files, their length range and the seed base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusSpec {
    pub num_files: usize,
    pub length_range: RangeInclusive<usize>,
    /// File `i` (1-based) is generated from seed `base_seed + i`.
    pub base_seed: u64,
}

impl CorpusSpec {
    pub fn seed_for(&self, index: usize) -> u64 {
        self.base_seed.wrapping_add(index as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    pub seed: u64,
    pub length: usize,
    pub intervals: Vec<AnomalousInterval>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestFailure {
    pub index: usize,
    pub seed: u64,
    pub error: String,
}

/// Build description written as `manifest.json` beside the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusManifest {
    pub domain: Domain,
    pub base_seed: u64,
    pub num_files: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub generated_at: DateTime<Utc>,
    pub files: Vec<ManifestEntry>,
    pub failures: Vec<ManifestFailure>,
}

impl CorpusManifest {
    pub fn load(dir: &Path) -> Result<Option<Self>, CorpusError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, dir: &Path) -> Result<(), CorpusError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(MANIFEST_FILE), json)?;
        Ok(())
    }
}

/// Zero-padded series file name: `{domain}_{index}.csv`.
///
/// The pad width is `max(3, digits(num_files))` so that lexicographic
/// order of the files equals their numeric order.
pub fn file_name(domain: Domain, index: usize, num_files: usize) -> String {
    let width = num_files.to_string().len().max(3);
    format!("{}_{:0width$}.csv", domain.as_str(), index, width = width)
}

/// One parallel generation outcome, written out in index order.
struct GeneratedSeries {
    index: usize,
    seed: u64,
    length: usize,
    result: Result<MetricSeries, GenerationError>,
}

/// Remove series left by an earlier build of the same domain.
fn remove_stale_series(dir: &Path, domain: Domain) -> Result<usize, CorpusError> {
    let prefix = format!("{}_", domain.as_str());
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let stale = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(&prefix) && n.ends_with(".csv"))
            .unwrap_or(false);
        if stale {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Generate `spec.num_files` series for one domain into `dir`.
///
/// Series are synthesized in parallel; each file depends only on its own
/// seed. A series that fails to generate is logged and recorded in the
/// manifest; the remaining files are still written.
pub fn build_corpus(
    profile: &DomainProfile,
    spec: &CorpusSpec,
    dir: &Path,
) -> Result<CorpusManifest, CorpusError> {
    if spec.num_files == 0 {
        return Err(CorpusError::InvalidSpec("num_files must be at least 1".into()));
    }
    if spec.length_range.is_empty() {
        return Err(CorpusError::InvalidSpec(format!(
            "empty length range {}..={}",
            spec.length_range.start(),
            spec.length_range.end()
        )));
    }

    std::fs::create_dir_all(dir)?;
    let stale = remove_stale_series(dir, profile.domain)?;
    if stale > 0 {
        info!(dir = %dir.display(), removed = stale, "removed series from previous build");
    }

    let generated: Vec<GeneratedSeries> = (1..=spec.num_files)
        .into_par_iter()
        .map(|index| {
            let seed = spec.seed_for(index);
            let mut rng = StdRng::seed_from_u64(seed);
            let length = rng.gen_range(spec.length_range.clone());
            GeneratedSeries {
                index,
                seed,
                length,
                result: synthesize_with_rng(profile, length, &mut rng),
            }
        })
        .collect();

    let mut files = Vec::with_capacity(spec.num_files);
    let mut failures = Vec::new();

    for GeneratedSeries {
        index,
        seed,
        length,
        result,
    } in generated
    {
        match result {
            Ok(series) => {
                let name = file_name(profile.domain, index, spec.num_files);
                let path: PathBuf = dir.join(&name);
                write_series(&path, &series)?;
                debug!(
                    file = %name,
                    seed,
                    length,
                    anomalies = series.anomaly_count(),
                    "series written"
                );
                files.push(ManifestEntry {
                    file: name,
                    seed,
                    length,
                    intervals: series.intervals,
                });
            }
            Err(e) => {
                warn!(domain = %profile.domain, index, seed, length, error = %e, "series generation failed");
                failures.push(ManifestFailure {
                    index,
                    seed,
                    error: e.to_string(),
                });
            }
        }
    }

    let manifest = CorpusManifest {
        domain: profile.domain,
        base_seed: spec.base_seed,
        num_files: spec.num_files,
        min_length: *spec.length_range.start(),
        max_length: *spec.length_range.end(),
        generated_at: Utc::now(),
        files,
        failures,
    };
    manifest.save(dir)?;

    info!(
        domain = %profile.domain,
        dir = %dir.display(),
        written = manifest.files.len(),
        failed = manifest.failures.len(),
        "corpus built"
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::load_corpus;
    use crate::generator::profile::{profile_for, RESPONSE_TIME, THROUGHPUT};

    fn spec(num_files: usize) -> CorpusSpec {
        CorpusSpec {
            num_files,
            length_range: 800..=1000,
            base_seed: 0,
        }
    }

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(file_name(Domain::ResponseTime, 1, 50), "response_time_001.csv");
        assert_eq!(file_name(Domain::ResponseTime, 50, 50), "response_time_050.csv");
        assert_eq!(file_name(Domain::ErrorRate, 7, 1200), "error_rate_0007.csv");
    }

    #[test]
    fn base_seed_zero_gives_index_seeds() {
        let s = spec(3);
        assert_eq!(s.seed_for(1), 1);
        assert_eq!(s.seed_for(3), 3);
    }

    #[test]
    fn builds_requested_number_of_files_with_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = build_corpus(&RESPONSE_TIME, &spec(12), tmp.path()).unwrap();

        assert_eq!(manifest.files.len(), 12);
        assert!(manifest.failures.is_empty());
        assert!(manifest
            .files
            .iter()
            .all(|f| (800..=1000).contains(&f.length)));

        let reloaded = CorpusManifest::load(tmp.path()).unwrap().unwrap();
        assert_eq!(reloaded.files, manifest.files);
    }

    #[test]
    fn persisted_corpus_loads_back_identically() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = build_corpus(&THROUGHPUT, &spec(5), tmp.path()).unwrap();
        let corpus = load_corpus(tmp.path()).unwrap();

        assert_eq!(corpus.len(), 5);
        for (i, (entry, loaded)) in manifest.files.iter().zip(&corpus.series).enumerate() {
            let index = i + 1;
            assert_eq!(format!("{}.csv", loaded.name), entry.file);

            let mut rng = StdRng::seed_from_u64(spec(5).seed_for(index));
            let length = rng.gen_range(800..=1000);
            let expected = synthesize_with_rng(&THROUGHPUT, length, &mut rng).unwrap();

            assert_eq!(entry.length, length);
            assert_eq!(loaded.labels, expected.labels);
            assert_eq!(loaded.values.len(), expected.values.len());
            for (t, (got, want)) in loaded.values.iter().zip(&expected.values).enumerate() {
                assert_eq!(
                    got.to_bits(),
                    want.to_bits(),
                    "{} differs at t={t}: {got} vs {want}",
                    entry.file
                );
            }
        }
    }

    #[test]
    fn rebuild_with_same_seed_is_identical() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        build_corpus(&RESPONSE_TIME, &spec(4), a.path()).unwrap();
        build_corpus(&RESPONSE_TIME, &spec(4), b.path()).unwrap();

        for i in 1..=4 {
            let name = file_name(Domain::ResponseTime, i, 4);
            let left = std::fs::read(a.path().join(&name)).unwrap();
            let right = std::fs::read(b.path().join(&name)).unwrap();
            assert_eq!(left, right, "{name} differs between builds");
        }
    }

    #[test]
    fn rebuild_removes_series_from_larger_previous_build() {
        let tmp = tempfile::tempdir().unwrap();
        build_corpus(&RESPONSE_TIME, &spec(6), tmp.path()).unwrap();
        build_corpus(&RESPONSE_TIME, &spec(3), tmp.path()).unwrap();

        assert_eq!(load_corpus(tmp.path()).unwrap().len(), 3);
    }

    #[test]
    fn infeasible_lengths_are_recorded_as_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let short = CorpusSpec {
            num_files: 3,
            length_range: 60..=70,
            base_seed: 0,
        };
        let manifest = build_corpus(profile_for(Domain::PageLoad), &short, tmp.path()).unwrap();

        assert!(manifest.files.is_empty());
        assert_eq!(manifest.failures.len(), 3);
        assert_eq!(manifest.failures[0].index, 1);
    }

    #[test]
    fn empty_spec_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            build_corpus(&RESPONSE_TIME, &spec(0), tmp.path()),
            Err(CorpusError::InvalidSpec(_))
        ));
    }
}

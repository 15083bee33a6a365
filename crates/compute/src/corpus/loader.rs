use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::store::read_series;
use super::CorpusError;

/// One series as loaded for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSeries {
    /// File stem, used as the metric name for params lookup and reports.
    pub name: String,
    pub values: Vec<f64>,
    pub labels: Vec<u8>,
}

/// All series of a corpus directory, in lexicographic file-name order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCorpus {
    pub dir: PathBuf,
    pub series: Vec<LoadedSeries>,
}

impl LoadedCorpus {
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// List `*.csv` files in `dir`, sorted by file name.
fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>, CorpusError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv && path.is_file() {
            files.push(path);
        } else {
            debug!(path = %path.display(), "skipping non-CSV entry");
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Load every series in a corpus directory.
pub fn load_corpus(dir: &Path) -> Result<LoadedCorpus, CorpusError> {
    if !dir.is_dir() {
        return Err(CorpusError::NotFound(dir.to_path_buf()));
    }

    let files = list_csv_files(dir)?;
    if files.is_empty() {
        return Err(CorpusError::Empty(dir.to_path_buf()));
    }

    let mut series = Vec::with_capacity(files.len());
    for path in files {
        let (values, labels) = read_series(&path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(series = %name, points = values.len(), "series loaded");
        series.push(LoadedSeries {
            name,
            values,
            labels,
        });
    }

    info!(dir = %dir.display(), series = series.len(), "corpus loaded");
    Ok(LoadedCorpus {
        dir: dir.to_path_buf(),
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::store::write_series;
    use metricbench_core::MetricSeries;

    fn write(dir: &Path, name: &str, values: Vec<f64>) {
        let series = MetricSeries::from_intervals(values, vec![]);
        write_series(&dir.join(name), &series).unwrap();
    }

    #[test]
    fn missing_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_corpus(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, CorpusError::NotFound(_)));
    }

    #[test]
    fn directory_without_csv_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("manifest.json"), "{}").unwrap();
        let err = load_corpus(tmp.path()).unwrap_err();
        assert!(matches!(err, CorpusError::Empty(_)));
    }

    #[test]
    fn files_load_in_lexicographic_order_and_skip_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "m_010.csv", vec![10.0]);
        write(tmp.path(), "m_002.csv", vec![2.0]);
        write(tmp.path(), "m_001.csv", vec![1.0]);
        std::fs::write(tmp.path().join("manifest.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "x").unwrap();

        let corpus = load_corpus(tmp.path()).unwrap();
        let names: Vec<&str> = corpus.series.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, vec!["m_001", "m_002", "m_010"]);
        assert_eq!(corpus.series[2].values, vec![10.0]);
    }
}

use std::path::Path;

use serde::Deserialize;

use metricbench_core::MetricSeries;

use super::CorpusError;

/// Name of the build description written next to generated series.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Row shape accepted on read. Extra columns are ignored and the label
/// column may be written as an integer or a float (`1` or `1.0`).
#[derive(Debug, Deserialize)]
struct RawRow {
    value: f64,
    is_anomaly: f64,
}

/// Write a series as `timestamp,value,is_anomaly` with 1-based timestamps.
pub fn write_series(path: &Path, series: &MetricSeries) -> Result<(), CorpusError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| CorpusError::csv(path, e))?;
    for point in series.points() {
        writer
            .serialize(point)
            .map_err(|e| CorpusError::csv(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the value and label columns of one series file.
pub fn read_series(path: &Path) -> Result<(Vec<f64>, Vec<u8>), CorpusError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| CorpusError::csv(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| CorpusError::csv(path, e))?
        .clone();
    for required in ["value", "is_anomaly"] {
        if !headers.iter().any(|h| h.trim() == required) {
            return Err(CorpusError::Malformed {
                path: path.to_path_buf(),
                reason: format!("missing column '{required}'"),
            });
        }
    }

    let mut values = Vec::new();
    let mut labels = Vec::new();
    for row in reader.deserialize::<RawRow>() {
        let row = row.map_err(|e| CorpusError::csv(path, e))?;
        if !row.value.is_finite() {
            return Err(CorpusError::Malformed {
                path: path.to_path_buf(),
                reason: format!("non-finite value at row {}", values.len() + 1),
            });
        }
        values.push(row.value);
        labels.push(u8::from(row.is_anomaly != 0.0));
    }
    Ok((values, labels))
}

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use metricbench_core::{AggregateResult, EvaluationRecord, Outcome};

use super::aggregate::aggregate;
use super::EvalError;

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    metric_name: &'a str,
    precision: f64,
    recall: f64,
    f1: f64,
}

/// Per-run summary persisted as `{dataset}_summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub dataset: String,
    pub detector: String,
    pub series_count: usize,
    pub failed_count: usize,
    pub overridden_count: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub evaluated_at: DateTime<Utc>,
}

/// Where a run's reports were written, and the aggregate they hold.
#[derive(Debug, Clone)]
pub struct Report {
    pub results_path: PathBuf,
    pub summary_path: PathBuf,
    pub aggregate: AggregateResult,
    pub summary: RunSummary,
}

/// Write `metric_name,precision,recall,f1` rows in record order.
pub fn write_results_csv(path: &Path, records: &[EvaluationRecord]) -> Result<(), EvalError> {
    let csv_err = |source| EvalError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for record in records {
        writer
            .serialize(ResultRow {
                metric_name: &record.metric_name,
                precision: record.precision,
                recall: record.recall,
                f1: record.f1,
            })
            .map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}

/// Human-readable dataset label: `response_time` → `Response Time`.
pub fn dataset_label(dataset: &str) -> String {
    dataset
        .split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The printed block of corpus-level means, three decimals each.
pub fn format_summary(dataset: &str, result: &AggregateResult) -> String {
    let rule = "=".repeat(50);
    format!(
        "{rule}\nAverage Metrics for All {} Data:\n{}\nAverage Precision: {:.3}\nAverage Recall: {:.3}\nAverage F1-Score: {:.3}\n{rule}",
        dataset_label(dataset),
        "-".repeat(50),
        result.precision,
        result.recall,
        result.f1,
    )
}

/// Persist results CSV and summary JSON under `res_dir`.
///
/// Returns `Ok(None)` when there are no records to report.
pub fn write_report(
    res_dir: &Path,
    dataset: &str,
    detector: &str,
    records: &[EvaluationRecord],
) -> Result<Option<Report>, EvalError> {
    let Some(result) = aggregate(records) else {
        return Ok(None);
    };
    std::fs::create_dir_all(res_dir)?;

    let results_path = res_dir.join(format!("{dataset}_results.csv"));
    write_results_csv(&results_path, records)?;

    let summary = RunSummary {
        dataset: dataset.to_string(),
        detector: detector.to_string(),
        series_count: result.series_count,
        failed_count: result.failed_count,
        overridden_count: records
            .iter()
            .filter(|r| r.outcome == Outcome::Overridden)
            .count(),
        precision: result.precision,
        recall: result.recall,
        f1: result.f1,
        evaluated_at: Utc::now(),
    };
    let summary_path = res_dir.join(format!("{dataset}_summary.json"));
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;

    info!(
        dataset,
        precision = format_args!("{:.3}", result.precision),
        recall = format_args!("{:.3}", result.recall),
        f1 = format_args!("{:.3}", result.f1),
        results = %results_path.display(),
        "report written"
    );

    Ok(Some(Report {
        results_path,
        summary_path,
        aggregate: result,
        summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<EvaluationRecord> {
        vec![
            EvaluationRecord::scored("response_time_001", 1.0, 0.5, 2.0 / 3.0),
            EvaluationRecord::failed("response_time_002"),
            EvaluationRecord::perfect("response_time_003"),
        ]
    }

    #[test]
    fn labels_read_naturally() {
        assert_eq!(dataset_label("response_time"), "Response Time");
        assert_eq!(dataset_label("yahoo"), "Yahoo");
    }

    #[test]
    fn summary_block_uses_three_decimals() {
        let agg = aggregate(&records()).unwrap();
        let text = format_summary("response_time", &agg);

        assert!(text.contains("Average Metrics for All Response Time Data:"));
        assert!(text.contains("Average Precision: 0.667"));
        assert!(text.contains("Average Recall: 0.500"));
        assert!(text.contains("Average F1-Score: 0.556"));
    }

    #[test]
    fn report_files_are_written() {
        let tmp = tempfile::tempdir().unwrap();
        let report = write_report(tmp.path(), "response_time", "baseline", &records())
            .unwrap()
            .unwrap();

        let csv = std::fs::read_to_string(&report.results_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "metric_name,precision,recall,f1");
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("response_time_002,0.0,0.0,0.0"));

        let json = std::fs::read_to_string(&report.summary_path).unwrap();
        let summary: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(summary.series_count, 3);
        assert_eq!(summary.failed_count, 1);
        assert_eq!(summary.overridden_count, 1);
    }

    #[test]
    fn no_records_no_report() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(write_report(tmp.path(), "x", "baseline", &[]).unwrap().is_none());
    }
}

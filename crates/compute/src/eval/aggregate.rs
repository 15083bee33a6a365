use metricbench_core::{AggregateResult, EvaluationRecord};

/// Field-wise arithmetic mean over all records; `None` when there are none.
///
/// Failed series carry zero scores and are included in the means.
pub fn aggregate(records: &[EvaluationRecord]) -> Option<AggregateResult> {
    if records.is_empty() {
        return None;
    }
    let n = records.len() as f64;
    let (p, r, f) = records.iter().fold((0.0, 0.0, 0.0), |(p, r, f), rec| {
        (p + rec.precision, r + rec.recall, f + rec.f1)
    });

    Some(AggregateResult {
        precision: p / n,
        recall: r / n,
        f1: f / n,
        series_count: records.len(),
        failed_count: records.iter().filter(|r| r.is_failed()).count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_aggregate() {
        assert!(aggregate(&[]).is_none());
    }

    #[test]
    fn perfect_and_zero_average_to_half() {
        let records = vec![
            EvaluationRecord::scored("a", 1.0, 1.0, 1.0),
            EvaluationRecord::scored("b", 0.0, 0.0, 0.0),
        ];
        let agg = aggregate(&records).unwrap();
        assert_eq!((agg.precision, agg.recall, agg.f1), (0.5, 0.5, 0.5));
        assert_eq!(agg.series_count, 2);
        assert_eq!(agg.failed_count, 0);
    }

    #[test]
    fn failed_records_count_as_zero() {
        let records = vec![
            EvaluationRecord::scored("a", 0.9, 0.6, 0.72),
            EvaluationRecord::failed("b"),
            EvaluationRecord::perfect("c"),
        ];
        let agg = aggregate(&records).unwrap();
        assert!((agg.precision - (0.9 + 0.0 + 1.0) / 3.0).abs() < 1e-12);
        assert!((agg.recall - (0.6 + 0.0 + 1.0) / 3.0).abs() < 1e-12);
        assert_eq!(agg.failed_count, 1);
    }
}

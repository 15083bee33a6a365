//! Point-wise detection scores.

use crate::detector::DetectionScores;

/// Precision, recall and F1 of `predicted` against `labels`.
///
/// Both slices are compared up to the shorter length. Any ratio with a
/// zero denominator is 0.
pub fn point_scores(predicted: &[bool], labels: &[u8]) -> DetectionScores {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;

    for (&pred, &label) in predicted.iter().zip(labels) {
        match (pred, label != 0) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => {}
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    DetectionScores::new(precision, recall, f1)
}

/// Point-adjusted predictions: a labeled anomaly segment counts as fully
/// detected when any of its points is predicted.
pub fn point_adjust(predicted: &[bool], labels: &[u8]) -> Vec<bool> {
    let len = predicted.len().min(labels.len());
    let mut adjusted = predicted[..len].to_vec();

    let mut t = 0;
    while t < len {
        if labels[t] == 0 {
            t += 1;
            continue;
        }
        let start = t;
        while t < len && labels[t] != 0 {
            t += 1;
        }
        if adjusted[start..t].iter().any(|&p| p) {
            adjusted[start..t].iter_mut().for_each(|p| *p = true);
        }
    }
    adjusted
}

//! ROC analysis for picking the decision threshold.

use std::cmp::Ordering;

/// Points of a ROC curve, one per distinct score plus the `(0, 0)` origin.
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Score threshold at each point; a sample is called positive if its score is `>=`.
    /// The first threshold is `+inf`.
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Compute the ROC curve of `scores` against `labels` (`true` is positive).
    ///
    /// Samples with equal scores are merged into a single point.  Returns `None` if
    /// either class is empty or the inputs differ in length.
    pub fn new(labels: &[bool], scores: &[f64]) -> Option<Self> {
        if labels.len() != scores.len() {
            return None;
        }
        let positives = labels.iter().filter(|l| **l).count();
        let negatives = labels.len() - positives;
        if positives == 0 || negatives == 0 {
            return None;
        }

        let mut paired = scores
            .iter()
            .copied()
            .zip(labels.iter().copied())
            .collect::<Vec<_>>();
        paired.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let mut fpr = vec![0.0];
        let mut tpr = vec![0.0];
        let mut thresholds = vec![f64::INFINITY];
        let (mut tp, mut fp) = (0usize, 0usize);
        for (i, (score, is_positive)) in paired.iter().enumerate() {
            if *is_positive {
                tp += 1;
            } else {
                fp += 1;
            }
            // Emit a point only at the last sample of a run of equal scores.
            let last_of_run = paired
                .get(i + 1)
                .map(|(next, _)| next != score)
                .unwrap_or(true);
            if last_of_run {
                tpr.push(tp as f64 / positives as f64);
                fpr.push(fp as f64 / negatives as f64);
                thresholds.push(*score);
            }
        }

        Some(Self {
            fpr,
            tpr,
            thresholds,
        })
    }

    /// Index of the first point maximizing Youden's J statistic `TPR - FPR`.
    pub fn youden_index(&self) -> usize {
        let mut best = 0;
        let mut best_j = f64::NEG_INFINITY;
        for (i, (tpr, fpr)) in self.tpr.iter().zip(self.fpr.iter()).enumerate() {
            let j = tpr - fpr;
            if j > best_j {
                best = i;
                best_j = j;
            }
        }
        best
    }

    /// Area under the curve by the trapezoidal rule.
    pub fn auc(&self) -> f64 {
        self.fpr
            .windows(2)
            .zip(self.tpr.windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[1] + y[0]) / 2.0)
            .sum()
    }
}

/// Sample standard deviation (`n - 1` in the denominator); `None` for fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Median of the values; `None` if empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

//! Held-out evaluation metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Scores for one candidate on the test partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Candidate name
    pub candidate: String,
    pub accuracy: f64,
    pub f1: f64,
    /// Area under the ROC curve, computed from probabilities
    pub auc: f64,
    /// Training time in seconds
    pub training_time_secs: f64,
    /// Rows used for fitting
    pub n_train: usize,
    /// Rows used for scoring
    pub n_test: usize,
}

impl EvaluationResult {
    /// Score `proba` against `y_true`, thresholding at `threshold` for the
    /// label-based metrics
    pub fn compute(
        candidate: &str,
        y_true: &Array1<f64>,
        proba: &Array1<f64>,
        threshold: f64,
        n_train: usize,
        training_time_secs: f64,
    ) -> Self {
        let y_pred = proba.mapv(|p| if p >= threshold { 1.0 } else { 0.0 });
        Self {
            candidate: candidate.to_string(),
            accuracy: accuracy(y_true, &y_pred),
            f1: f1_score(y_true, &y_pred),
            auc: roc_auc(y_true, proba),
            training_time_secs,
            n_train,
            n_test: y_true.len(),
        }
    }
}

/// Fraction of matching labels
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

/// F1 of the positive class; 0 when there are no true or predicted positives
pub fn f1_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        match (t >= 0.5, p >= 0.5) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    let denom = 2 * tp + fp + fn_;
    if denom == 0 {
        0.0
    } else {
        2.0 * tp as f64 / denom as f64
    }
}

/// ROC AUC via the rank-sum statistic, averaging ranks over tied scores.
/// Returns 0.5 when only one class is present.
pub fn roc_auc(y_true: &Array1<f64>, scores: &Array1<f64>) -> f64 {
    let n = y_true.len();
    let n_pos = y_true.iter().filter(|&&t| t >= 0.5).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start;
        while end + 1 < n && scores[order[end + 1]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; a tied run shares the mean of its ranks
        let avg_rank = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            if y_true[idx] >= 0.5 {
                rank_sum_pos += avg_rank;
            }
        }
        start = end + 1;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    (rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg)
}

//! Classifier evaluation: confusion counts at a decision threshold,
//! ROC curve, trapezoidal AUC, and first-layer feature importance.

use crate::nn::Mlp;

/// Raw confusion-matrix counts at one threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fnegative: usize,
}

impl ConfusionCounts {
    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fnegative
    }
}

/// Derived metrics; zero-division cases resolve to 0 rather than NaN
#[derive(Debug, Clone, Copy)]
pub struct Evaluation {
    pub counts: ConfusionCounts,
    pub threshold: f32,
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

/// Accumulate counts with `predicted = prob >= threshold`.
pub fn confusion_matrix(labels: &[f32], probabilities: &[f32], threshold: f32) -> Evaluation {
    let mut counts = ConfusionCounts {
        tp: 0,
        tn: 0,
        fp: 0,
        fnegative: 0,
    };
    for (&label, &prob) in labels.iter().zip(probabilities.iter()) {
        let predicted = prob >= threshold;
        let actual = label >= 0.5;
        match (predicted, actual) {
            (true, true) => counts.tp += 1,
            (true, false) => counts.fp += 1,
            (false, true) => counts.fnegative += 1,
            (false, false) => counts.tn += 1,
        }
    }

    let total = counts.total();
    let accuracy = if total == 0 {
        0.0
    } else {
        (counts.tp + counts.tn) as f32 / total as f32
    };
    let precision = if counts.tp + counts.fp == 0 {
        0.0
    } else {
        counts.tp as f32 / (counts.tp + counts.fp) as f32
    };
    let recall = if counts.tp + counts.fnegative == 0 {
        0.0
    } else {
        counts.tp as f32 / (counts.tp + counts.fnegative) as f32
    };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    Evaluation {
        counts,
        threshold,
        accuracy,
        precision,
        recall,
        f1,
    }
}

/// (false positive rate, true positive rate) at 101 evenly spaced
/// thresholds in [0, 1] inclusive
pub fn roc_curve(labels: &[f32], probabilities: &[f32]) -> Vec<(f32, f32)> {
    let positives = labels.iter().filter(|&&l| l >= 0.5).count();
    let negatives = labels.len() - positives;

    (0..=100)
        .map(|i| {
            let threshold = i as f32 / 100.0;
            let eval = confusion_matrix(labels, probabilities, threshold);
            let fpr = if negatives == 0 {
                0.0
            } else {
                eval.counts.fp as f32 / negatives as f32
            };
            let tpr = if positives == 0 {
                0.0
            } else {
                eval.counts.tp as f32 / positives as f32
            };
            (fpr, tpr)
        })
        .collect()
}

/// Trapezoidal ROC-AUC over a descending-probability sweep.
///
/// Degenerate inputs (no positives or no negatives) return 0.
pub fn auc(labels: &[f32], probabilities: &[f32]) -> f32 {
    let positives = labels.iter().filter(|&&l| l >= 0.5).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.0;
    }

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| {
        probabilities[b]
            .partial_cmp(&probabilities[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut prev_tpr = 0.0f32;
    let mut prev_fpr = 0.0f32;
    let mut area = 0.0f32;

    for i in order {
        if labels[i] >= 0.5 {
            tp += 1;
        } else {
            fp += 1;
        }
        let tpr = tp as f32 / positives as f32;
        let fpr = fp as f32 / negatives as f32;
        area += (fpr - prev_fpr) * (tpr + prev_tpr) / 2.0;
        prev_tpr = tpr;
        prev_fpr = fpr;
    }
    area
}

/// Mean absolute first-layer weight per input feature, paired with the
/// feature's human name. A rough sensitivity ranking, not an attribution.
pub fn feature_importance<'a>(model: &Mlp, names: &[&'a str]) -> Vec<(&'a str, f32)> {
    let first = &model.layers()[0];
    let weights = first.weight().data();
    let in_dim = first.spec().in_dim;
    let out_dim = first.spec().out_dim;

    let mut scores: Vec<(&str, f32)> = names
        .iter()
        .enumerate()
        .take(in_dim)
        .map(|(p, &name)| {
            let total: f32 = (0..out_dim).map(|i| weights[i * in_dim + p].abs()).sum();
            (name, total / out_dim as f32)
        })
        .collect();
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const PROBS: [f32; 10] = [0.9, 0.8, 0.7, 0.4, 0.3, 0.2, 0.6, 0.55, 0.1, 0.95];
    const LABELS: [f32; 10] = [1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0];

    #[test]
    fn fixed_scenario_counts() {
        // Six positives; one positive scored 0.2 and one negative 0.95.
        let eval = confusion_matrix(&LABELS, &PROBS, 0.5);
        assert_eq!(eval.counts.tp, 5);
        assert_eq!(eval.counts.fnegative, 1);
        assert_eq!(eval.counts.tn, 3);
        assert_eq!(eval.counts.fp, 1);
        assert_relative_eq!(eval.accuracy, 0.8);
    }

    #[test]
    fn derived_metrics_from_fixed_scenario() {
        let eval = confusion_matrix(&LABELS, &PROBS, 0.5);
        assert_relative_eq!(eval.precision, 5.0 / 6.0);
        assert_relative_eq!(eval.recall, 5.0 / 6.0);
        assert_relative_eq!(eval.f1, 5.0 / 6.0);
    }

    #[test]
    fn zero_denominators_fall_back_to_zero() {
        // Threshold above every probability: no positive predictions.
        let eval = confusion_matrix(&[1.0, 0.0], &[0.3, 0.2], 0.9);
        assert_relative_eq!(eval.precision, 0.0);
        assert_relative_eq!(eval.f1, 0.0);
        // No actual positives at all.
        let eval = confusion_matrix(&[0.0, 0.0], &[0.9, 0.8], 0.5);
        assert_relative_eq!(eval.recall, 0.0);
    }

    #[test]
    fn roc_curve_has_101_points_and_spans_the_square() {
        let curve = roc_curve(&LABELS, &PROBS);
        assert_eq!(curve.len(), 101);
        // Threshold 0 predicts everything positive.
        assert_eq!(curve[0], (1.0, 1.0));
        // Threshold 1 only keeps probs >= 1.0, none here.
        assert_eq!(curve[100], (0.0, 0.0));
    }

    #[test]
    fn auc_is_one_for_perfect_separation() {
        let labels = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let probs = [0.9, 0.8, 0.7, 0.3, 0.2, 0.1];
        assert_relative_eq!(auc(&labels, &probs), 1.0);
    }

    #[test]
    fn auc_is_half_for_balanced_mixed_ranks() {
        // Positives sit at ranks 1, 4, 5, 8: exactly half of all
        // positive/negative pairs are ordered correctly.
        let labels = [1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0];
        let probs = [0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2, 0.1];
        let value = auc(&labels, &probs);
        assert!((value - 0.5).abs() < 0.05, "auc {value}");
    }

    #[test]
    fn auc_degenerate_classes_return_zero() {
        assert_relative_eq!(auc(&[1.0, 1.0], &[0.9, 0.1]), 0.0);
        assert_relative_eq!(auc(&[0.0, 0.0], &[0.9, 0.1]), 0.0);
    }

    proptest! {
        #[test]
        fn auc_invariant_under_monotone_rescaling(
            probs in proptest::collection::vec(0.0f32..1.0, 12)
        ) {
            let labels: Vec<f32> = (0..12).map(|i| (i % 2) as f32).collect();
            let scaled: Vec<f32> = probs.iter().map(|p| 0.5 * p).collect();
            let a = auc(&labels, &probs);
            let b = auc(&labels, &scaled);
            prop_assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
    }
}

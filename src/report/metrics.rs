//! Classification metrics on the held-out partition

use serde::Serialize;

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true rows of this class
    pub support: usize,
}

/// Averaged precision/recall/F1
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Full evaluation of a set of predictions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// `confusion[true][predicted]`
    pub confusion: Vec<Vec<usize>>,
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
    pub total: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Compare predicted class indices against the true ones.
///
/// `classes` names every class index; indices outside it are ignored.
/// Any zero denominator yields 0.0 rather than NaN.
pub fn evaluate(y_true: &[u32], y_pred: &[u32], classes: &[String]) -> ClassificationReport {
    let k = classes.len();
    let mut confusion = vec![vec![0usize; k]; k];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        let (t, p) = (t as usize, p as usize);
        if t < k && p < k {
            confusion[t][p] += 1;
        }
    }

    let total: usize = confusion.iter().flatten().sum();
    let correct: usize = (0..k).map(|i| confusion[i][i]).sum();

    let per_class: Vec<ClassMetrics> = classes
        .iter()
        .enumerate()
        .map(|(c, label)| {
            let tp = confusion[c][c];
            let predicted: usize = (0..k).map(|r| confusion[r][c]).sum();
            let support: usize = confusion[c].iter().sum();
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                label: label.clone(),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    let macro_avg = average(&per_class, |_| 1.0);
    let weighted_avg = average(&per_class, |m| m.support as f64);

    ClassificationReport {
        confusion,
        per_class,
        accuracy: ratio(correct, total),
        macro_avg,
        weighted_avg,
        total,
    }
}

fn average(per_class: &[ClassMetrics], weight: impl Fn(&ClassMetrics) -> f64) -> AveragedMetrics {
    let total_weight: f64 = per_class.iter().map(&weight).sum();
    if total_weight == 0.0 {
        return AveragedMetrics {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
        };
    }
    let mean = |f: fn(&ClassMetrics) -> f64| {
        per_class.iter().map(|m| weight(m) * f(m)).sum::<f64>() / total_weight
    };
    AveragedMetrics {
        precision: mean(|m| m.precision),
        recall: mean(|m| m.recall),
        f1: mean(|m| m.f1),
    }
}

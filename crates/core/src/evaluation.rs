//! Binary classification metrics with spam as the positive class.

use crate::dataset::Label;
use crate::error::{Result, SpamError};
use serde::{Deserialize, Serialize};

/// Confusion counts, spam = positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    /// Tallies `(truth, prediction)` pairs.
    pub fn from_pairs(y_true: &[Label], y_pred: &[Label]) -> Self {
        let mut m = Self::default();
        for (t, p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (Label::Ham, Label::Ham) => m.tn += 1,
                (Label::Ham, Label::Spam) => m.fp += 1,
                (Label::Spam, Label::Ham) => m.fn_ += 1,
                (Label::Spam, Label::Spam) => m.tp += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }
}

/// Held-out metrics. A ratio with a zero denominator is reported as 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
}

/// Compute metrics for a held-out set.
pub fn evaluate(y_true: &[Label], y_pred: &[Label]) -> Result<Evaluation> {
    if y_true.len() != y_pred.len() {
        return Err(SpamError::Evaluation(format!(
            "{} labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(SpamError::Evaluation("no samples to evaluate".into()));
    }

    let confusion = ConfusionMatrix::from_pairs(y_true, y_pred);
    let accuracy = ratio(confusion.tp + confusion.tn, confusion.total());
    let precision = ratio(confusion.tp, confusion.tp + confusion.fp);
    let recall = ratio(confusion.tp, confusion.tp + confusion.fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(Evaluation {
        accuracy,
        precision,
        recall,
        f1,
        confusion,
    })
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Label::{Ham, Spam};

    #[test]
    fn test_metrics() {
        let truth = [Spam, Spam, Spam, Ham, Ham, Ham, Ham, Ham];
        let pred = [Spam, Spam, Ham, Spam, Ham, Ham, Ham, Ham];
        let e = evaluate(&truth, &pred).unwrap();
        assert_eq!(
            e.confusion,
            ConfusionMatrix {
                tn: 4,
                fp: 1,
                fn_: 1,
                tp: 2
            }
        );
        assert!((e.accuracy - 0.75).abs() < 1e-12);
        assert!((e.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((e.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((e.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_is_zero() {
        let e = evaluate(&[Ham, Ham], &[Ham, Ham]).unwrap();
        assert_eq!(e.accuracy, 1.0);
        assert_eq!(e.precision, 0.0);
        assert_eq!(e.recall, 0.0);
        assert_eq!(e.f1, 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(evaluate(&[Ham], &[]).is_err());
        assert!(evaluate(&[], &[]).is_err());
    }

    #[test]
    fn test_confusion_serializes_fn_key() {
        let json = serde_json::to_value(ConfusionMatrix::default()).unwrap();
        assert!(json.get("fn").is_some());
    }
}

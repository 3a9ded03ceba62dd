//! Binary classification over TF-IDF feature vectors.
//!
//! [`LogisticRegression`] holds hyper-parameters and fits a
//! [`LogisticModel`] with [`lbfgs::Lbfgs`]. The fitted model is immutable.

/// Limited-memory BFGS minimizer.
pub mod lbfgs;
/// Class-balanced, L2-regularized logistic regression.
pub mod logistic;

pub use logistic::{ClassWeight, LogisticModel, LogisticRegression};

use crate::dataset::Label;
use serde::{Deserialize, Serialize};

/// Probability pair for one message. `ham + spam == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    /// Probability of class 0.
    pub ham: f64,
    /// Probability of class 1.
    pub spam: f64,
}

impl ClassProbabilities {
    /// Builds the pair from the spam probability.
    pub fn from_spam(spam: f64) -> Self {
        Self {
            ham: 1.0 - spam,
            spam,
        }
    }

    /// The class with the higher probability; an exact tie is ham.
    pub fn predicted(&self) -> Label {
        if self.spam > self.ham {
            Label::Spam
        } else {
            Label::Ham
        }
    }

    /// Probability of the predicted class.
    pub fn confidence(&self) -> f64 {
        match self.predicted() {
            Label::Spam => self.spam,
            Label::Ham => self.ham,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_resolves_to_ham() {
        let p = ClassProbabilities::from_spam(0.5);
        assert_eq!(p.predicted(), Label::Ham);
        assert_eq!(p.confidence(), 0.5);
    }

    #[test]
    fn test_confidence_is_predicted_class_probability() {
        let spam = ClassProbabilities::from_spam(0.9);
        assert_eq!(spam.predicted(), Label::Spam);
        assert_eq!(spam.confidence(), 0.9);

        let ham = ClassProbabilities::from_spam(0.2);
        assert_eq!(ham.predicted(), Label::Ham);
        assert!((ham.confidence() - 0.8).abs() < 1e-12);
        assert!((ham.ham + ham.spam - 1.0).abs() < 1e-12);
    }
}

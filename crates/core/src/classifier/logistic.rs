//! Logistic regression with balanced class weights.
//!
//! Minimizes the sample-weighted mean log-loss plus an L2 penalty
//! `‖w‖² / (2 · C · Σ sw)` on the weights (the intercept is not penalized).
//! Parameters start at zero and are fitted by L-BFGS, so training is
//! deterministic for identical inputs.

use crate::classifier::lbfgs::{ConvergenceStatus, Lbfgs};
use crate::classifier::ClassProbabilities;
use crate::config;
use crate::dataset::Label;
use crate::error::{Result, SpamError};
use crate::vectorize::SparseVector;
use serde::{Deserialize, Serialize};

/// Per-class sample weighting applied during fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every sample weighs 1.
    Uniform,
    /// `n_samples / (2 · n_class)`, compensating for class imbalance.
    Balanced,
}

/// Logistic regression hyper-parameters.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    c: f64,
    max_iter: usize,
    tol: f64,
    history: usize,
    class_weight: ClassWeight,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: config::INVERSE_REGULARIZATION,
            max_iter: config::MAX_ITER,
            tol: config::TOLERANCE,
            history: config::LBFGS_HISTORY,
            class_weight: ClassWeight::Balanced,
        }
    }
}

impl LogisticRegression {
    /// Creates a classifier with balanced class weights and the default hyper-parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inverse regularization strength `C`.
    #[must_use]
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Sets the iteration cap.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the gradient tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Sets the class weighting.
    #[must_use]
    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    /// Fits the model on feature rows `x` with labels `y`.
    pub fn fit(&self, x: &[SparseVector], y: &[Label]) -> Result<LogisticModel> {
        if x.is_empty() {
            return Err(SpamError::training("cannot fit on zero samples"));
        }
        if x.len() != y.len() {
            return Err(SpamError::training(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(SpamError::training(format!("C must be > 0, got {}", self.c)));
        }
        let n_features = x[0].dim();
        if let Some(row) = x.iter().find(|r| r.dim() != n_features) {
            return Err(SpamError::training(format!(
                "feature row has {} features, expected {}",
                row.dim(),
                n_features
            )));
        }

        let n_spam = y.iter().filter(|l| l.is_spam()).count();
        let n_ham = y.len() - n_spam;
        if n_spam == 0 || n_ham == 0 {
            return Err(SpamError::training(
                "training labels must contain both spam and ham",
            ));
        }
        let class_weights = match self.class_weight {
            ClassWeight::Uniform => [1.0, 1.0],
            ClassWeight::Balanced => {
                let n = y.len() as f64;
                [n / (2.0 * n_ham as f64), n / (2.0 * n_spam as f64)]
            }
        };

        let targets: Vec<f64> = y.iter().map(|l| l.as_class() as f64).collect();
        let sample_weights: Vec<f64> = y
            .iter()
            .map(|l| class_weights[l.as_class() as usize])
            .collect();
        let sw_sum: f64 = sample_weights.iter().sum();
        let l2 = 1.0 / (self.c * sw_sum);

        let objective = |params: &[f64], grad: &mut [f64]| -> f64 {
            let (w, b) = params.split_at(n_features);
            let b = b[0];
            grad.fill(0.0);
            let mut loss = 0.0;
            for ((row, &t), &sw) in x.iter().zip(&targets).zip(&sample_weights) {
                let z = row.dot(w) + b;
                loss += sw * (softplus(z) - t * z);
                let residual = sw * (sigmoid(z) - t);
                for (j, v) in row.iter() {
                    grad[j as usize] += residual * v;
                }
                grad[n_features] += residual;
            }
            loss /= sw_sum;
            for g in grad.iter_mut() {
                *g /= sw_sum;
            }
            let mut penalty = 0.0;
            for (g, wj) in grad[..n_features].iter_mut().zip(w) {
                *g += l2 * wj;
                penalty += wj * wj;
            }
            loss + 0.5 * l2 * penalty
        };

        let mut optimizer = Lbfgs::new(self.max_iter, self.tol, self.history);
        let result = optimizer.minimize(objective, vec![0.0; n_features + 1]);

        if result.x.iter().any(|v| !v.is_finite()) {
            return Err(SpamError::training("optimizer produced non-finite parameters"));
        }
        let converged = result.status == ConvergenceStatus::Converged;
        if converged {
            tracing::info!(
                iterations = result.iterations,
                loss = result.fun,
                "Logistic regression converged"
            );
        } else {
            tracing::warn!(
                iterations = result.iterations,
                grad_max = result.grad_max,
                status = ?result.status,
                "Logistic regression did not converge; increase max_iter"
            );
        }

        let mut weights = result.x;
        let intercept = weights.pop().unwrap_or(0.0);
        Ok(LogisticModel {
            weights,
            intercept,
            class_weights,
            iterations: result.iterations,
            converged,
        })
    }
}

/// A fitted logistic regression. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    weights: Vec<f64>,
    intercept: f64,
    /// `[ham, spam]` sample weights used at fit time.
    class_weights: [f64; 2],
    iterations: usize,
    converged: bool,
}

impl LogisticModel {
    /// Builds a model from explicit parameters (uniform class weights).
    pub fn from_parts(weights: Vec<f64>, intercept: f64) -> Self {
        Self {
            weights,
            intercept,
            class_weights: [1.0, 1.0],
            iterations: 0,
            converged: true,
        }
    }

    /// `w · x + b`.
    pub fn decision_function(&self, x: &SparseVector) -> Result<f64> {
        if x.dim() != self.weights.len() {
            return Err(SpamError::vectorizer(format!(
                "feature vector has {} features, model expects {}",
                x.dim(),
                self.weights.len()
            )));
        }
        Ok(x.dot(&self.weights) + self.intercept)
    }

    /// Class probabilities for `x`.
    pub fn predict_proba(&self, x: &SparseVector) -> Result<ClassProbabilities> {
        let z = self.decision_function(x)?;
        Ok(ClassProbabilities::from_spam(sigmoid(z)))
    }

    /// Predicted class for `x`.
    pub fn predict(&self, x: &SparseVector) -> Result<Label> {
        Ok(self.predict_proba(x)?.predicted())
    }

    /// Weight per feature index.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Bias term.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// `[ham, spam]` class weights used at fit time.
    pub fn class_weights(&self) -> [f64; 2] {
        self.class_weights
    }

    /// Optimizer iterations spent during fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the optimizer met its tolerance.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Number of features the model expects.
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Validate parameters after deserialization.
    pub fn validate(&self) -> Result<()> {
        if self.weights.is_empty() {
            return Err(SpamError::artifact("model has no weights"));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(SpamError::artifact("model has non-finite parameters"));
        }
        Ok(())
    }
}

/// Numerically stable logistic function.
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable `ln(1 + e^z)`.
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> (Vec<SparseVector>, Vec<Label>) {
        // Feature 0 signals spam, feature 1 signals ham; 2 spam vs 4 ham.
        let x = vec![
            SparseVector::from_dense(&[1.0, 0.0, 0.2]),
            SparseVector::from_dense(&[0.9, 0.1, 0.0]),
            SparseVector::from_dense(&[0.0, 1.0, 0.1]),
            SparseVector::from_dense(&[0.1, 0.9, 0.0]),
            SparseVector::from_dense(&[0.0, 1.0, 0.3]),
            SparseVector::from_dense(&[0.0, 0.8, 0.0]),
        ];
        let y = vec![
            Label::Spam,
            Label::Spam,
            Label::Ham,
            Label::Ham,
            Label::Ham,
            Label::Ham,
        ];
        (x, y)
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-15);
        assert!(softplus(1000.0).is_finite());
    }

    #[test]
    fn test_fit_separates_toy_data() {
        let (x, y) = toy();
        let model = LogisticRegression::new().fit(&x, &y).unwrap();
        assert!(model.converged());
        assert!(model.weights()[0] > 0.0);
        assert!(model.weights()[1] < 0.0);
        for (row, label) in x.iter().zip(&y) {
            assert_eq!(model.predict(row).unwrap(), *label);
        }
    }

    #[test]
    fn test_balanced_weights() {
        let (x, y) = toy();
        let model = LogisticRegression::new().fit(&x, &y).unwrap();
        let [ham, spam] = model.class_weights();
        assert!((ham - 6.0 / 8.0).abs() < 1e-12);
        assert!((spam - 6.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_is_bit_reproducible() {
        let (x, y) = toy();
        let a = LogisticRegression::new().fit(&x, &y).unwrap();
        let b = LogisticRegression::new().fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fit_requires_both_classes() {
        let (x, _) = toy();
        let y = vec![Label::Ham; x.len()];
        assert!(LogisticRegression::new().fit(&x, &y).is_err());
    }

    #[test]
    fn test_fit_rejects_length_mismatch() {
        let (x, y) = toy();
        assert!(LogisticRegression::new().fit(&x, &y[..3]).is_err());
        assert!(LogisticRegression::new().fit(&[], &[]).is_err());
    }

    #[test]
    fn test_zero_vector_uses_intercept() {
        let model = LogisticModel::from_parts(vec![2.0, -2.0], 0.0);
        let p = model.predict_proba(&SparseVector::zeros(2)).unwrap();
        assert_eq!(p.spam, 0.5);
        assert_eq!(model.predict(&SparseVector::zeros(2)).unwrap(), Label::Ham);

        let biased = LogisticModel::from_parts(vec![2.0, -2.0], 1.0);
        assert_eq!(
            biased.predict(&SparseVector::zeros(2)).unwrap(),
            Label::Spam
        );
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let model = LogisticModel::from_parts(vec![1.0, 1.0], 0.0);
        assert!(model.predict_proba(&SparseVector::zeros(3)).is_err());
    }
}

//! Limited-memory BFGS (L-BFGS) minimizer.
//!
//! Approximates the inverse Hessian from the last `m` position/gradient
//! differences (two-loop recursion) and steps along that direction with a
//! backtracking Armijo line search. Fully deterministic: the same objective and
//! starting point always produce the same iterates.

use std::collections::VecDeque;

/// Armijo sufficient-decrease constant.
const ARMIJO_C1: f64 = 1e-4;

/// Relative objective-change tolerance (`1e7 * f64::EPSILON`).
const REL_FTOL: f64 = 1e7 * f64::EPSILON;

/// How a minimization run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// Max-abs gradient, or the relative objective change, fell under tolerance.
    Converged,
    /// The iteration cap was reached first.
    MaxIterations,
    /// No step along the search direction decreased the objective.
    LineSearchFailed,
}

/// Result of a minimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Final parameters.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub fun: f64,
    /// Max-abs gradient component at `x`.
    pub grad_max: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Stopping reason.
    pub status: ConvergenceStatus,
}

/// L-BFGS configuration and correction history.
#[derive(Debug, Clone)]
pub struct Lbfgs {
    max_iter: usize,
    tol: f64,
    m: usize,
    line_search_steps: usize,
    s_history: VecDeque<Vec<f64>>,
    y_history: VecDeque<Vec<f64>>,
}

impl Lbfgs {
    /// Creates a minimizer.
    ///
    /// * `max_iter` - iteration cap
    /// * `tol` - max-abs gradient tolerance
    /// * `m` - number of correction pairs kept
    pub fn new(max_iter: usize, tol: f64, m: usize) -> Self {
        Self {
            max_iter,
            tol,
            m: m.max(1),
            line_search_steps: crate::config::LINE_SEARCH_MAX_STEPS,
            s_history: VecDeque::with_capacity(m),
            y_history: VecDeque::with_capacity(m),
        }
    }

    /// Minimizes `objective` from `x0`.
    ///
    /// `objective(x, grad)` returns `f(x)` and writes `∇f(x)` into `grad`.
    pub fn minimize<F>(&mut self, mut objective: F, x0: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64], &mut [f64]) -> f64,
    {
        self.s_history.clear();
        self.y_history.clear();

        let n = x0.len();
        let mut x = x0;
        let mut grad = vec![0.0; n];
        let mut fun = objective(&x, &mut grad);

        let mut x_new = vec![0.0; n];
        let mut grad_new = vec![0.0; n];
        let mut status = ConvergenceStatus::MaxIterations;
        let mut iterations = 0;

        while iterations < self.max_iter {
            if max_abs(&grad) <= self.tol {
                status = ConvergenceStatus::Converged;
                break;
            }

            let mut direction = self.compute_direction(&grad);
            let mut slope = dot(&grad, &direction);
            if slope >= 0.0 {
                // Not a descent direction: restart from steepest descent.
                self.s_history.clear();
                self.y_history.clear();
                direction = grad.iter().map(|g| -g).collect();
                slope = -dot(&grad, &grad);
            }

            let mut step = if self.s_history.is_empty() {
                1.0 / norm(&grad).max(1.0)
            } else {
                1.0
            };
            let mut accepted = None;
            for _ in 0..self.line_search_steps {
                for i in 0..n {
                    x_new[i] = x[i] + step * direction[i];
                }
                let candidate = objective(&x_new, &mut grad_new);
                if candidate.is_finite() && candidate <= fun + ARMIJO_C1 * step * slope {
                    accepted = Some(candidate);
                    break;
                }
                step *= 0.5;
            }
            let Some(fun_new) = accepted else {
                status = ConvergenceStatus::LineSearchFailed;
                break;
            };
            iterations += 1;

            let s: Vec<f64> = x_new.iter().zip(&x).map(|(a, b)| a - b).collect();
            let y: Vec<f64> = grad_new.iter().zip(&grad).map(|(a, b)| a - b).collect();
            if dot(&s, &y) > 1e-10 {
                if self.s_history.len() == self.m {
                    self.s_history.pop_front();
                    self.y_history.pop_front();
                }
                self.s_history.push_back(s);
                self.y_history.push_back(y);
            }

            std::mem::swap(&mut x, &mut x_new);
            std::mem::swap(&mut grad, &mut grad_new);
            let fun_old = fun;
            fun = fun_new;

            tracing::trace!(iteration = iterations, fun, "L-BFGS step");

            if (fun_old - fun).abs() <= REL_FTOL * fun_old.abs().max(fun.abs()).max(1.0) {
                status = ConvergenceStatus::Converged;
                break;
            }
        }

        let grad_max = max_abs(&grad);
        if status == ConvergenceStatus::MaxIterations && grad_max <= self.tol {
            status = ConvergenceStatus::Converged;
        }
        OptimizationResult {
            x,
            fun,
            grad_max,
            iterations,
            status,
        }
    }

    /// Two-loop recursion: returns `-H⁻¹ · grad` from the stored history.
    fn compute_direction(&self, grad: &[f64]) -> Vec<f64> {
        let mut q: Vec<f64> = grad.iter().map(|g| -g).collect();
        let k = self.s_history.len();
        if k == 0 {
            return q;
        }

        let mut alpha = vec![0.0; k];
        let mut rho = vec![0.0; k];
        for i in (0..k).rev() {
            let s = &self.s_history[i];
            let y = &self.y_history[i];
            rho[i] = 1.0 / dot(y, s);
            alpha[i] = rho[i] * dot(s, &q);
            for (qj, yj) in q.iter_mut().zip(y) {
                *qj -= alpha[i] * yj;
            }
        }

        let s_last = &self.s_history[k - 1];
        let y_last = &self.y_history[k - 1];
        let gamma = dot(s_last, y_last) / dot(y_last, y_last);
        for qj in &mut q {
            *qj *= gamma;
        }

        for i in 0..k {
            let s = &self.s_history[i];
            let y = &self.y_history[i];
            let beta = rho[i] * dot(y, &q);
            for (qj, sj) in q.iter_mut().zip(s) {
                *qj += sj * (alpha[i] - beta);
            }
        }
        q
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_converges() {
        // f(x) = (x0 - 3)^2 + 10 (x1 + 1)^2
        let f = |x: &[f64], g: &mut [f64]| {
            g[0] = 2.0 * (x[0] - 3.0);
            g[1] = 20.0 * (x[1] + 1.0);
            (x[0] - 3.0).powi(2) + 10.0 * (x[1] + 1.0).powi(2)
        };
        let result = Lbfgs::new(100, 1e-8, 5).minimize(f, vec![0.0, 0.0]);
        assert_eq!(result.status, ConvergenceStatus::Converged);
        assert!((result.x[0] - 3.0).abs() < 1e-4);
        assert!((result.x[1] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_rosenbrock_converges() {
        let f = |x: &[f64], g: &mut [f64]| {
            let (a, b) = (x[0], x[1]);
            g[0] = -2.0 * (1.0 - a) - 400.0 * a * (b - a * a);
            g[1] = 200.0 * (b - a * a);
            (1.0 - a).powi(2) + 100.0 * (b - a * a).powi(2)
        };
        let result = Lbfgs::new(1000, 1e-6, 10).minimize(f, vec![-1.2, 1.0]);
        assert!((result.x[0] - 1.0).abs() < 1e-2, "{:?}", result.x);
        assert!((result.x[1] - 1.0).abs() < 1e-2, "{:?}", result.x);
    }

    #[test]
    fn test_iteration_cap() {
        let f = |x: &[f64], g: &mut [f64]| {
            g[0] = 2.0 * (x[0] - 100.0);
            (x[0] - 100.0).powi(2)
        };
        let result = Lbfgs::new(1, 1e-12, 5).minimize(f, vec![0.0]);
        assert_eq!(result.iterations, 1);
        assert_ne!(result.status, ConvergenceStatus::LineSearchFailed);
    }

    #[test]
    fn test_deterministic() {
        let f = |x: &[f64], g: &mut [f64]| {
            g[0] = 4.0 * x[0].powi(3) - 3.0;
            g[1] = 2.0 * x[1];
            x[0].powi(4) - 3.0 * x[0] + x[1] * x[1]
        };
        let a = Lbfgs::new(200, 1e-10, 5).minimize(f, vec![2.0, 2.0]);
        let b = Lbfgs::new(200, 1e-10, 5).minimize(f, vec![2.0, 2.0]);
        assert_eq!(a.x, b.x);
        assert_eq!(a.iterations, b.iterations);
    }
}

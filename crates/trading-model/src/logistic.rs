//! Logistic regression for next-bar direction.

use nalgebra::{DMatrix, DVector};
use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;
use trading_core::error::ModelError;
use trading_core::traits::Classifier;
use trading_core::types::{FeatureVector, Label, FEATURE_COUNT};

/// Parameters = feature weights + intercept.
const DIM: usize = FEATURE_COUNT + 1;

/// Fitting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionParams {
    /// Inverse regularization strength (larger = weaker L2 penalty)
    pub c: f64,
    /// Maximum Newton iterations
    pub max_iter: usize,
    /// Stop when the largest parameter update falls below this
    pub tolerance: f64,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tolerance: 1e-8,
        }
    }
}

/// Fitted logistic regression classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Feature weights, in [`FeatureVector::NAMES`] order
    pub coefficients: Vec<f64>,
    /// Intercept term
    pub intercept: f64,
}

/// Sigmoid activation function
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
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

/// One row per sample: the features followed by a constant 1 for the
/// intercept.
fn design_matrix(x: &[FeatureVector]) -> Array2<f64> {
    let mut matrix = Array2::ones((x.len(), DIM));
    for (mut row, features) in matrix.rows_mut().into_iter().zip(x) {
        for (j, value) in features.as_array().into_iter().enumerate() {
            row[j] = value;
        }
    }
    matrix
}

/// 1 for every weight, 0 for the intercept, which is not penalised.
fn penalty_mask() -> Array1<f64> {
    let mut mask = Array1::ones(DIM);
    mask[FEATURE_COUNT] = 0.0;
    mask
}

/// Penalised negative log-likelihood: 0.5 * |w|^2 + C * sum(log loss).
fn objective(theta: &Array1<f64>, x: &Array2<f64>, y: &Array1<f64>, c: f64) -> f64 {
    let z = x.dot(theta);
    let loss: f64 = z.iter().zip(y).map(|(&zi, &yi)| softplus(zi) - yi * zi).sum();
    let penalty = 0.5 * theta.slice(s![..FEATURE_COUNT]).mapv(|w| w * w).sum();
    penalty + c * loss
}

/// Solve `hessian * step = gradient` with an LU decomposition.
fn newton_step(hessian: &Array2<f64>, gradient: &Array1<f64>) -> Option<Array1<f64>> {
    let (rows, cols) = hessian.dim();
    let h = DMatrix::from_fn(rows, cols, |i, j| hessian[[i, j]]);
    let g = DVector::from_fn(gradient.len(), |i, _| gradient[i]);
    let step = h.lu().solve(&g)?;
    step.iter()
        .all(|v| v.is_finite())
        .then(|| Array1::from_iter(step.iter().copied()))
}

impl LogisticRegressionParams {
    /// Fit a model to labelled feature rows.
    pub fn fit(&self, x: &[FeatureVector], y: &[Label]) -> Result<LogisticRegression, ModelError> {
        if x.len() != y.len() {
            return Err(ModelError::DimensionMismatch {
                expected: x.len(),
                got: y.len(),
            });
        }
        if x.is_empty() {
            return Err(ModelError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let design = design_matrix(x);
        let targets: Array1<f64> = y.iter().map(Label::as_f64).collect();
        let mask = penalty_mask();
        let ridge = Array2::from_diag(&mask);
        let c = self.c;

        let mut theta = Array1::<f64>::zeros(DIM);
        let mut current = objective(&theta, &design, &targets, c);

        for iter in 0..self.max_iter {
            let p = design.dot(&theta).mapv(sigmoid);
            let weights = p.mapv(|pi| pi * (1.0 - pi));

            let gradient = design.t().dot(&(&p - &targets)) * c + &theta * &mask;
            let weighted = &design * &weights.view().insert_axis(Axis(1));
            let hessian = weighted.t().dot(&design) * c + &ridge;

            let step = newton_step(&hessian, &gradient)
                .ok_or_else(|| ModelError::NotConverged("singular Hessian".into()))?;

            // Backtracking keeps every accepted step a descent step.
            let mut scale = 1.0;
            let mut candidate = theta.clone();
            let mut next = current;
            for _ in 0..30 {
                candidate = &theta - &(&step * scale);
                next = objective(&candidate, &design, &targets, c);
                if next <= current {
                    break;
                }
                scale *= 0.5;
            }

            let max_update = step.iter().map(|s| (s * scale).abs()).fold(0.0, f64::max);
            theta = candidate;
            current = next;

            if max_update < self.tolerance {
                debug!(iterations = iter + 1, objective = current, "Logistic regression converged");
                return Ok(LogisticRegression::from_theta(&theta));
            }
        }

        debug!(
            iterations = self.max_iter,
            objective = current,
            "Logistic regression hit the iteration cap"
        );
        Ok(LogisticRegression::from_theta(&theta))
    }
}

impl LogisticRegression {
    fn from_theta(theta: &Array1<f64>) -> Self {
        Self {
            coefficients: theta.slice(s![..FEATURE_COUNT]).to_vec(),
            intercept: theta[FEATURE_COUNT],
        }
    }

    /// Check the parameter shape (used after deserialization).
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ModelError::DimensionMismatch {
                expected: FEATURE_COUNT,
                got: self.coefficients.len(),
            });
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Corrupt("non-finite model parameters".into()));
        }
        Ok(())
    }

    /// Log-odds of an up move.
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        self.coefficients
            .iter()
            .zip(features.as_array())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }

    /// Probability of an up move.
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        sigmoid(self.decision_function(features))
    }

    /// In-sample style accuracy over labelled rows.
    pub fn score(&self, x: &[FeatureVector], y: &[Label]) -> f64 {
        if x.is_empty() {
            return 0.0;
        }
        let correct = x
            .iter()
            .zip(y)
            .filter(|(features, label)| self.predict(features) == **label)
            .count();
        correct as f64 / x.len() as f64
    }
}

impl Classifier for LogisticRegression {
    fn predict(&self, features: &FeatureVector) -> Label {
        Label::from(self.decision_function(features) > 0.0)
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

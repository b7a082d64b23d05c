//! Logistic regression classifier
//!
//! Batch gradient descent on the L2-regularised cross-entropy loss. Two
//! classes fit a single sigmoid; more classes fit one-vs-rest and predict
//! the most probable class.

use faer::Mat;
use polars::prelude::DataFrame;
use tracing::{debug, info};

use super::{check_feature_count, check_training_shapes, features_to_matrix, labels_to_vec, Model};
use crate::config::{Hyperparameters, ParamReader};
use crate::error::{PipelineError, Result};

/// Hyperparameters for [`LogisticModel`]
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticParams {
    /// Gradient step size
    pub learning_rate: f64,
    /// Maximum gradient descent iterations
    pub max_iter: usize,
    /// L2 regularization strength
    pub alpha: f64,
    /// Stop when the gradient norm falls below this value
    pub tol: f64,
    pub fit_intercept: bool,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 1000,
            alpha: 0.01,
            tol: 1e-6,
            fit_intercept: true,
        }
    }
}

impl LogisticParams {
    /// Read and validate from the raw mapping; unknown keys are rejected
    pub fn from_params(params: &Hyperparameters) -> Result<Self> {
        let defaults = Self::default();
        let mut reader = ParamReader::new("logistic", params);

        let parsed = Self {
            learning_rate: reader.float("learning_rate", defaults.learning_rate, |x| x > 0.0, "> 0")?,
            max_iter: reader.usize_at_least("max_iter", defaults.max_iter, 1)?,
            alpha: reader.float("alpha", defaults.alpha, |x| x >= 0.0, ">= 0")?,
            tol: reader.float("tol", defaults.tol, |x| x > 0.0, "> 0")?,
            fit_intercept: reader.boolean("fit_intercept", defaults.fit_intercept)?,
        };
        reader.finish()?;
        Ok(parsed)
    }
}

/// One fitted sigmoid: `p = sigmoid(x . weights + bias)`
#[derive(Debug, Clone)]
struct BinaryFit {
    weights: Mat<f64>,
    bias: f64,
}

impl BinaryFit {
    fn probabilities(&self, x: &Mat<f64>) -> Vec<f64> {
        let z = x * &self.weights;
        (0..x.nrows()).map(|i| sigmoid(z[(i, 0)] + self.bias)).collect()
    }
}

#[derive(Debug, Clone)]
enum Fitted {
    /// Training labels held a single class
    Constant(u32),
    /// `positive` when p >= 0.5, else `negative`
    Binary {
        negative: u32,
        positive: u32,
        fit: BinaryFit,
    },
    /// One classifier per class, argmax wins
    OneVsRest(Vec<(u32, BinaryFit)>),
}

/// Logistic regression wrapped in the [`Model`] capability
#[derive(Debug, Clone, Default)]
pub struct LogisticModel {
    params: LogisticParams,
    fitted: Option<(usize, Fitted)>,
}

impl LogisticModel {
    pub fn new(params: LogisticParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    pub fn params(&self) -> &LogisticParams {
        &self.params
    }

    /// Class probabilities for the positive class (binary fits only)
    pub fn predict_proba(&self, features: &DataFrame) -> Result<Vec<f64>> {
        let (n_features, fitted) = self.fitted.as_ref().ok_or(PipelineError::NotTrained)?;
        let x = features_to_matrix(features)?;
        check_feature_count(*n_features, &x)?;

        match fitted {
            Fitted::Binary { fit, .. } => Ok(fit.probabilities(&x)),
            Fitted::Constant(_) => Ok(vec![1.0; x.nrows()]),
            Fitted::OneVsRest(_) => Err(PipelineError::ShapeMismatch {
                expected: "a binary model".to_string(),
                actual: "a one-vs-rest model".to_string(),
            }),
        }
    }

    fn fit_binary(&self, x: &Mat<f64>, y: &[f64]) -> BinaryFit {
        let n = x.nrows();
        let p = x.ncols();
        let lr = self.params.learning_rate;
        let alpha = self.params.alpha;

        let mut weights = Mat::<f64>::zeros(p, 1);
        let mut bias = 0.0;
        let mut iterations = 0;

        for _ in 0..self.params.max_iter {
            iterations += 1;
            let z = x * &weights;
            let mut errors = Mat::<f64>::zeros(n, 1);
            let mut db = 0.0;
            for i in 0..n {
                let e = sigmoid(z[(i, 0)] + bias) - y[i];
                errors[(i, 0)] = e;
                db += e;
            }
            db /= n as f64;
            if !self.params.fit_intercept {
                db = 0.0;
            }

            let grad = x.transpose() * &errors;
            let mut grad_sq = db * db;
            let mut dw = vec![0.0; p];
            for j in 0..p {
                let g = grad[(j, 0)] / n as f64 + alpha * weights[(j, 0)];
                dw[j] = g;
                grad_sq += g * g;
            }

            if grad_sq.sqrt() < self.params.tol {
                break;
            }

            for (j, g) in dw.iter().enumerate() {
                weights[(j, 0)] -= lr * g;
            }
            bias -= lr * db;
        }

        debug!(iterations, bias, "logistic fit finished");
        BinaryFit { weights, bias }
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Model for LogisticModel {
    fn train(&mut self, features: &DataFrame, labels: &DataFrame) -> Result<()> {
        let x = features_to_matrix(features)?;
        let y = labels_to_vec(labels)?;
        check_training_shapes(&x, &y)?;

        let mut classes = y.clone();
        classes.sort_unstable();
        classes.dedup();

        let indicator = |class: u32| -> Vec<f64> {
            y.iter().map(|&c| if c == class { 1.0 } else { 0.0 }).collect()
        };

        let fitted = match classes.as_slice() {
            [only] => Fitted::Constant(*only),
            [negative, positive] => Fitted::Binary {
                negative: *negative,
                positive: *positive,
                fit: self.fit_binary(&x, &indicator(*positive)),
            },
            _ => Fitted::OneVsRest(
                classes
                    .iter()
                    .map(|&c| (c, self.fit_binary(&x, &indicator(c))))
                    .collect(),
            ),
        };

        info!(
            rows = x.nrows(),
            features = x.ncols(),
            classes = classes.len(),
            "trained logistic model"
        );
        self.fitted = Some((x.ncols(), fitted));
        Ok(())
    }

    fn predict(&self, features: &DataFrame) -> Result<Vec<u32>> {
        let (n_features, fitted) = self.fitted.as_ref().ok_or(PipelineError::NotTrained)?;
        let x = features_to_matrix(features)?;
        check_feature_count(*n_features, &x)?;

        let predictions = match fitted {
            Fitted::Constant(class) => vec![*class; x.nrows()],
            Fitted::Binary {
                negative,
                positive,
                fit,
            } => fit
                .probabilities(&x)
                .into_iter()
                .map(|p| if p >= 0.5 { *positive } else { *negative })
                .collect(),
            Fitted::OneVsRest(fits) => {
                let probs: Vec<Vec<f64>> = fits.iter().map(|(_, f)| f.probabilities(&x)).collect();
                (0..x.nrows())
                    .map(|row| {
                        let mut best = 0;
                        for k in 1..fits.len() {
                            if probs[k][row] > probs[best][row] {
                                best = k;
                            }
                        }
                        fits[best].0
                    })
                    .collect()
            }
        };

        Ok(predictions)
    }

    fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    fn describe(&self) -> String {
        format!(
            "logistic(learning_rate={}, max_iter={}, alpha={}, tol={}, fit_intercept={})",
            self.params.learning_rate,
            self.params.max_iter,
            self.params.alpha,
            self.params.tol,
            self.params.fit_intercept
        )
    }
}

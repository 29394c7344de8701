//! Logistic regression fitted by batch gradient descent

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Hyperparameters for [`LogisticRegression`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticRegressionConfig {
    /// Maximum gradient steps
    pub max_iter: usize,
    /// Step size
    pub learning_rate: f64,
    /// L2 penalty
    pub alpha: f64,
    /// Stop once the gradient norm falls below this
    pub tol: f64,
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            learning_rate: 0.1,
            alpha: 0.01,
            tol: 1e-6,
        }
    }
}

impl LogisticRegressionConfig {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(PipelineError::invalid_parameter(
                "max_iter",
                self.max_iter,
                "must be at least 1",
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(PipelineError::invalid_parameter(
                "learning_rate",
                self.learning_rate,
                "must be positive",
            ));
        }
        if self.alpha < 0.0 {
            return Err(PipelineError::invalid_parameter(
                "alpha",
                self.alpha,
                "must not be negative",
            ));
        }
        Ok(())
    }
}

/// Binary logistic regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    config: LogisticRegressionConfig,
    /// Fitted coefficients
    coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    intercept: f64,
    /// Iterations run by the last fit
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticRegressionConfig::default())
    }
}

impl LogisticRegression {
    pub fn new(config: LogisticRegressionConfig) -> Self {
        Self {
            config,
            coefficients: None,
            intercept: 0.0,
            n_iter: 0,
        }
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.config.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PipelineError::TrainingError(
                "cannot fit logistic regression on zero samples".to_string(),
            ));
        }

        let mut weights: Array1<f64> = Array1::zeros(n_features);
        let mut bias = 0.0;
        let lr = self.config.learning_rate;
        let alpha = self.config.alpha;

        self.n_iter = 0;
        for _ in 0..self.config.max_iter {
            self.n_iter += 1;
            let predictions = Self::sigmoid(&(x.dot(&weights) + bias));

            let errors = &predictions - y;
            let dw = (x.t().dot(&errors) / n_samples as f64) + (alpha * &weights);
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.config.tol {
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        self.coefficients = Some(weights);
        self.intercept = bias;
        Ok(self)
    }

    /// Probability of the positive class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(PipelineError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(Self::sigmoid(&(x.dot(coefficients) + self.intercept)))
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }
}

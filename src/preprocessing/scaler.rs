//! Feature scaling for numeric columns

use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// No scaling
    None,
}

impl Default for ScalerType {
    fn default() -> Self {
        ScalerType::Standard
    }
}

/// Parameters for one fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // mean or min
    scale: f64,  // std or range
}

/// Feature scaler fitted column by column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Vec<ScalerParams>,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: Vec::new(),
        }
    }

    /// Fit one set of parameters per column of complete values
    pub fn fit(mut self, columns: &[Vec<f64>]) -> Self {
        self.params = columns.iter().map(|v| self.compute_params(v)).collect();
        self
    }

    pub fn scaler_type(&self) -> ScalerType {
        self.scaler_type
    }

    /// Fitted (center, scale) of column `idx`
    pub fn params(&self, idx: usize) -> Option<(f64, f64)> {
        self.params.get(idx).map(|p| (p.center, p.scale))
    }

    pub fn scale(&self, idx: usize, value: f64) -> f64 {
        match self.params.get(idx) {
            Some(p) => (value - p.center) / p.scale,
            None => value,
        }
    }

    fn compute_params(&self, values: &[f64]) -> ScalerParams {
        if values.is_empty() {
            return ScalerParams { center: 0.0, scale: 1.0 };
        }
        match self.scaler_type {
            ScalerType::Standard => {
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                // population standard deviation
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                }
            }
            ScalerType::MinMax => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let range = max - min;
                ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                }
            }
            ScalerType::None => ScalerParams { center: 0.0, scale: 1.0 },
        }
    }
}

//! Training configuration

use super::gradient_boosting::GradientBoostingConfig;
use super::linear_models::LogisticRegressionConfig;
use super::random_forest::RandomForestConfig;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The candidate classifiers the trainer can compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateKind {
    LogisticRegression,
    RandomForest,
    GradientBoosting,
}

impl CandidateKind {
    pub fn name(&self) -> &'static str {
        match self {
            CandidateKind::LogisticRegression => "logistic_regression",
            CandidateKind::RandomForest => "random_forest",
            CandidateKind::GradientBoosting => "gradient_boosting",
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for model training and selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the split and for any candidate without its own seed
    pub random_seed: u64,
    /// Fit candidates on separate worker threads
    pub parallel: bool,
    /// Candidates in evaluation order; earlier wins an AUC tie
    pub candidates: Vec<CandidateKind>,
    pub logistic: LogisticRegressionConfig,
    pub forest: RandomForestConfig,
    pub boosting: GradientBoostingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_seed: 42,
            parallel: true,
            candidates: vec![
                CandidateKind::LogisticRegression,
                CandidateKind::RandomForest,
                CandidateKind::GradientBoosting,
            ],
            logistic: LogisticRegressionConfig::default(),
            forest: RandomForestConfig::default(),
            boosting: GradientBoostingConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<CandidateKind>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_logistic(mut self, config: LogisticRegressionConfig) -> Self {
        self.logistic = config;
        self
    }

    pub fn with_forest(mut self, config: RandomForestConfig) -> Self {
        self.forest = config;
        self
    }

    pub fn with_boosting(mut self, config: GradientBoostingConfig) -> Self {
        self.boosting = config;
        self
    }

    /// Checks settings shared by every candidate. Per-model hyperparameters
    /// are checked when that model is fitted.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::invalid_parameter(
                "test_size",
                self.test_size,
                "must be strictly between 0 and 1",
            ));
        }
        if self.candidates.is_empty() {
            return Err(PipelineError::ConfigError(
                "training.candidates must name at least one classifier".to_string(),
            ));
        }
        Ok(())
    }
}

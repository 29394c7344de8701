//! Classifier capability and the candidate variants

use super::config::{CandidateKind, TrainingConfig};
use super::gradient_boosting::GradientBoostingClassifier;
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Anything the trainer can fit and score
pub trait Classifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Probability of the positive class for every row of `x`
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Hard 0/1 labels at `threshold`
    fn predict(&self, x: &Array2<f64>, threshold: f64) -> Result<Array1<f64>> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| if p >= threshold { 1.0 } else { 0.0 }))
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        CandidateKind::LogisticRegression.name()
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LogisticRegression::fit(self, x, y).map(|_| ())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LogisticRegression::predict_proba(self, x)
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &'static str {
        CandidateKind::RandomForest.name()
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        RandomForest::fit(self, x, y).map(|_| ())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        RandomForest::predict_proba(self, x)
    }
}

impl Classifier for GradientBoostingClassifier {
    fn name(&self) -> &'static str {
        CandidateKind::GradientBoosting.name()
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        GradientBoostingClassifier::fit(self, x, y).map(|_| ())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        GradientBoostingClassifier::predict_proba(self, x)
    }
}

/// One of the interchangeable candidate classifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CandidateModel {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoostingClassifier),
}

impl CandidateModel {
    /// Unfitted model of `kind`, seeded from the training config
    pub fn build(kind: CandidateKind, config: &TrainingConfig) -> Self {
        match kind {
            CandidateKind::LogisticRegression => {
                CandidateModel::LogisticRegression(LogisticRegression::new(config.logistic.clone()))
            }
            CandidateKind::RandomForest => {
                let mut forest = config.forest.clone();
                forest.random_state = forest.random_state.or(Some(config.random_seed));
                CandidateModel::RandomForest(RandomForest::new(forest))
            }
            CandidateKind::GradientBoosting => {
                let mut boosting = config.boosting.clone();
                boosting.random_state = boosting.random_state.or(Some(config.random_seed));
                CandidateModel::GradientBoosting(GradientBoostingClassifier::new(boosting))
            }
        }
    }

    pub fn kind(&self) -> CandidateKind {
        match self {
            CandidateModel::LogisticRegression(_) => CandidateKind::LogisticRegression,
            CandidateModel::RandomForest(_) => CandidateKind::RandomForest,
            CandidateModel::GradientBoosting(_) => CandidateKind::GradientBoosting,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            CandidateModel::LogisticRegression(m) => m,
            CandidateModel::RandomForest(m) => m,
            CandidateModel::GradientBoosting(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            CandidateModel::LogisticRegression(m) => m,
            CandidateModel::RandomForest(m) => m,
            CandidateModel::GradientBoosting(m) => m,
        }
    }
}

impl Classifier for CandidateModel {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict_proba(x)
    }
}

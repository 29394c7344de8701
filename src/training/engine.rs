//! Training engine: fit every candidate, score it, keep the best

use super::config::{CandidateKind, TrainingConfig};
use super::metrics::EvaluationResult;
use super::models::{CandidateModel, Classifier};
use super::split::StratifiedSplit;
use crate::error::{PipelineError, Result};
use crate::inference::DECISION_THRESHOLD;
use crate::preprocessing::ProcessedDataset;
use crate::store::{envelope, Artifact, ArtifactKey};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// The candidate chosen by a training run, with what it needs at scoring time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedModel {
    pub model: CandidateModel,
    /// Held-out scores that won the selection
    pub evaluation: EvaluationResult,
    /// Feature layout the model was fitted on
    pub feature_names: Vec<String>,
    /// Training timestamp (RFC 3339)
    pub trained_at: String,
}

impl SelectedModel {
    pub fn kind(&self) -> CandidateKind {
        self.model.kind()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Fail unless `feature_names` is exactly the layout the model was fitted on.
    ///
    /// A transform refitted after this model was trained can produce the
    /// same width with different columns, so widths alone are not enough.
    pub fn check_layout(&self, feature_names: &[String]) -> Result<()> {
        let differing = self
            .feature_names
            .iter()
            .zip(feature_names)
            .position(|(trained, given)| trained != given);

        match differing {
            Some(idx) => Err(PipelineError::ShapeError {
                expected: format!("feature '{}' at position {}", self.feature_names[idx], idx),
                actual: format!("feature '{}'", feature_names[idx]),
            }),
            None if feature_names.len() != self.n_features() => Err(PipelineError::ShapeError {
                expected: format!("{} features", self.n_features()),
                actual: format!("{} features", feature_names.len()),
            }),
            None => Ok(()),
        }
    }

    /// Positive-class probabilities; `x` must match the training layout
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} features", self.n_features()),
                actual: format!("{} features", x.ncols()),
            });
        }
        self.model.predict_proba(x)
    }
}

impl Artifact for SelectedModel {
    const KEY: ArtifactKey = ArtifactKey::SelectedModel;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        envelope::seal(Self::KEY, self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        envelope::open(Self::KEY, bytes)
    }
}

/// Everything a training run produced
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub selected: SelectedModel,
    /// Scores of every candidate that trained, in candidate order
    pub evaluations: Vec<EvaluationResult>,
    /// `name: error` for every candidate that failed
    pub failures: Vec<String>,
}

/// Trains the configured candidates and selects one by AUC
#[derive(Debug, Clone, Default)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Split, fit each candidate on the training rows, score it on the
    /// held-out rows and return the one with the highest AUC. Ties go to
    /// the candidate listed first. A failing candidate is skipped; the run
    /// only fails when none succeeds.
    pub fn train_and_select(&self, dataset: &ProcessedDataset) -> Result<TrainingOutcome> {
        self.config.validate()?;
        let start = Instant::now();

        let (x, y) = (&dataset.x, &dataset.y);
        if x.nrows() != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        if let Some(bad) = y.iter().find(|v| **v != 0.0 && **v != 1.0) {
            return Err(PipelineError::DataError(format!(
                "labels must be 0 or 1, found {}",
                bad
            )));
        }
        if dataset.positives() == 0 || dataset.positives() == y.len() {
            return Err(PipelineError::DataError(
                "training data must contain both classes".to_string(),
            ));
        }

        let split = StratifiedSplit::new(self.config.test_size, self.config.random_seed).split(y)?;
        let (x_train, x_test, y_train, y_test) = split.apply(x, y);
        info!(
            train_rows = split.train.len(),
            test_rows = split.test.len(),
            features = x.ncols(),
            "split dataset"
        );

        let fit_one = |kind: &CandidateKind| {
            self.fit_candidate(*kind, &x_train, &y_train, &x_test, &y_test)
        };
        let results: Vec<Result<(CandidateModel, EvaluationResult)>> = if self.config.parallel {
            self.config.candidates.par_iter().map(fit_one).collect()
        } else {
            self.config.candidates.iter().map(fit_one).collect()
        };

        let mut evaluations = Vec::new();
        let mut failures = Vec::new();
        let mut best: Option<(CandidateModel, EvaluationResult)> = None;

        for (kind, result) in self.config.candidates.iter().zip(results) {
            match result {
                Ok((model, evaluation)) => {
                    info!(
                        candidate = %kind,
                        accuracy = evaluation.accuracy,
                        f1 = evaluation.f1,
                        auc = evaluation.auc,
                        secs = evaluation.training_time_secs,
                        "evaluated candidate"
                    );
                    evaluations.push(evaluation.clone());
                    let better = best
                        .as_ref()
                        .map_or(true, |(_, current)| evaluation.auc > current.auc);
                    if better {
                        best = Some((model, evaluation));
                    }
                }
                Err(err) => {
                    warn!(candidate = %kind, error = %err, "candidate failed to train");
                    failures.push(format!("{}: {}", kind, err));
                }
            }
        }

        let (model, evaluation) = best.ok_or_else(|| PipelineError::AllCandidatesFailed {
            failures: failures.clone(),
        })?;

        info!(
            selected = %model.kind(),
            auc = evaluation.auc,
            failed = failures.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "selected model"
        );

        Ok(TrainingOutcome {
            selected: SelectedModel {
                model,
                evaluation,
                feature_names: dataset.feature_names.clone(),
                trained_at: chrono::Utc::now().to_rfc3339(),
            },
            evaluations,
            failures,
        })
    }

    fn fit_candidate(
        &self,
        kind: CandidateKind,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<(CandidateModel, EvaluationResult)> {
        let start = Instant::now();
        let mut model = CandidateModel::build(kind, &self.config);
        model.fit(x_train, y_train)?;
        let elapsed = start.elapsed().as_secs_f64();

        let proba = model.predict_proba(x_test)?;
        if proba.iter().any(|p| !p.is_finite()) {
            return Err(PipelineError::TrainingError(format!(
                "{} produced non-finite probabilities",
                kind
            )));
        }

        let evaluation = EvaluationResult::compute(
            model.name(),
            y_test,
            &proba,
            DECISION_THRESHOLD,
            y_train.len(),
            elapsed,
        );
        Ok((model, evaluation))
    }
}

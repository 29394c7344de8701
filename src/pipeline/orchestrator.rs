//! Runs the stages against an artifact store

use super::stage::{PipelineState, Stage};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::inference::{BatchPredictor, PredictionBatch, PredictionHistory};
use crate::preprocessing::{FeatureTransform, FittedTransform, ProcessedDataset, RawDataset};
use crate::store::ArtifactStore;
use crate::training::{SelectedModel, TrainEngine, TrainingOutcome};
use crate::utils::DataLoader;
use std::time::Instant;
use tracing::{error, info};

/// Summary of a full run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub state: PipelineState,
    /// Rows read by the ingest stage
    pub ingested_rows: usize,
    /// Width of the encoded feature matrix
    pub n_features: usize,
    pub training: TrainingOutcome,
    pub predictions: PredictionBatch,
    /// Wall time of each stage in seconds, in execution order
    pub stage_timings: Vec<(Stage, f64)>,
}

/// The churn batch job
///
/// Every stage reads its inputs from the artifact store and writes its
/// outputs back, so each one can also be invoked on its own.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    loader: DataLoader,
    store: ArtifactStore,
}

impl Pipeline {
    /// Pipeline over a local store rooted at `config.artifact_root`
    pub fn new(config: PipelineConfig) -> Self {
        let store = ArtifactStore::local(&config.artifact_root);
        Self::with_store(config, store)
    }

    pub fn with_store(config: PipelineConfig, store: ArtifactStore) -> Self {
        Self {
            config,
            loader: DataLoader::new(),
            store,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    fn check_preconditions(&self, stage: Stage) -> Result<()> {
        stage
            .requires()
            .iter()
            .try_for_each(|key| self.store.require(*key))
    }

    /// Read the labelled customer table and store a snapshot of it
    pub fn ingest(&self) -> Result<RawDataset> {
        self.check_preconditions(Stage::Ingest)?;
        let frame = self.loader.load_csv(&self.config.raw_data_path)?;
        let raw = RawDataset::new(frame);
        self.store.save(&raw)?;

        info!(
            source = %self.config.raw_data_path.display(),
            rows = raw.frame.height(),
            columns = raw.frame.width(),
            "ingested raw data"
        );
        Ok(raw)
    }

    /// Fit the feature transform on the stored raw data and store both the
    /// processed dataset and the fitted transform
    pub fn transform(&self) -> Result<(ProcessedDataset, FittedTransform)> {
        self.check_preconditions(Stage::Transform)?;
        let raw: RawDataset = self.store.load()?;

        let (dataset, fitted) = FeatureTransform::new(self.config.transform.clone()).fit(&raw.frame)?;
        self.store.save(&dataset)?;
        self.store.save(&fitted)?;
        Ok((dataset, fitted))
    }

    /// Train the candidates on the stored processed dataset and store the
    /// winner
    pub fn train(&self) -> Result<TrainingOutcome> {
        self.check_preconditions(Stage::Train)?;
        let dataset: ProcessedDataset = self.store.load()?;

        let outcome = TrainEngine::new(self.config.training.clone()).train_and_select(&dataset)?;
        self.store.save(&outcome.selected)?;
        Ok(outcome)
    }

    /// Score the new-customer table and append the batch to the history.
    /// Nothing is written unless every step succeeds.
    pub fn predict(&self) -> Result<PredictionBatch> {
        self.check_preconditions(Stage::Predict)?;
        let transform: FittedTransform = self.store.load()?;
        let model: SelectedModel = self.store.load()?;
        let customers = self.loader.load_csv(&self.config.new_customers_path)?;

        let batch = BatchPredictor::new(&transform, &model).predict(&customers)?;
        self.store.append_predictions(&batch)?;
        info!(rows = batch.len(), "appended prediction batch");
        Ok(batch)
    }

    /// Stored predictions in write order
    pub fn prediction_history(&self) -> Result<PredictionHistory> {
        self.store.prediction_history()
    }

    /// Run ingest, transform, train and predict in order. Every stage is
    /// re-executed on each call; the first failure ends the run.
    pub fn run(&self) -> Result<PipelineReport> {
        let start = Instant::now();
        let mut state = PipelineState::default();
        let mut timings = Vec::with_capacity(Stage::ALL.len());

        let raw = self.timed(Stage::Ingest, &mut state, &mut timings, |p| p.ingest())?;
        let (dataset, _) = self.timed(Stage::Transform, &mut state, &mut timings, |p| p.transform())?;
        let training = self.timed(Stage::Train, &mut state, &mut timings, |p| p.train())?;
        let predictions = self.timed(Stage::Predict, &mut state, &mut timings, |p| p.predict())?;

        info!(
            state = %state,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pipeline finished"
        );
        Ok(PipelineReport {
            state,
            ingested_rows: raw.frame.height(),
            n_features: dataset.n_features(),
            training,
            predictions,
            stage_timings: timings,
        })
    }

    fn timed<T>(
        &self,
        stage: Stage,
        state: &mut PipelineState,
        timings: &mut Vec<(Stage, f64)>,
        run: impl FnOnce(&Self) -> Result<T>,
    ) -> Result<T> {
        let next = state.advance(stage)?;
        info!(stage = %stage, "stage started");
        let start = Instant::now();

        let output = run(self).map_err(|err| {
            error!(stage = %stage, error = %err, "stage failed");
            err
        })?;

        let secs = start.elapsed().as_secs_f64();
        info!(stage = %stage, secs, "stage finished");
        timings.push((stage, secs));
        *state = next;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::store::ArtifactKey;

    fn in_memory(config: PipelineConfig) -> Pipeline {
        Pipeline::with_store(config, ArtifactStore::in_memory())
    }

    #[test]
    fn test_transform_needs_raw_dataset() {
        let pipeline = in_memory(PipelineConfig::default());
        match pipeline.transform().unwrap_err() {
            PipelineError::ArtifactMissing { artifact, stage } => {
                assert_eq!(artifact, ArtifactKey::RawDataset);
                assert_eq!(stage, Stage::Ingest);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_predict_names_transform_first() {
        let pipeline = in_memory(PipelineConfig::default());
        let err = pipeline.predict().unwrap_err();
        assert!(err.to_string().contains("fitted transform"));
        assert!(!pipeline.store().exists(ArtifactKey::PredictionHistory));
    }

    #[test]
    fn test_missing_raw_file_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default()
            .with_raw_data(dir.path().join("absent.csv"))
            .with_artifact_root(dir.path());
        let err = Pipeline::new(config).run().unwrap_err();
        assert!(matches!(err, PipelineError::MissingInputFile { .. }));
        assert!(!dir.path().join("data/ingested/churn.csv").exists());
    }
}

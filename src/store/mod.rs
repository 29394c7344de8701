//! Artifact store
//!
//! Typed load/save of pipeline artifacts addressed by stable logical keys.
//! Every artifact except the prediction history is overwritten on save; the
//! prediction history only ever grows, one batch per append.

mod backend;
pub mod envelope;

pub use backend::{LocalStorage, MemoryStorage, StorageBackend};

use crate::error::{PipelineError, Result};
use crate::inference::{PredictionBatch, PredictionHistory};
use crate::pipeline::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Logical names of everything the pipeline persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKey {
    RawDataset,
    ProcessedDataset,
    FittedTransform,
    SelectedModel,
    PredictionHistory,
}

impl ArtifactKey {
    pub const ALL: [ArtifactKey; 5] = [
        ArtifactKey::RawDataset,
        ArtifactKey::ProcessedDataset,
        ArtifactKey::FittedTransform,
        ArtifactKey::SelectedModel,
        ArtifactKey::PredictionHistory,
    ];

    /// Location relative to the store root
    pub fn location(&self) -> &'static str {
        match self {
            ArtifactKey::RawDataset => "data/ingested/churn.csv",
            ArtifactKey::ProcessedDataset => "data/processed/churn_clean.csv",
            ArtifactKey::FittedTransform => "models/preprocessor.bin",
            ArtifactKey::SelectedModel => "models/churn_model.bin",
            ArtifactKey::PredictionHistory => "db/churn_predictions.csv",
        }
    }

    /// Stage that writes this artifact
    pub fn producer(&self) -> Stage {
        match self {
            ArtifactKey::RawDataset => Stage::Ingest,
            ArtifactKey::ProcessedDataset | ArtifactKey::FittedTransform => Stage::Transform,
            ArtifactKey::SelectedModel => Stage::Train,
            ArtifactKey::PredictionHistory => Stage::Predict,
        }
    }

    fn missing(self) -> PipelineError {
        PipelineError::ArtifactMissing {
            artifact: self,
            stage: self.producer(),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKey::RawDataset => "raw dataset",
            ArtifactKey::ProcessedDataset => "processed dataset",
            ArtifactKey::FittedTransform => "fitted transform",
            ArtifactKey::SelectedModel => "selected model",
            ArtifactKey::PredictionHistory => "prediction history",
        };
        f.write_str(name)
    }
}

/// A value that can be saved under a fixed key
pub trait Artifact: Sized {
    const KEY: ArtifactKey;

    fn to_bytes(&self) -> Result<Vec<u8>>;

    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

/// Typed facade over a storage backend
pub struct ArtifactStore {
    backend: Box<dyn StorageBackend>,
}

impl ArtifactStore {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Store rooted at a directory on disk
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(LocalStorage::new(root)))
    }

    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// Persist `artifact`, replacing any previous value under its key
    pub fn save<A: Artifact>(&self, artifact: &A) -> Result<()> {
        let bytes = artifact.to_bytes()?;
        self.backend.put(A::KEY.location(), &bytes)?;
        debug!(
            artifact = %A::KEY,
            location = %self.locate(A::KEY),
            bytes = bytes.len(),
            "saved artifact"
        );
        Ok(())
    }

    /// Load the most recently saved value for the artifact's key
    pub fn load<A: Artifact>(&self) -> Result<A> {
        match self.backend.get(A::KEY.location())? {
            Some(bytes) => A::from_bytes(&bytes),
            None => Err(A::KEY.missing()),
        }
    }

    pub fn exists(&self, key: ArtifactKey) -> bool {
        self.backend.exists(key.location())
    }

    /// Fail with `ArtifactMissing` unless `key` has been written
    pub fn require(&self, key: ArtifactKey) -> Result<()> {
        if self.exists(key) {
            Ok(())
        } else {
            Err(key.missing())
        }
    }

    pub fn locate(&self, key: ArtifactKey) -> String {
        self.backend.describe(key.location())
    }

    /// Append one batch to the prediction history
    pub fn append_predictions(&self, batch: &PredictionBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let location = ArtifactKey::PredictionHistory.location();
        let include_header = !self.backend.exists(location);
        let bytes = batch.to_csv_bytes(include_header)?;
        self.backend.append(location, &bytes)?;
        debug!(rows = batch.len(), location = %self.backend.describe(location), "appended predictions");
        Ok(())
    }

    /// Every stored prediction, in the order it was written
    pub fn prediction_history(&self) -> Result<PredictionHistory> {
        match self.backend.get(ArtifactKey::PredictionHistory.location())? {
            Some(bytes) => PredictionHistory::from_csv_bytes(&bytes),
            None => Err(ArtifactKey::PredictionHistory.missing()),
        }
    }
}

impl fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("root", &self.backend.describe(""))
            .finish()
    }
}

//! Stages and the forward-only run state

use crate::error::{PipelineError, Result};
use crate::store::ArtifactKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of the batch job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Ingest,
    Transform,
    Train,
    Predict,
}

impl Stage {
    /// Every stage in execution order
    pub const ALL: [Stage; 4] = [Stage::Ingest, Stage::Transform, Stage::Train, Stage::Predict];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Ingest => "ingest",
            Stage::Transform => "transform",
            Stage::Train => "train",
            Stage::Predict => "predict",
        }
    }

    /// Artifacts that must already be stored before this stage may start
    pub fn requires(&self) -> &'static [ArtifactKey] {
        match self {
            Stage::Ingest => &[],
            Stage::Transform => &[ArtifactKey::RawDataset],
            Stage::Train => &[ArtifactKey::ProcessedDataset],
            Stage::Predict => &[ArtifactKey::FittedTransform, ArtifactKey::SelectedModel],
        }
    }

    /// Artifacts this stage writes
    pub fn produces(&self) -> &'static [ArtifactKey] {
        match self {
            Stage::Ingest => &[ArtifactKey::RawDataset],
            Stage::Transform => &[ArtifactKey::ProcessedDataset, ArtifactKey::FittedTransform],
            Stage::Train => &[ArtifactKey::SelectedModel],
            Stage::Predict => &[ArtifactKey::PredictionHistory],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a run has got to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineState {
    #[default]
    Pending,
    Ingested,
    Transformed,
    Trained,
    Predicted,
}

impl PipelineState {
    /// State reached once `stage` completes from `self`. Only the next stage
    /// in order is accepted.
    pub fn advance(self, stage: Stage) -> Result<Self> {
        match (self, stage) {
            (PipelineState::Pending, Stage::Ingest) => Ok(PipelineState::Ingested),
            (PipelineState::Ingested, Stage::Transform) => Ok(PipelineState::Transformed),
            (PipelineState::Transformed, Stage::Train) => Ok(PipelineState::Trained),
            (PipelineState::Trained, Stage::Predict) => Ok(PipelineState::Predicted),
            (state, stage) => Err(PipelineError::StageOrder { state, stage }),
        }
    }

    pub fn is_complete(&self) -> bool {
        *self == PipelineState::Predicted
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Pending => "pending",
            PipelineState::Ingested => "ingested",
            PipelineState::Transformed => "transformed",
            PipelineState::Trained => "trained",
            PipelineState::Predicted => "predicted",
        };
        f.write_str(name)
    }
}

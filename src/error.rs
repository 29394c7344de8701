//! Error types for the churn pipeline

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::{PipelineState, Stage};
use crate::store::ArtifactKey;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the churn pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input file not found: {}", path.display())]
    MissingInputFile { path: PathBuf },

    #[error("label column '{column}' has unrecognised value '{value}' at row {row}")]
    LabelMapping {
        column: String,
        row: usize,
        value: String,
    },

    #[error("required column '{column}' is absent from the input")]
    SchemaMismatch { column: String },

    #[error("artifact '{artifact}' is missing (produced by the {stage} stage)")]
    ArtifactMissing { artifact: ArtifactKey, stage: Stage },

    #[error("every candidate classifier failed: {}", failures.join("; "))]
    AllCandidatesFailed { failures: Vec<String> },

    #[error("cannot run the {stage} stage from state {state}")]
    StageOrder { state: PipelineState, stage: Stage },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl PipelineError {
    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: &str,
    ) -> Self {
        PipelineError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

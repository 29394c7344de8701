//! Churn Pipeline - batch customer churn prediction
//!
//! This crate turns a labelled customer table into a churn model and scores
//! new customers with it:
//! - Ingest raw customer records
//! - Fit a feature transform (imputation, one-hot encoding, scaling)
//! - Train several candidate classifiers and keep the best by ROC AUC
//! - Score new customers and append them to a prediction history
//!
//! # Modules
//!
//! - [`store`] - Artifact store shared by the stages
//! - [`preprocessing`] - Feature transform
//! - [`training`] - Candidate classifiers and model selection
//! - [`inference`] - Batch prediction and history
//! - [`pipeline`] - Stage sequencing
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Pipeline stages
pub mod store;
pub mod preprocessing;
pub mod training;
pub mod inference;
pub mod pipeline;

// Utilities
pub mod utils;

// Services
pub mod cli;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PipelineError, Result};

    // Configuration
    pub use crate::config::PipelineConfig;

    // Artifact store
    pub use crate::store::{Artifact, ArtifactKey, ArtifactStore, LocalStorage, MemoryStorage, StorageBackend};

    // Preprocessing
    pub use crate::preprocessing::{
        split_identifier, CustomerFrame, FeatureTransform, FittedTransform, ProcessedDataset,
        RawDataset, ScalerType, TransformConfig,
    };

    // Training
    pub use crate::training::{
        CandidateKind, CandidateModel, Classifier, EvaluationResult, SelectedModel, TrainEngine,
        TrainingConfig, TrainingOutcome,
    };

    // Inference
    pub use crate::inference::{
        BatchPredictor, PredictionBatch, PredictionHistory, PredictionRow, DECISION_THRESHOLD,
    };

    // Orchestration
    pub use crate::pipeline::{Pipeline, PipelineReport, PipelineState, Stage};
}

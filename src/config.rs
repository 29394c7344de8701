//! Pipeline configuration

use crate::error::{PipelineError, Result};
use crate::preprocessing::TransformConfig;
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths and stage settings for one pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Labelled customer table read by the ingest stage
    pub raw_data_path: PathBuf,
    /// Unlabelled customer table scored by the predict stage
    pub new_customers_path: PathBuf,
    /// Root directory of the artifact store
    pub artifact_root: PathBuf,
    pub transform: TransformConfig,
    pub training: TrainingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_data_path: PathBuf::from("data/raw/churn.csv"),
            new_customers_path: PathBuf::from("data/raw/new_customers.csv"),
            artifact_root: PathBuf::from("."),
            transform: TransformConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config; absent keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            PipelineError::ConfigError(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_raw_data(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw_data_path = path.into();
        self
    }

    pub fn with_new_customers(mut self, path: impl Into<PathBuf>) -> Self {
        self.new_customers_path = path.into();
        self
    }

    pub fn with_artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifact_root = root.into();
        self
    }

    pub fn with_transform(mut self, transform: TransformConfig) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("raw_data_path", &self.raw_data_path),
            ("new_customers_path", &self.new_customers_path),
            ("artifact_root", &self.artifact_root),
        ] {
            if path.as_os_str().is_empty() {
                return Err(PipelineError::ConfigError(format!("{} must not be empty", name)));
            }
        }
        self.transform.validate()?;
        self.training.validate()
    }
}

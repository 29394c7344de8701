//! Feature transform configuration

use super::ScalerType;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the feature transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Customer identifier, carried through but never encoded
    pub id_column: String,

    /// Binary label column, present only in training data
    pub label_column: String,

    /// Label value mapped to 1
    pub positive_label: String,

    /// Label value mapped to 0
    pub negative_label: String,

    /// Text columns always treated as numeric
    pub coerce_numeric: Vec<String>,

    /// Treat any text column whose values all parse as numbers as numeric
    pub auto_coerce_numeric: bool,

    /// Scaling applied to numeric columns
    pub scaler_type: ScalerType,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            id_column: "customerID".to_string(),
            label_column: "Churn".to_string(),
            positive_label: "Yes".to_string(),
            negative_label: "No".to_string(),
            coerce_numeric: vec!["TotalCharges".to_string()],
            auto_coerce_numeric: true,
            scaler_type: ScalerType::Standard,
        }
    }
}

impl TransformConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn with_label(
        mut self,
        column: impl Into<String>,
        positive: impl Into<String>,
        negative: impl Into<String>,
    ) -> Self {
        self.label_column = column.into();
        self.positive_label = positive.into();
        self.negative_label = negative.into();
        self
    }

    pub fn with_coerce_numeric(mut self, columns: Vec<String>) -> Self {
        self.coerce_numeric = columns;
        self
    }

    pub fn with_auto_coerce(mut self, enabled: bool) -> Self {
        self.auto_coerce_numeric = enabled;
        self
    }

    pub fn with_scaler(mut self, scaler_type: ScalerType) -> Self {
        self.scaler_type = scaler_type;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.label_column.is_empty() {
            return Err(PipelineError::ConfigError(
                "transform.label_column must not be empty".to_string(),
            ));
        }
        if self.positive_label == self.negative_label {
            return Err(PipelineError::ConfigError(format!(
                "positive and negative labels are both '{}'",
                self.positive_label
            )));
        }
        if self.id_column == self.label_column {
            return Err(PipelineError::ConfigError(
                "identifier and label columns must differ".to_string(),
            ));
        }
        Ok(())
    }
}

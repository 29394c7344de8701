//! Feature transform
//!
//! Turns raw customer records into a numeric feature matrix:
//! - Identifier column carried as a side channel, never encoded
//! - Text columns that hold numbers coerced to numeric
//! - Missing numeric values imputed with the training median
//! - Categorical columns one-hot encoded, unseen categories ignored
//! - Numeric columns scaled with statistics learned at fit time

mod config;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use config::TransformConfig;
pub use encoder::OneHotEncoder;
pub use imputer::MedianImputer;
pub use pipeline::{FeatureTransform, FittedTransform};
pub use scaler::{Scaler, ScalerType};

use crate::error::{PipelineError, Result};
use crate::store::{Artifact, ArtifactKey};
use crate::utils::{DataLoader, DataSaver};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// How a raw column is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Raw customer records as ingested
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub frame: DataFrame,
}

impl RawDataset {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }
}

impl Artifact for RawDataset {
    const KEY: ArtifactKey = ArtifactKey::RawDataset;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut frame = self.frame.clone();
        DataSaver::to_csv_bytes(&mut frame, true)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        DataLoader::new().load_csv_bytes(bytes).map(Self::new)
    }
}

/// Numeric matrix plus aligned 0/1 labels
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedDataset {
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    /// Column name the label is written under
    pub label_name: String,
}

impl ProcessedDataset {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Number of rows labelled 1
    pub fn positives(&self) -> usize {
        self.y.iter().filter(|&&v| v == 1.0).count()
    }

    fn to_frame(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = self
            .feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| Column::new(name.as_str().into(), self.x.column(j).to_vec()))
            .collect();
        columns.push(Column::new(self.label_name.as_str().into(), self.y.to_vec()));
        Ok(DataFrame::new(columns)?)
    }
}

impl Artifact for ProcessedDataset {
    const KEY: ArtifactKey = ArtifactKey::ProcessedDataset;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut frame = self.to_frame()?;
        DataSaver::to_csv_bytes(&mut frame, true)
    }

    /// The last column is the label, every other column a feature
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let frame = DataLoader::new().load_csv_bytes(bytes)?;
        let columns = frame.get_columns();
        let (label, features) = columns.split_last().ok_or_else(|| {
            PipelineError::DataError("processed dataset has no columns".to_string())
        })?;

        let n = frame.height();
        let mut x = Array2::zeros((n, features.len()));
        for (j, column) in features.iter().enumerate() {
            for (i, value) in dense_values(column.as_materialized_series())?.into_iter().enumerate() {
                x[[i, j]] = value;
            }
        }
        let y = Array1::from_vec(dense_values(label.as_materialized_series())?);

        Ok(Self {
            feature_names: features.iter().map(|c| c.name().to_string()).collect(),
            x,
            y,
            label_name: label.name().to_string(),
        })
    }
}

/// Feature columns with the identifier split off into a parallel sequence
#[derive(Debug, Clone)]
pub struct CustomerFrame {
    pub features: DataFrame,
    /// One identifier per row, when the input carried them
    pub customer_ids: Option<Vec<String>>,
}

impl CustomerFrame {
    /// Identifier for each row, falling back to the row position
    pub fn row_ids(&self) -> Vec<String> {
        match &self.customer_ids {
            Some(ids) => ids.clone(),
            None => (0..self.features.height()).map(|i| i.to_string()).collect(),
        }
    }
}

/// Separate the identifier column from the features without touching `df`
pub fn split_identifier(df: &DataFrame, id_column: &str) -> Result<CustomerFrame> {
    match df.column(id_column) {
        Ok(column) => {
            let ids = text_values(column.as_materialized_series())?
                .into_iter()
                .enumerate()
                .map(|(i, id)| id.unwrap_or_else(|| i.to_string()))
                .collect();
            Ok(CustomerFrame {
                features: df.drop(id_column)?,
                customer_ids: Some(ids),
            })
        }
        Err(_) => Ok(CustomerFrame {
            features: df.clone(),
            customer_ids: None,
        }),
    }
}

/// Parse a text cell as a finite number
pub(crate) fn parse_numeric(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Column values as numbers; unparseable or missing cells become `None`
pub(crate) fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    if is_numeric_dtype(series.dtype()) {
        let casted = series.cast(&DataType::Float64)?;
        let values = casted
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        return Ok(values);
    }
    Ok(text_values(series)?
        .into_iter()
        .map(|v| v.as_deref().and_then(parse_numeric))
        .collect())
}

/// Column values as text, whatever the stored type
pub(crate) fn text_values(series: &Series) -> Result<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

fn dense_values(series: &Series) -> Result<Vec<f64>> {
    numeric_values(series)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                PipelineError::DataError(format!(
                    "column '{}' has a missing value at row {}",
                    series.name(),
                    row
                ))
            })
        })
        .collect()
}

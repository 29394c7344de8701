//! Fit-once, apply-many feature transform

use super::{
    config::TransformConfig, encoder::OneHotEncoder, imputer::MedianImputer, is_numeric_dtype,
    numeric_values, parse_numeric, scaler::Scaler, text_values, ColumnKind, ProcessedDataset,
};
use crate::error::{PipelineError, Result};
use crate::store::{envelope, Artifact, ArtifactKey};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Learns a [`FittedTransform`] from labelled training records
#[derive(Debug, Clone, Default)]
pub struct FeatureTransform {
    config: TransformConfig,
}

impl FeatureTransform {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Fit the encoding on `df` and encode it.
    ///
    /// The identifier column is dropped, the label is mapped to 1/0 and the
    /// remaining columns are split into categorical and numeric by value type.
    pub fn fit(&self, df: &DataFrame) -> Result<(ProcessedDataset, FittedTransform)> {
        let start = Instant::now();
        self.config.validate()?;

        if df.height() == 0 {
            return Err(PipelineError::PreprocessingError(
                "cannot fit a transform on an empty table".to_string(),
            ));
        }
        let y = self.map_labels(df)?;
        let layout = self.partition_columns(df)?;
        if layout.is_empty() {
            return Err(PipelineError::PreprocessingError(format!(
                "no feature columns besides '{}' and '{}'",
                self.config.id_column, self.config.label_column
            )));
        }

        let categorical_columns: Vec<String> = layout
            .iter()
            .filter(|(_, kind)| *kind == ColumnKind::Categorical)
            .map(|(name, _)| name.clone())
            .collect();
        let numeric_columns: Vec<String> = layout
            .iter()
            .filter(|(_, kind)| *kind == ColumnKind::Numeric)
            .map(|(name, _)| name.clone())
            .collect();

        let categorical_values = categorical_columns
            .iter()
            .map(|name| text_values(df.column(name)?.as_materialized_series()))
            .collect::<Result<Vec<_>>>()?;
        let raw_numeric = numeric_columns
            .iter()
            .map(|name| numeric_values(df.column(name)?.as_materialized_series()))
            .collect::<Result<Vec<_>>>()?;

        let encoder = OneHotEncoder::fit(&categorical_values);
        let imputer = MedianImputer::fit(&raw_numeric);
        let filled: Vec<Vec<f64>> = raw_numeric
            .iter()
            .enumerate()
            .map(|(idx, values)| imputer.fill(idx, values))
            .collect();
        let scaler = Scaler::new(self.config.scaler_type).fit(&filled);

        let mut feature_names = encoder.feature_names(&categorical_columns);
        feature_names.extend(numeric_columns.iter().cloned());

        let fitted = FittedTransform {
            id_column: self.config.id_column.clone(),
            label_column: self.config.label_column.clone(),
            categorical_columns,
            numeric_columns,
            encoder,
            imputer,
            scaler,
            feature_names,
            fitted_rows: df.height(),
        };

        let x = fitted.apply(df)?;
        let dataset = ProcessedDataset {
            feature_names: fitted.feature_names.clone(),
            x,
            y,
            label_name: self.config.label_column.clone(),
        };

        info!(
            rows = dataset.n_samples(),
            features = dataset.n_features(),
            categorical = fitted.categorical_columns.len(),
            numeric = fitted.numeric_columns.len(),
            positives = dataset.positives(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fitted feature transform"
        );
        Ok((dataset, fitted))
    }

    fn map_labels(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let column = df
            .column(&self.config.label_column)
            .map_err(|_| PipelineError::SchemaMismatch {
                column: self.config.label_column.clone(),
            })?;

        let values = text_values(column.as_materialized_series())?;
        values
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value.as_deref().map(str::trim) {
                Some(v) if v == self.config.positive_label => Ok(1.0),
                Some(v) if v == self.config.negative_label => Ok(0.0),
                other => Err(PipelineError::LabelMapping {
                    column: self.config.label_column.clone(),
                    row,
                    value: other.unwrap_or("<missing>").to_string(),
                }),
            })
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from_vec)
    }

    /// Decide, in frame order, how each feature column is encoded
    fn partition_columns(&self, df: &DataFrame) -> Result<Vec<(String, ColumnKind)>> {
        let mut layout = Vec::new();
        for column in df.get_columns() {
            let name = column.name().as_str();
            if name == self.config.id_column || name == self.config.label_column {
                continue;
            }

            let series = column.as_materialized_series();
            let kind = if is_numeric_dtype(series.dtype())
                || self.config.coerce_numeric.iter().any(|c| c == name)
                || (self.config.auto_coerce_numeric && looks_numeric(series)?)
            {
                ColumnKind::Numeric
            } else {
                ColumnKind::Categorical
            };
            debug!(column = name, ?kind, "classified column");
            layout.push((name.to_string(), kind));
        }
        Ok(layout)
    }
}

/// A text column counts as numeric when every non-blank cell parses
fn looks_numeric(series: &Series) -> Result<bool> {
    if !matches!(series.dtype(), DataType::String) {
        return Ok(false);
    }
    let mut parsed_any = false;
    for value in series.str()?.into_iter().flatten() {
        if value.trim().is_empty() {
            continue;
        }
        if parse_numeric(value).is_none() {
            return Ok(false);
        }
        parsed_any = true;
    }
    Ok(parsed_any)
}

/// Encoding learned once from training records and re-applied unchanged.
///
/// Output layout: one indicator block per categorical column, in frame
/// order, followed by one scaled column per numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransform {
    id_column: String,
    label_column: String,
    categorical_columns: Vec<String>,
    numeric_columns: Vec<String>,
    encoder: OneHotEncoder,
    imputer: MedianImputer,
    scaler: Scaler,
    feature_names: Vec<String>,
    fitted_rows: usize,
}

impl FittedTransform {
    /// Encode `df` with the fitted statistics.
    ///
    /// Identifier, label and unknown extra columns are ignored. A column
    /// seen at fit time but absent here is a `SchemaMismatch`.
    pub fn apply(&self, df: &DataFrame) -> Result<Array2<f64>> {
        for name in self.required_columns() {
            if df.column(name).is_err() {
                return Err(PipelineError::SchemaMismatch {
                    column: name.to_string(),
                });
            }
        }

        let n_rows = df.height();
        let mut x = Array2::zeros((n_rows, self.n_features()));
        let mut offset = 0;

        for (idx, name) in self.categorical_columns.iter().enumerate() {
            let values = text_values(df.column(name)?.as_materialized_series())?;
            for (row, value) in values.iter().enumerate() {
                if let Some(pos) = self.encoder.position(idx, value.as_deref()) {
                    x[[row, offset + pos]] = 1.0;
                }
            }
            offset += self.encoder.width(idx);
        }

        for (idx, name) in self.numeric_columns.iter().enumerate() {
            let values = numeric_values(df.column(name)?.as_materialized_series())?;
            for (row, value) in self.imputer.fill(idx, &values).into_iter().enumerate() {
                x[[row, offset]] = self.scaler.scale(idx, value);
            }
            offset += 1;
        }

        debug!(rows = n_rows, features = offset, "applied feature transform");
        Ok(x)
    }

    /// Raw columns the transform reads
    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.categorical_columns
            .iter()
            .chain(self.numeric_columns.iter())
            .map(String::as_str)
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn imputer(&self) -> &MedianImputer {
        &self.imputer
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    /// Number of rows the transform was fitted on
    pub fn fitted_rows(&self) -> usize {
        self.fitted_rows
    }
}

impl Artifact for FittedTransform {
    const KEY: ArtifactKey = ArtifactKey::FittedTransform;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        envelope::seal(Self::KEY, self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        envelope::open(Self::KEY, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::ScalerType;

    fn training_frame() -> DataFrame {
        df!(
            "customerID" => &["c1", "c2", "c3", "c4"],
            "gender" => &["Male", "Female", "Female", "Male"],
            "tenure" => &[1i64, 10, 20, 30],
            "TotalCharges" => &["10.0", " ", "30.0", "50.0"],
            "Churn" => &["Yes", "No", "No", "Yes"]
        )
        .unwrap()
    }

    #[test]
    fn test_fit_layout() {
        let (dataset, fitted) = FeatureTransform::default().fit(&training_frame()).unwrap();

        assert_eq!(
            fitted.feature_names(),
            &["gender_Female", "gender_Male", "tenure", "TotalCharges"]
        );
        assert_eq!(dataset.x.dim(), (4, 4));
        assert_eq!(dataset.y.to_vec(), vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(fitted.numeric_columns(), &["tenure", "TotalCharges"]);
        assert_eq!(fitted.encoder().total_width(), 2);
        assert_eq!(fitted.scaler().scaler_type(), ScalerType::Standard);
        assert_eq!(fitted.fitted_rows(), 4);
    }

    #[test]
    fn test_blank_total_charges_filled_with_median() {
        let transform = FeatureTransform::new(TransformConfig::new().with_scaler(ScalerType::None));
        let (dataset, fitted) = transform.fit(&training_frame()).unwrap();

        assert_eq!(fitted.imputer().medians()[1], 30.0);
        assert_eq!(dataset.x[[1, 3]], 30.0);
    }

    #[test]
    fn test_identifier_never_encoded() {
        let (_, fitted) = FeatureTransform::default().fit(&training_frame()).unwrap();
        assert!(fitted.required_columns().all(|c| c != "customerID"));
        assert!(fitted.feature_names().iter().all(|f| !f.starts_with("customerID")));
    }

    #[test]
    fn test_missing_label_is_mapping_error() {
        let df = df!(
            "tenure" => &[1i64, 2],
            "Churn" => &[Some("Yes"), None]
        )
        .unwrap();
        let err = FeatureTransform::default().fit(&df).unwrap_err();
        assert!(matches!(err, PipelineError::LabelMapping { row: 1, .. }));
    }

    #[test]
    fn test_label_only_table_rejected() {
        let df = df!("customerID" => &["a", "b"], "Churn" => &["Yes", "No"]).unwrap();
        assert!(matches!(
            FeatureTransform::default().fit(&df),
            Err(PipelineError::PreprocessingError(_))
        ));
    }

    #[test]
    fn test_numeric_scaled_standard() {
        let (dataset, _) = FeatureTransform::default().fit(&training_frame()).unwrap();
        let tenure = dataset.x.column(2);
        let mean = tenure.sum() / 4.0;
        assert!(mean.abs() < 1e-12);
    }

    #[test]
    fn test_sealed_round_trip() {
        let (_, fitted) = FeatureTransform::default().fit(&training_frame()).unwrap();
        let restored = FittedTransform::from_bytes(&fitted.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, fitted);
    }
}

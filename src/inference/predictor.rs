//! Scores new customers with a stored transform and model

use super::{PredictionBatch, PredictionRow, DECISION_THRESHOLD, TIMESTAMP_FORMAT};
use crate::error::Result;
use crate::preprocessing::{split_identifier, FittedTransform};
use crate::training::SelectedModel;
use polars::prelude::*;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Applies a fitted transform and model to a batch of customers
#[derive(Debug, Clone, Copy)]
pub struct BatchPredictor<'a> {
    transform: &'a FittedTransform,
    model: &'a SelectedModel,
    threshold: f64,
}

impl<'a> BatchPredictor<'a> {
    pub fn new(transform: &'a FittedTransform, model: &'a SelectedModel) -> Self {
        Self {
            transform,
            model,
            threshold: DECISION_THRESHOLD,
        }
    }

    /// Score every row of `customers`. The identifier column is carried
    /// through untouched; without one, the row position stands in. All rows
    /// share one timestamp taken when scoring starts.
    pub fn predict(&self, customers: &DataFrame) -> Result<PredictionBatch> {
        let start = Instant::now();
        self.model.check_layout(self.transform.feature_names())?;
        let prediction_date = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();

        let split = split_identifier(customers, self.transform.id_column())?;
        if split.customer_ids.is_none() {
            warn!(
                column = self.transform.id_column(),
                "identifier column absent, using row positions"
            );
        }
        let ids = split.row_ids();
        let mut seen = HashSet::with_capacity(ids.len());
        let duplicates = ids.iter().filter(|id| !seen.insert(id.as_str())).count();
        if duplicates > 0 {
            warn!(duplicates, "batch contains repeated customer identifiers");
        }

        let x = self.transform.apply(&split.features)?;
        let proba = self.model.predict_proba(&x)?;

        let rows: Vec<PredictionRow> = ids
            .into_iter()
            .zip(proba.iter())
            .map(|(customer_id, &probability)| PredictionRow {
                customer_id,
                predicted_label: i32::from(probability >= self.threshold),
                probability,
                prediction_date: prediction_date.clone(),
            })
            .collect();
        let batch = PredictionBatch::new(rows);

        for row in batch.rows().iter().take(5) {
            debug!(
                customer = %row.customer_id,
                label = row.predicted_label,
                probability = row.probability,
                "prediction preview"
            );
        }
        info!(
            rows = batch.len(),
            churners = batch.churners(),
            model = %self.model.kind(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scored batch"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::preprocessing::{FeatureTransform, TransformConfig};
    use crate::training::{CandidateKind, TrainEngine, TrainingConfig};

    fn training_frame() -> DataFrame {
        training_frame_with("Two year")
    }

    fn training_frame_with(long_contract: &str) -> DataFrame {
        let n = 40;
        let ids: Vec<String> = (0..n).map(|i| format!("C{:03}", i)).collect();
        let contract: Vec<&str> = (0..n)
            .map(|i| if i % 4 == 0 { "Month-to-month" } else { long_contract })
            .collect();
        let tenure: Vec<i64> = (0..n).map(|i| if i % 4 == 0 { 2 } else { 30 + i as i64 }).collect();
        let churn: Vec<&str> = (0..n).map(|i| if i % 4 == 0 { "Yes" } else { "No" }).collect();
        df!(
            "customerID" => ids,
            "Contract" => contract,
            "tenure" => tenure,
            "Churn" => churn
        )
        .unwrap()
    }

    fn fitted() -> (FittedTransform, SelectedModel) {
        let (dataset, transform) = FeatureTransform::new(TransformConfig::default())
            .fit(&training_frame())
            .unwrap();
        let config = TrainingConfig::default().with_candidates(vec![CandidateKind::LogisticRegression]);
        let outcome = TrainEngine::new(config).train_and_select(&dataset).unwrap();
        (transform, outcome.selected)
    }

    #[test]
    fn test_one_row_per_customer() {
        let (transform, model) = fitted();
        let customers = df!(
            "customerID" => &["n1", "n2", "n3"],
            "Contract" => &["Month-to-month", "Two year", "One year"],
            "tenure" => &[1i64, 60, 12]
        )
        .unwrap();

        let batch = BatchPredictor::new(&transform, &model).predict(&customers).unwrap();
        assert_eq!(batch.len(), 3);
        let ids: Vec<&str> = batch.rows().iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n2", "n3"]);

        let date = &batch.rows()[0].prediction_date;
        for row in batch.rows() {
            assert!((0.0..=1.0).contains(&row.probability));
            assert_eq!(row.predicted_label, i32::from(row.probability >= DECISION_THRESHOLD));
            assert_eq!(&row.prediction_date, date);
        }
    }

    #[test]
    fn test_positions_stand_in_for_missing_ids() {
        let (transform, model) = fitted();
        let customers = df!(
            "Contract" => &["Two year", "Month-to-month"],
            "tenure" => &[40i64, 3]
        )
        .unwrap();

        let batch = BatchPredictor::new(&transform, &model).predict(&customers).unwrap();
        let ids: Vec<&str> = batch.rows().iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1"]);
    }

    #[test]
    fn test_missing_feature_column_fails() {
        let (transform, model) = fitted();
        let customers = df!("customerID" => &["n1"], "tenure" => &[5i64]).unwrap();
        let err = BatchPredictor::new(&transform, &model).predict(&customers).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SchemaMismatch { column } if column == "Contract"
        ));
    }

    #[test]
    fn test_refitted_transform_rejected_by_older_model() {
        let (_, model) = fitted();
        let (_, refitted) = FeatureTransform::default().fit(&training_frame_with("One year")).unwrap();
        assert_eq!(refitted.n_features(), model.n_features());

        let customers = df!(
            "customerID" => &["n1"],
            "Contract" => &["One year"],
            "tenure" => &[12i64]
        )
        .unwrap();
        let err = BatchPredictor::new(&refitted, &model).predict(&customers).unwrap_err();
        match err {
            PipelineError::ShapeError { expected, actual } => {
                assert!(expected.contains("Contract_Two year"));
                assert!(actual.contains("Contract_One year"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

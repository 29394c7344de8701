//! Batch inference
//!
//! Scores a table of new customers with the stored transform and model and
//! shapes the result into rows for the prediction history.

mod history;
mod predictor;

pub use history::PredictionHistory;
pub use predictor::BatchPredictor;

use crate::error::Result;
use crate::utils::DataSaver;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Probability at or above which a customer is predicted to churn
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Layout of `prediction_date`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column names of the prediction history, in stored order
pub const HISTORY_COLUMNS: [&str; 4] = [
    "customer_id",
    "predicted_label",
    "probability",
    "prediction_date",
];

/// One scored customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub customer_id: String,
    /// 1 when `probability >= DECISION_THRESHOLD`, otherwise 0
    pub predicted_label: i32,
    pub probability: f64,
    pub prediction_date: String,
}

/// All rows scored by one prediction run; they share one timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionBatch {
    rows: Vec<PredictionRow>,
}

impl PredictionBatch {
    pub fn new(rows: Vec<PredictionRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PredictionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows predicted to churn
    pub fn churners(&self) -> usize {
        self.rows.iter().filter(|r| r.predicted_label == 1).count()
    }

    pub fn to_frame(&self) -> Result<DataFrame> {
        let ids: Vec<&str> = self.rows.iter().map(|r| r.customer_id.as_str()).collect();
        let labels: Vec<i32> = self.rows.iter().map(|r| r.predicted_label).collect();
        let probabilities: Vec<f64> = self.rows.iter().map(|r| r.probability).collect();
        let dates: Vec<&str> = self.rows.iter().map(|r| r.prediction_date.as_str()).collect();

        let frame = DataFrame::new(vec![
            Column::new(HISTORY_COLUMNS[0].into(), ids),
            Column::new(HISTORY_COLUMNS[1].into(), labels),
            Column::new(HISTORY_COLUMNS[2].into(), probabilities),
            Column::new(HISTORY_COLUMNS[3].into(), dates),
        ])?;
        Ok(frame)
    }

    /// CSV encoding used by the history table
    pub fn to_csv_bytes(&self, include_header: bool) -> Result<Vec<u8>> {
        let mut frame = self.to_frame()?;
        DataSaver::to_csv_bytes(&mut frame, include_header)
    }
}

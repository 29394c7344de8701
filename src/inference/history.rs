//! Reading the prediction history back

use super::{PredictionRow, HISTORY_COLUMNS};
use crate::error::{PipelineError, Result};
use crate::preprocessing::{numeric_values, text_values};
use crate::utils::DataLoader;

/// Every prediction written so far, in the order it was appended
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionHistory {
    rows: Vec<PredictionRow>,
}

impl PredictionHistory {
    pub fn new(rows: Vec<PredictionRow>) -> Self {
        Self { rows }
    }

    /// Parse the history table. Every column is read as text first so
    /// identifiers such as `0042` survive unchanged.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        let frame = DataLoader::new()
            .with_infer_schema_length(0)
            .load_csv_bytes(bytes)?;

        let column = |name: &str| {
            frame
                .column(name)
                .map(|c| c.as_materialized_series().clone())
                .map_err(|_| PipelineError::SchemaMismatch {
                    column: name.to_string(),
                })
        };
        let ids = text_values(&column(HISTORY_COLUMNS[0])?)?;
        let labels = numeric_values(&column(HISTORY_COLUMNS[1])?)?;
        let probabilities = numeric_values(&column(HISTORY_COLUMNS[2])?)?;
        let dates = text_values(&column(HISTORY_COLUMNS[3])?)?;

        let rows = ids
            .into_iter()
            .zip(labels)
            .zip(probabilities)
            .zip(dates)
            .enumerate()
            .map(|(i, (((id, label), probability), date))| {
                let corrupt = |field: &str| {
                    PipelineError::DataError(format!(
                        "prediction history row {} has no valid {}",
                        i, field
                    ))
                };
                Ok(PredictionRow {
                    customer_id: id.unwrap_or_default(),
                    predicted_label: label.ok_or_else(|| corrupt("predicted_label"))? as i32,
                    probability: probability.ok_or_else(|| corrupt("probability"))?,
                    prediction_date: date.ok_or_else(|| corrupt("prediction_date"))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rows })
    }

    /// Rows in stored order
    pub fn rows(&self) -> &[PredictionRow] {
        &self.rows
    }

    /// Rows ordered by prediction date, newest first. Rows sharing a date
    /// keep their stored order.
    pub fn latest_first(&self) -> Vec<&PredictionRow> {
        let mut rows: Vec<&PredictionRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| b.prediction_date.cmp(&a.prediction_date));
        rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "customer_id,predicted_label,probability,prediction_date\n\
                         0042,1,0.81,2024-03-01 10:00:00\n\
                         0043,0,0.12,2024-03-01 10:00:00\n\
                         0007,0,0.33,2024-03-02 09:30:00\n";

    #[test]
    fn test_identifiers_stay_text() {
        let history = PredictionHistory::from_csv_bytes(TABLE.as_bytes()).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.rows()[0].customer_id, "0042");
        assert_eq!(history.rows()[0].predicted_label, 1);
        assert!((history.rows()[0].probability - 0.81).abs() < 1e-12);
    }

    #[test]
    fn test_latest_first_is_stable() {
        let history = PredictionHistory::from_csv_bytes(TABLE.as_bytes()).unwrap();
        let ids: Vec<&str> = history
            .latest_first()
            .iter()
            .map(|r| r.customer_id.as_str())
            .collect();
        assert_eq!(ids, vec!["0007", "0042", "0043"]);
    }

    #[test]
    fn test_missing_column_rejected() {
        let err = PredictionHistory::from_csv_bytes(b"customer_id,probability\na,0.5\n").unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { column } if column == "predicted_label"));
    }
}

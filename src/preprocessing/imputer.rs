//! Median imputation for numeric columns

use serde::{Deserialize, Serialize};

/// Per-column medians captured at fit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    medians: Vec<f64>,
}

impl MedianImputer {
    /// Learn one median per column from the values that are present.
    /// A column with no usable values falls back to 0.
    pub fn fit(columns: &[Vec<Option<f64>>]) -> Self {
        let medians = columns
            .iter()
            .map(|values| {
                let mut present: Vec<f64> = values.iter().flatten().copied().collect();
                median(&mut present).unwrap_or(0.0)
            })
            .collect();
        Self { medians }
    }

    pub fn medians(&self) -> &[f64] {
        &self.medians
    }

    /// Fill gaps in column `idx` with its fitted median
    pub fn fill(&self, idx: usize, values: &[Option<f64>]) -> Vec<f64> {
        let fallback = self.medians.get(idx).copied().unwrap_or(0.0);
        values.iter().map(|v| v.unwrap_or(fallback)).collect()
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_fill_uses_fitted_median() {
        let imputer = MedianImputer::fit(&[vec![Some(1.0), None, Some(5.0), Some(3.0)]]);
        assert_eq!(imputer.medians(), &[3.0]);

        let filled = imputer.fill(0, &[None, Some(100.0)]);
        assert_eq!(filled, vec![3.0, 100.0]);
    }

    #[test]
    fn test_empty_column_defaults_to_zero() {
        let imputer = MedianImputer::fit(&[vec![None, None]]);
        assert_eq!(imputer.fill(0, &[None]), vec![0.0]);
    }
}

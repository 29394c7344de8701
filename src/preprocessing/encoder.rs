//! One-hot encoding for categorical columns

use serde::{Deserialize, Serialize};

/// Indicator encoding learned from training categories.
///
/// Categories are kept sorted per column so the output layout does not
/// depend on row order. A value outside the learned set, or a missing
/// value, encodes as an all-zero block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn fit(columns: &[Vec<Option<String>>]) -> Self {
        let categories = columns
            .iter()
            .map(|values| {
                let mut seen: Vec<String> = values.iter().flatten().cloned().collect();
                seen.sort();
                seen.dedup();
                seen
            })
            .collect();
        Self { categories }
    }

    /// Learned categories of column `idx`
    pub fn categories(&self, idx: usize) -> &[String] {
        self.categories.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Width of the indicator block for column `idx`
    pub fn width(&self, idx: usize) -> usize {
        self.categories(idx).len()
    }

    /// Total number of indicator columns
    pub fn total_width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Position of `value` inside the block of column `idx`
    pub fn position(&self, idx: usize, value: Option<&str>) -> Option<usize> {
        let value = value?;
        self.categories(idx)
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Output names in `column_category` form
    pub fn feature_names(&self, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(column, cats)| cats.iter().map(move |c| format!("{}_{}", column, c)))
            .collect()
    }
}

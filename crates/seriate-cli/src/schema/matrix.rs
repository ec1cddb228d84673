use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// A matrix as an array of rows; `null` stands for a missing value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MatrixJson(pub Vec<Vec<Option<f64>>>);

impl MatrixJson {
    /// Converts to an array, with missing values as `NaN`.
    pub fn to_array(&self) -> anyhow::Result<Array2<f64>> {
        let rows = self.0.len();
        let cols = self.0.first().map_or(0, Vec::len);
        if let Some((index, row)) = self.0.iter().enumerate().find(|(_, row)| row.len() != cols) {
            anyhow::bail!(
                "Row {index} has {} values, expected {cols} like the first row",
                row.len()
            );
        }
        let values = self
            .0
            .iter()
            .flatten()
            .map(|value| value.unwrap_or(f64::NAN))
            .collect();
        Ok(Array2::from_shape_vec((rows, cols), values)?)
    }

    /// Converts from an array; `NaN` becomes `null`.
    #[must_use]
    pub fn from_array(array: ArrayView2<'_, f64>) -> Self {
        let rows = array
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .map(|&value| (!value.is_nan()).then_some(value))
                    .collect()
            })
            .collect();
        Self(rows)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_nulls_are_missing() {
        let matrix: MatrixJson = serde_json::from_str("[[1.0, null], [3, 4.5]]").unwrap();
        let array = matrix.to_array().unwrap();
        assert_eq!(array.dim(), (2, 2));
        assert!(array[[0, 1]].is_nan());
        assert_eq!(array[[1, 0]], 3.0);

        assert_eq!(MatrixJson::from_array(array.view()), matrix);
    }

    #[test]
    fn test_missing_values_serialize_as_null() {
        let array = array![[f64::NAN, 0.5]];
        let json = serde_json::to_string(&MatrixJson::from_array(array.view())).unwrap();
        assert_eq!(json, "[[null,0.5]]");
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let matrix: MatrixJson = serde_json::from_str("[[1.0, 2.0], [3.0]]").unwrap();
        let err = matrix.to_array().unwrap_err();
        assert!(err.to_string().contains("Row 1"));
    }

    #[test]
    fn test_empty_matrix() {
        let matrix: MatrixJson = serde_json::from_str("[]").unwrap();
        assert_eq!(matrix.to_array().unwrap().dim(), (0, 0));
    }
}

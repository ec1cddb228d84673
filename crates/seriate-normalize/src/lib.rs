//! Column-wise normalization of feature matrices
//!
//! This crate rescales every column of a feature matrix independently under
//! one of a fixed family of outlier-robust transforms ([`NormalizationSpec`]).
//! Missing values (`NaN`) never take part in fitting and stay missing in the
//! output.
//!
//! # Overview
//!
//! 1. **Choose a transform** ([`NormalizationSpec`]): parse it from its name or
//!    pick a variant; `None` falls back to [`NormalizationSpec::Sigmoid`]
//! 2. **Optionally restrict fitting** to a subset of rows with train indices
//!    (only [`NormalizationSpec::ScaledSQZScore`] accepts them)
//! 3. **Normalize** ([`normalize`]): parameters are fitted per column and
//!    applied to every row
//!
//! Degenerate columns (constant values, zero IQR, zero spread) follow fixed
//! per-transform policies and never fail, with the single exception of
//! [`NormalizationSpec::ScaledLog`], which reports
//! [`NormalizeError::DegenerateLogRange`].
//!
//! # Examples
//!
//! ```
//! use ndarray::array;
//! use seriate_normalize::{NormalizationSpec, normalize};
//!
//! let features = array![[1.0, 10.0], [2.0, f64::NAN], [4.0, 30.0]];
//! let normalized = normalize(features.view(), Some(NormalizationSpec::MaxMin), None)?;
//!
//! assert_eq!(normalized[[0, 0]], 0.0);
//! assert_eq!(normalized[[2, 0]], 1.0);
//! assert!(normalized[[1, 1]].is_nan());
//! # Ok::<(), seriate_normalize::NormalizeError>(())
//! ```
//!
//! Fitting on a training subset:
//!
//! ```
//! use ndarray::array;
//! use seriate_normalize::{NormalizationSpec, normalize};
//!
//! let features = array![[1.0], [2.0], [3.0], [4.0]];
//! let fitted = normalize(
//!     features.view(),
//!     Some(NormalizationSpec::ScaledSQZScore),
//!     Some(&[0, 2]),
//! )?;
//! assert_eq!(fitted.dim(), (4, 1));
//!
//! let err = normalize(features.view(), Some(NormalizationSpec::ScaledSigmoid), Some(&[0, 2]))
//!     .unwrap_err();
//! assert!(err.is_invalid_argument());
//! # Ok::<(), seriate_normalize::NormalizeError>(())
//! ```

use ndarray::{Array2, ArrayView2, Axis};

pub use self::{error::NormalizeError, spec::NormalizationSpec};

mod column;
mod error;
mod spec;

/// Normalizes every column of `features`, falling back to the default transform.
///
/// When `spec` is `None`, [`NormalizationSpec::default`] is used and an
/// informational event is emitted through `tracing`.
///
/// See [`normalize_with`] for the meaning of `train`.
pub fn normalize(
    features: ArrayView2<'_, f64>,
    spec: Option<NormalizationSpec>,
    train: Option<&[usize]>,
) -> Result<Array2<f64>, NormalizeError> {
    let spec = spec.unwrap_or_else(|| {
        let spec = NormalizationSpec::default();
        tracing::info!(%spec, "no normalization specified, using default");
        spec
    });
    normalize_with(features, spec, train)
}

/// Normalizes every column of `features` with `spec`.
///
/// `train` lists the rows used to fit location and scale; the fitted
/// transform is then applied to every row. It must be non-empty, free of
/// duplicates and in range, and is only accepted by
/// [`NormalizationSpec::ScaledSQZScore`].
///
/// All arguments are validated before any column is touched.
///
/// # Returns
///
/// A new matrix of the same shape as `features`.
pub fn normalize_with(
    features: ArrayView2<'_, f64>,
    spec: NormalizationSpec,
    train: Option<&[usize]>,
) -> Result<Array2<f64>, NormalizeError> {
    let (rows, cols) = features.dim();
    if let Some(train) = train {
        validate_train_indices(spec, train, rows)?;
    }
    tracing::debug!(%spec, rows, cols, train_rows = ?train.map(<[usize]>::len), "normalizing features");

    let mut normalized = features.to_owned();
    for (index, mut column) in normalized.axis_iter_mut(Axis(1)).enumerate() {
        column::apply(spec, &mut column, index, train)?;
    }
    Ok(normalized)
}

fn validate_train_indices(
    spec: NormalizationSpec,
    train: &[usize],
    rows: usize,
) -> Result<(), NormalizeError> {
    if !spec.supports_train_indices() {
        return Err(NormalizeError::TrainIndicesUnsupported { spec });
    }
    if train.is_empty() {
        return Err(NormalizeError::EmptyTrainIndices);
    }
    let mut seen = vec![false; rows];
    for &index in train {
        let slot = seen
            .get_mut(index)
            .ok_or(NormalizeError::TrainIndexOutOfRange { index, rows })?;
        if *slot {
            return Err(NormalizeError::DuplicateTrainIndex { index });
        }
        *slot = true;
    }
    Ok(())
}

//! Per-column transforms.
//!
//! Each transform fits its parameters on the non-missing values of a single
//! column and rewrites those values in place. Missing entries are left
//! untouched, so they stay missing in the output.

use ndarray::ArrayViewMut1;
use seriate_stats::{
    descriptive::DescriptiveStats,
    is_missing,
    percentiles::{self, interquartile_range},
    sorted_present,
};

use crate::{NormalizationSpec, NormalizeError};

/// Divisor turning an interquartile range into a normal-consistent scale.
const IQR_TO_SIGMA: f64 = 1.35;

/// Percentile band used to fit `scaledsigmoid5q`.
const TRIMMED_BAND: (f64, f64) = (5.0, 95.0);

type Column<'a> = ArrayViewMut1<'a, f64>;

/// Location and scale of a fitted affine standardization.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Location {
    center: f64,
    scale: f64,
}

impl Location {
    fn standard(stats: &DescriptiveStats) -> Self {
        Self {
            center: stats.mean,
            scale: stats.std_dev,
        }
    }

    /// Median and IQR-based scale, or `None` when the IQR vanishes.
    fn robust(sorted: &[f64]) -> Option<Self> {
        let scale = interquartile_range(sorted) / IQR_TO_SIGMA;
        if scale == 0.0 || !scale.is_finite() {
            return None;
        }
        Some(Self {
            center: percentiles::compute_percentile(sorted, 50.0),
            scale,
        })
    }

    fn standardize(self, x: f64) -> f64 {
        (x - self.center) / self.scale
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn map_present(column: &mut Column<'_>, f: impl Fn(f64) -> f64) {
    for x in column.iter_mut().filter(|x| !is_missing(**x)) {
        *x = f(*x);
    }
}

fn fill_missing(column: &mut Column<'_>) {
    column.fill(f64::NAN);
}

/// Rescales the non-missing values to `[0, 1]`.
///
/// A column without spread cannot be rescaled and is set to missing.
fn rescale_present(column: &mut Column<'_>) {
    let Some(stats) = DescriptiveStats::new(column.iter().copied()) else {
        return;
    };
    let range = stats.range();
    if range == 0.0 || !range.is_finite() {
        fill_missing(column);
        return;
    }
    map_present(column, |x| (x - stats.min) / range);
}

/// Logistic function of the fitted standardization, rescaled to `[0, 1]`.
fn scaled_sigmoid(column: &mut Column<'_>, location: Location) {
    map_present(column, |x| sigmoid(location.standardize(x)));
    rescale_present(column);
}

/// Robust branch when the IQR is usable, plain z-score branch otherwise.
fn scaled_two_ways(column: &mut Column<'_>, sorted: &[f64]) {
    if let Some(location) = Location::robust(sorted) {
        scaled_sigmoid(column, location);
    } else if let Some(stats) = DescriptiveStats::from_sorted(sorted) {
        scaled_sigmoid(column, Location::standard(&stats));
    }
}

/// Applies `spec` to a single column in place.
///
/// `index` is the column's position in the matrix and only feeds error
/// context. `train` has already been validated against the row count.
pub(crate) fn apply(
    spec: NormalizationSpec,
    column: &mut Column<'_>,
    index: usize,
    train: Option<&[usize]>,
) -> Result<(), NormalizeError> {
    let sorted = sorted_present(column.iter().copied());
    let Some(stats) = DescriptiveStats::from_sorted(&sorted) else {
        // nothing to fit, nothing to transform
        return Ok(());
    };

    match spec {
        NormalizationSpec::ZScore => {
            let location = Location::standard(&stats);
            map_present(column, |x| location.standardize(x));
        }
        NormalizationSpec::QZScore => match Location::robust(&sorted) {
            Some(location) => map_present(column, |x| location.standardize(x)),
            None => fill_missing(column),
        },
        NormalizationSpec::Sigmoid => {
            let location = Location::standard(&stats);
            map_present(column, |x| sigmoid(location.standardize(x)));
        }
        NormalizationSpec::SQZScore => match Location::robust(&sorted) {
            Some(location) => map_present(column, |x| sigmoid(location.standardize(x))),
            None => fill_missing(column),
        },
        NormalizationSpec::ScaledSigmoid => scaled_sigmoid(column, Location::standard(&stats)),
        NormalizationSpec::ScaledSigmoid5Q => {
            let band = percentiles::percentile_band(&sorted, TRIMMED_BAND.0, TRIMMED_BAND.1);
            match DescriptiveStats::from_sorted(band) {
                Some(band_stats) if band_stats.std_dev > 0.0 => {
                    scaled_sigmoid(column, Location::standard(&band_stats));
                }
                _ => fill_missing(column),
            }
        }
        NormalizationSpec::ScaledSQZScore => {
            let fit = match train {
                Some(rows) => sorted_present(rows.iter().map(|&row| column[row])),
                None => sorted,
            };
            match Location::robust(&fit) {
                Some(location) => scaled_sigmoid(column, location),
                None => fill_missing(column),
            }
        }
        NormalizationSpec::Scaled2Ways => scaled_two_ways(column, &sorted),
        NormalizationSpec::MixedSigmoid => {
            if stats.is_constant() {
                map_present(column, |_| 0.0);
            } else {
                scaled_two_ways(column, &sorted);
            }
        }
        NormalizationSpec::LDScaled => {
            if stats.is_constant() {
                map_present(column, |_| 0.0);
                return Ok(());
            }
            rescale_present(column);
            let rescaled = sorted_present(column.iter().copied());
            match DescriptiveStats::from_sorted(&rescaled) {
                Some(rescaled_stats) if rescaled_stats.std_dev > 0.0 => {
                    scaled_two_ways(column, &rescaled);
                }
                _ => map_present(column, |_| 0.0),
            }
        }
        NormalizationSpec::MaxMin => {
            if stats.is_constant() {
                fill_missing(column);
            } else {
                let range = stats.range();
                map_present(column, |x| (x - stats.min) / range);
            }
        }
        NormalizationSpec::ScaledLog => scaled_log(column, index, &sorted)?,
        NormalizationSpec::RelMean => map_present(column, |x| x / stats.mean),
    }
    Ok(())
}

fn scaled_log(column: &mut Column<'_>, index: usize, sorted: &[f64]) -> Result<(), NormalizeError> {
    let start = sorted.partition_point(|x| *x <= 0.0);
    let positive = &sorted[start..];
    let (Some(first), Some(last)) = (positive.first(), positive.last()) else {
        map_present(column, |_| 0.0);
        return Ok(());
    };
    let (min, max) = (first.ln(), last.ln());
    let range = max - min;
    if !(range.is_finite() && range > 0.0) {
        return Err(NormalizeError::DegenerateLogRange {
            column: index,
            min,
            max,
        });
    }
    map_present(column, |x| if x > 0.0 { (x.ln() - min) / range } else { 0.0 });
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::Array1;

    use super::*;

    fn run(spec: NormalizationSpec, values: &[f64]) -> Result<Vec<f64>, NormalizeError> {
        let mut column = Array1::from(values.to_vec());
        apply(spec, &mut column.view_mut(), 0, None)?;
        Ok(column.to_vec())
    }

    fn assert_all_missing(values: &[f64]) {
        assert!(values.iter().all(|x| x.is_nan()), "{values:?}");
    }

    #[test]
    fn test_zscore() {
        let out = run(NormalizationSpec::ZScore, &[1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(out[0], -1.0);
        assert_relative_eq!(out[1], 0.0);
        assert_relative_eq!(out[2], 1.0);
    }

    #[test]
    fn test_zscore_constant_propagates() {
        let out = run(NormalizationSpec::ZScore, &[4.0, 4.0]).unwrap();
        assert_all_missing(&out);
    }

    #[test]
    fn test_qzscore() {
        let out = run(NormalizationSpec::QZScore, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        // median 2.5, IQR 2.0
        assert_relative_eq!(out[0], (1.0 - 2.5) / (2.0 / 1.35));
        assert_relative_eq!(out[3], (4.0 - 2.5) / (2.0 / 1.35));
    }

    #[test]
    fn test_qzscore_zero_iqr_empties_column() {
        let out = run(NormalizationSpec::QZScore, &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 9.0]).unwrap();
        assert_all_missing(&out);
        let out = run(NormalizationSpec::SQZScore, &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 9.0]).unwrap();
        assert_all_missing(&out);
    }

    #[test]
    fn test_sigmoid_centers_at_half() {
        let out = run(NormalizationSpec::Sigmoid, &[1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(out[1], 0.5);
        assert_relative_eq!(out[0] + out[2], 1.0);
    }

    #[test]
    fn test_scaled_sigmoid_spans_unit_interval() {
        let out = run(NormalizationSpec::ScaledSigmoid, &[3.0, 1.0, 7.0, 2.0]).unwrap();
        assert_relative_eq!(out[1], 0.0);
        assert_relative_eq!(out[2], 1.0);
    }

    #[test]
    fn test_scaled_sigmoid_constant_is_missing() {
        let out = run(NormalizationSpec::ScaledSigmoid, &[5.0, 5.0, 5.0]).unwrap();
        assert_all_missing(&out);
    }

    #[test]
    fn test_scaled_sigmoid_5q_ignores_outliers_when_fitting() {
        let mut values = (1..=40).map(f64::from).collect::<Vec<_>>();
        values.push(1.0e6);
        let out = run(NormalizationSpec::ScaledSigmoid5Q, &values).unwrap();
        let plain = run(NormalizationSpec::ScaledSigmoid, &values).unwrap();
        // a trimmed fit keeps the bulk of the data spread out
        assert!(out[30] - out[10] > plain[30] - plain[10]);
        assert_relative_eq!(out[40], 1.0);
    }

    #[test]
    fn test_scaled_sigmoid_5q_constant_band_is_missing() {
        let out = run(NormalizationSpec::ScaledSigmoid5Q, &[2.0, 2.0, 2.0, 2.0]).unwrap();
        assert_all_missing(&out);
    }

    #[test]
    fn test_scaled_two_ways_falls_back_to_zscore() {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 9.0];
        let out = run(NormalizationSpec::Scaled2Ways, &values).unwrap();
        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[6], 1.0);
    }

    #[test]
    fn test_mixed_sigmoid_constant_and_empty() {
        let out = run(NormalizationSpec::MixedSigmoid, &[3.0, f64::NAN, 3.0]).unwrap();
        assert_eq!(out[0], 0.0);
        assert!(out[1].is_nan());
        assert_eq!(out[2], 0.0);

        let out = run(NormalizationSpec::MixedSigmoid, &[f64::NAN, f64::NAN]).unwrap();
        assert_all_missing(&out);
    }

    #[test]
    fn test_ld_scaled_constant_is_zero() {
        let out = run(NormalizationSpec::LDScaled, &[8.0, 8.0, 8.0]).unwrap();
        assert_eq!(out, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_ld_scaled_is_invariant_to_affine_input() {
        let a = run(NormalizationSpec::LDScaled, &[1.0, 2.0, 4.0, 8.0, 9.0]).unwrap();
        let b = run(NormalizationSpec::LDScaled, &[10.0, 20.0, 40.0, 80.0, 90.0]).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_relative_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_max_min() {
        let out = run(NormalizationSpec::MaxMin, &[2.0, 4.0, f64::NAN, 6.0]).unwrap();
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.5);
        assert!(out[2].is_nan());
        assert_eq!(out[3], 1.0);

        let out = run(NormalizationSpec::MaxMin, &[2.0, 2.0]).unwrap();
        assert_all_missing(&out);
    }

    #[test]
    fn test_scaled_log() {
        let out = run(NormalizationSpec::ScaledLog, &[1.0, 10.0, 100.0, -3.0, 0.0]).unwrap();
        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 0.5);
        assert_relative_eq!(out[2], 1.0);
        assert_eq!(out[3], 0.0);
        assert_eq!(out[4], 0.0);
    }

    #[test]
    fn test_scaled_log_without_positive_entries() {
        let out = run(NormalizationSpec::ScaledLog, &[-1.0, 0.0, f64::NAN]).unwrap();
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
        assert!(out[2].is_nan());
    }

    #[test]
    fn test_scaled_log_zero_range_is_invariant_violation() {
        let mut column = Array1::from(vec![5.0, -1.0, 5.0]);
        let err = apply(
            NormalizationSpec::ScaledLog,
            &mut column.view_mut(),
            7,
            None,
        )
        .unwrap_err();
        assert!(err.is_invariant_violation());
        let NormalizeError::DegenerateLogRange { column, min, max } = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(column, 7);
        assert_relative_eq!(min, 5.0_f64.ln());
        assert_relative_eq!(max, 5.0_f64.ln());
    }

    #[test]
    fn test_rel_mean() {
        let out = run(NormalizationSpec::RelMean, &[1.0, f64::NAN, 3.0]).unwrap();
        assert_eq!(out[0], 0.5);
        assert!(out[1].is_nan());
        assert_eq!(out[2], 1.5);
    }
}

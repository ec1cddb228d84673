/// Computes a single percentile value from sorted data.
///
/// The i-th smallest of `n` values (1-based) is taken to sit at percentile
/// `100 * (i - 0.5) / n`. Percentiles between two such positions are linearly
/// interpolated; percentiles outside the first/last position clamp to the
/// minimum/maximum.
///
/// # Returns
///
/// The value at the specified percentile. Returns `f64::NAN` if the input is empty.
///
/// # Examples
///
/// ```
/// use seriate_stats::percentiles::compute_percentile;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0];
///
/// assert_eq!(compute_percentile(&values, 50.0), 2.5);
/// assert_eq!(compute_percentile(&values, 25.0), 1.5);
/// assert_eq!(compute_percentile(&values, 0.0), 1.0);
/// assert_eq!(compute_percentile(&values, 100.0), 4.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    let Some((&first, &last)) = sorted_values.first().zip(sorted_values.last()) else {
        return f64::NAN;
    };
    let n = sorted_values.len();
    // 1-based fractional rank
    let rank = percentile / 100.0 * n as f64 + 0.5;
    if rank <= 1.0 {
        return first;
    }
    if rank >= n as f64 {
        return last;
    }
    let lower = rank.floor();
    let frac = rank - lower;
    let idx = lower as usize - 1;
    let (lo, hi) = (sorted_values[idx], sorted_values[idx + 1]);
    lo + frac * (hi - lo)
}

/// Computes the interquartile range (`P75 - P25`) of sorted data.
///
/// Returns `f64::NAN` if the input is empty.
///
/// # Examples
///
/// ```
/// use seriate_stats::percentiles::interquartile_range;
///
/// assert_eq!(interquartile_range(&[1.0, 2.0, 3.0, 4.0]), 2.0);
/// assert_eq!(interquartile_range(&[7.0, 7.0, 7.0]), 0.0);
/// ```
#[must_use]
pub fn interquartile_range(sorted_values: &[f64]) -> f64 {
    compute_percentile(sorted_values, 75.0) - compute_percentile(sorted_values, 25.0)
}

/// Returns the sub-slice of sorted data lying within the `[lower, upper]`
/// percentile band (inclusive on both ends).
///
/// # Examples
///
/// ```
/// use seriate_stats::percentiles::percentile_band;
///
/// let values: Vec<f64> = (1..=20).map(f64::from).collect();
/// let band = percentile_band(&values, 5.0, 95.0);
/// assert_eq!(band.first(), Some(&2.0));
/// assert_eq!(band.last(), Some(&19.0));
/// ```
#[must_use]
pub fn percentile_band(sorted_values: &[f64], lower: f64, upper: f64) -> &[f64] {
    let lo = compute_percentile(sorted_values, lower);
    let hi = compute_percentile(sorted_values, upper);
    let start = sorted_values.partition_point(|v| *v < lo);
    let end = sorted_values.partition_point(|v| *v <= hi);
    &sorted_values[start..end.max(start)]
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_empty_is_nan() {
        assert!(compute_percentile(&[], 50.0).is_nan());
        assert!(interquartile_range(&[]).is_nan());
    }

    #[test]
    fn test_single_value() {
        assert_eq!(compute_percentile(&[3.0], 5.0), 3.0);
        assert_eq!(compute_percentile(&[3.0], 95.0), 3.0);
        assert_eq!(interquartile_range(&[3.0]), 0.0);
    }

    #[test]
    fn test_two_values_quartiles() {
        let values = [1.0, 3.0];
        assert_eq!(compute_percentile(&values, 25.0), 1.0);
        assert_eq!(compute_percentile(&values, 50.0), 2.0);
        assert_eq!(compute_percentile(&values, 75.0), 3.0);
    }

    #[test]
    fn test_interpolation() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        // ranks sit at 10%, 30%, 50%, 70%, 90%
        assert_relative_eq!(compute_percentile(&values, 20.0), 15.0);
        assert_relative_eq!(compute_percentile(&values, 60.0), 35.0);
        assert_relative_eq!(compute_percentile(&values, 95.0), 50.0);
    }

    #[test]
    fn test_band_drops_tails() {
        let mut values: Vec<f64> = (0..100).map(f64::from).collect();
        values.push(1000.0);
        values.insert(0, -1000.0);
        let band = percentile_band(&values, 5.0, 95.0);
        assert!(!band.contains(&1000.0));
        assert!(!band.contains(&-1000.0));
        assert!(band.contains(&50.0));
    }

    #[test]
    fn test_band_of_constant_keeps_everything() {
        let values = [2.0; 6];
        assert_eq!(percentile_band(&values, 5.0, 95.0).len(), 6);
    }
}

//! Missing-aware statistics shared by the seriate crates.
//!
//! Every function in this crate treats `NaN` as a missing value: missing
//! entries are skipped when computing a statistic instead of poisoning it.
//!
//! # Modules
//!
//! - [`descriptive`]: Count, min, max, mean, median, sample variance and standard deviation
//! - [`percentiles`]: Interpolated percentiles, interquartile range and percentile bands
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use seriate_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, f64::NAN, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.count, 5);
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Computing percentiles
//!
//! ```
//! use seriate_stats::{percentiles::{compute_percentile, interquartile_range}, sorted_present};
//!
//! let sorted = sorted_present([4.0, f64::NAN, 2.0, 1.0, 3.0]);
//! assert_eq!(compute_percentile(&sorted, 50.0), 2.5);
//! assert_eq!(compute_percentile(&sorted, 25.0), 1.5);
//! assert_eq!(interquartile_range(&sorted), 2.0);
//! ```

pub mod descriptive;
pub mod percentiles;

/// Returns `true` if `value` is the missing-value marker.
#[must_use]
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// Collects the non-missing values of `values` in ascending order.
///
/// # Examples
///
/// ```
/// let sorted = seriate_stats::sorted_present([3.0, f64::NAN, 1.0, 2.0]);
/// assert_eq!(sorted, vec![1.0, 2.0, 3.0]);
/// ```
#[must_use]
pub fn sorted_present<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sorted = values
        .into_iter()
        .filter(|v| !is_missing(*v))
        .collect::<Vec<_>>();
    sorted.sort_by(f64::total_cmp);
    sorted
}

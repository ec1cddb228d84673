use std::str::FromStr;

use crate::NormalizeError;

/// Column-wise normalization transforms.
///
/// Each variant names one transform applied independently to every column
/// of a feature matrix. Missing values never take part in fitting.
///
/// The textual names are the ones accepted by [`FromStr`] and produced by
/// [`Display`](std::fmt::Display); they are case-sensitive.
///
/// # Examples
///
/// ```
/// use seriate_normalize::NormalizationSpec;
///
/// let spec: NormalizationSpec = "scaledSQzscore".parse().unwrap();
/// assert_eq!(spec, NormalizationSpec::ScaledSQZScore);
/// assert_eq!(spec.to_string(), "scaledSQzscore");
/// assert_eq!(NormalizationSpec::default(), NormalizationSpec::Sigmoid);
/// assert!("ZSCORE".parse::<NormalizationSpec>().is_err());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum NormalizationSpec {
    /// `(x - mean) / std`
    #[display("zscore")]
    ZScore,
    /// `(x - median) / (IQR / 1.35)`; zero IQR empties the column
    #[display("Qzscore")]
    QZScore,
    /// Logistic function of the z-score
    #[default]
    #[display("sigmoid")]
    Sigmoid,
    /// Logistic function of the robust z-score
    #[display("SQzscore")]
    SQZScore,
    /// Logistic function of the z-score, rescaled to `[0, 1]`
    #[display("scaledsigmoid")]
    ScaledSigmoid,
    /// Like [`Self::ScaledSigmoid`], fitting mean and std on the P5-P95 band only
    #[display("scaledsigmoid5q")]
    ScaledSigmoid5Q,
    /// Logistic function of the robust z-score, rescaled to `[0, 1]`.
    ///
    /// The only transform that accepts train indices.
    #[display("scaledSQzscore")]
    ScaledSQZScore,
    /// Robust z-score when the IQR is non-zero, plain z-score otherwise,
    /// then logistic function and rescale to `[0, 1]`
    #[display("scaled2ways")]
    Scaled2Ways,
    /// [`Self::Scaled2Ways`] with constant columns mapped to zero
    #[display("MixedSigmoid")]
    MixedSigmoid,
    /// Linear rescale to `[0, 1]` followed by [`Self::Scaled2Ways`]
    #[display("LDscaled")]
    LDScaled,
    /// `(x - min) / (max - min)`; constant columns are emptied
    #[display("maxmin")]
    MaxMin,
    /// Logarithm of positive entries rescaled to `[0, 1]`; non-positive entries become zero
    #[display("scaledlog")]
    ScaledLog,
    /// `x / mean`
    #[display("relmean")]
    RelMean,
}

impl NormalizationSpec {
    /// All transforms, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::ZScore,
        Self::QZScore,
        Self::Sigmoid,
        Self::SQZScore,
        Self::ScaledSigmoid,
        Self::ScaledSigmoid5Q,
        Self::ScaledSQZScore,
        Self::Scaled2Ways,
        Self::MixedSigmoid,
        Self::LDScaled,
        Self::MaxMin,
        Self::ScaledLog,
        Self::RelMean,
    ];

    /// Returns `true` if this transform can be fitted on a subset of rows.
    #[must_use]
    pub fn supports_train_indices(self) -> bool {
        matches!(self, Self::ScaledSQZScore)
    }

    /// Returns `true` if every non-missing output of this transform lies in `[0, 1]`.
    #[must_use]
    pub fn is_unit_bounded(self) -> bool {
        !matches!(self, Self::ZScore | Self::QZScore | Self::RelMean)
    }
}

impl FromStr for NormalizationSpec {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|spec| spec.to_string() == s)
            .ok_or_else(|| NormalizeError::UnknownSpec {
                name: s.to_owned(),
            })
    }
}

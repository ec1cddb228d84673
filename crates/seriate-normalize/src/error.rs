use crate::NormalizationSpec;

/// Errors produced while normalizing a feature matrix.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum NormalizeError {
    #[display("unknown normalization '{name}'")]
    UnknownSpec { name: String },
    #[display("train indices are only supported by scaledSQzscore, not {spec}")]
    TrainIndicesUnsupported { spec: NormalizationSpec },
    #[display("train indices must not be empty")]
    EmptyTrainIndices,
    #[display("train index {index} is out of range for {rows} rows")]
    TrainIndexOutOfRange { index: usize, rows: usize },
    #[display("train index {index} is listed more than once")]
    DuplicateTrainIndex { index: usize },
    /// `scaledlog` found positive entries whose logarithms do not span a usable range.
    #[display("scaledlog produced a degenerate log range [{min}, {max}] in column {column}")]
    DegenerateLogRange { column: usize, min: f64, max: f64 },
}

impl NormalizeError {
    /// Returns `true` for errors caused by the caller's arguments.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        !self.is_invariant_violation()
    }

    /// Returns `true` for errors caused by a transform reaching a state it cannot represent.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::DegenerateLogRange { .. })
    }
}

/// Errors produced while building distances, linkage trees and leaf orders.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ClusterError {
    #[display("unknown distance metric '{name}'")]
    UnknownMetric { name: String },
    #[display("unknown linkage method '{name}'")]
    UnknownLinkage { name: String },
    #[display("distance matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[display("condensed distance vector of length {len} does not match any item count")]
    InvalidCondensedLength { len: usize },
    #[display("distance matrix still contains missing entries")]
    MissingDistances,
    #[display("merge #{merge} references a cluster that does not exist yet or was already merged")]
    MalformedTree { merge: usize },
    #[display("linkage tree has {leaves} leaves but the distance matrix has {items} items")]
    LeafCountMismatch { leaves: usize, items: usize },
    #[display("distance between items {row} and {col} is not finite")]
    NonFiniteDistance { row: usize, col: usize },
}

impl ClusterError {
    /// Returns `true` for errors caused by the caller's arguments.
    ///
    /// The remaining errors come from optimal leaf ordering, which
    /// [`reorder`](crate::reorder::reorder) recovers from by falling back to
    /// the natural leaf order.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::UnknownMetric { .. }
                | Self::UnknownLinkage { .. }
                | Self::NotSquare { .. }
                | Self::InvalidCondensedLength { .. }
                | Self::MissingDistances
                | Self::MalformedTree { .. }
        )
    }
}

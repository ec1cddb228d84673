use chrono::{DateTime, Utc};
use seriate_cluster::linkage::Merge;
use serde::{Deserialize, Serialize};

use super::matrix::MatrixJson;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NormalizedMatrix {
    pub generated_at: DateTime<Utc>,
    pub spec: String,
    pub matrix: MatrixJson,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReorderResult {
    pub generated_at: DateTime<Utc>,
    /// `None` when the input already held distances
    pub metric: Option<String>,
    pub linkage: String,
    pub leaf_ordering: String,
    pub order: Vec<usize>,
    pub keep: Vec<bool>,
    pub removed: usize,
    /// Distances between the kept items
    pub distances: MatrixJson,
    pub linkage_tree: Vec<MergeJson>,
}

/// One row of the linkage tree, ids as in `seriate_cluster::linkage`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct MergeJson {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: usize,
}

impl From<&Merge> for MergeJson {
    fn from(merge: &Merge) -> Self {
        let Merge {
            left,
            right,
            distance,
            size,
        } = *merge;
        Self {
            left,
            right,
            distance,
            size,
        }
    }
}

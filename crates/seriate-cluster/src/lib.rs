//! Seriation by hierarchical clustering
//!
//! This crate reorders a set of items so that similar items sit next to each
//! other. Items are described either by a feature matrix (one row per item)
//! or directly by their pairwise distances.
//!
//! # Overview
//!
//! - [`distance`]: square and condensed distance matrices, and the row
//!   [`Metric`](distance::Metric)s used to build them from features
//! - [`repair`]: drops items until no distance is missing
//! - [`linkage`]: agglomerative clustering into a
//!   [`LinkageTree`](linkage::LinkageTree)
//! - [`ordering`]: dendrogram and optimal leaf orders of a tree
//! - [`reorder`]: the whole pipeline in one call
//!
//! Missing values are `NaN` throughout, as in `seriate-stats`.
//!
//! # Examples
//!
//! ```
//! use ndarray::array;
//! use seriate_cluster::{
//!     distance::Metric,
//!     reorder::{LeafOrdering, ReorderInput, ReorderOptions, reorder},
//! };
//!
//! let nan = f64::NAN;
//! let features = array![
//!     [0.0, 0.0],
//!     [5.0, 5.0],
//!     [0.5, 0.0],
//!     [nan, 1.0],
//! ];
//! let options = ReorderOptions {
//!     metric: Metric::Euclidean,
//!     ..ReorderOptions::default()
//! };
//! let reordering = reorder(ReorderInput::Features(features.view()), &options)?;
//!
//! // item 3 has no usable distance and is dropped
//! assert_eq!(reordering.keep, vec![true, true, true, false]);
//! assert_eq!(reordering.order.len(), 3);
//! assert_eq!(reordering.leaf_ordering, LeafOrdering::Optimal);
//! # Ok::<(), seriate_cluster::ClusterError>(())
//! ```

pub use self::error::ClusterError;

pub mod distance;
mod error;
pub mod linkage;
pub mod ordering;
pub mod repair;
pub mod reorder;

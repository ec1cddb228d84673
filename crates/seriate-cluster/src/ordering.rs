//! Leaf orders of a linkage tree
//!
//! Any leaf order compatible with a [`LinkageTree`] is obtained by choosing,
//! at every merge, which child is laid out first. [`dendrogram_order`] always
//! lays out the left child first. [`optimal_leaf_order`] chooses the
//! orientations that minimize the sum of distances between adjacent leaves
//! ([`ordering_cost`]), using the dynamic programme of Bar-Joseph, Gifford
//! and Jaakkola (2001) in `O(n³)` time and `O(n²)` memory.

use std::ops::Range;

use ndarray::Array2;

use crate::{ClusterError, distance::DistanceMatrix, linkage::LinkageTree};

/// Positions of the leaves of every cluster in the dendrogram order.
///
/// Indexed by cluster id; the leaves of a cluster are always contiguous.
fn subtree_ranges(tree: &LinkageTree) -> Vec<Range<usize>> {
    let n = tree.leaves();
    let mut sizes = vec![1; n];
    for merge in tree.merges() {
        sizes.push(sizes[merge.left] + sizes[merge.right]);
    }

    let mut ranges = vec![0..0; sizes.len()];
    if let Some(root) = tree.root() {
        ranges[root] = 0..n;
    }
    // parents have larger ids than their children
    for (k, merge) in tree.merges().iter().enumerate().rev() {
        let Range { start, end } = ranges[n + k].clone();
        let mid = start + sizes[merge.left];
        ranges[merge.left] = start..mid;
        ranges[merge.right] = mid..end;
    }
    ranges
}

/// Leaf order given by a depth-first traversal, left child first.
///
/// # Examples
///
/// ```
/// use ndarray::aview1;
/// use seriate_cluster::{
///     distance::DistanceMatrix,
///     linkage::{LinkageMethod, linkage},
///     ordering::dendrogram_order,
/// };
///
/// let distances = DistanceMatrix::from_condensed(aview1(&[5.0, 1.0, 6.0]))?;
/// let tree = linkage(&distances, LinkageMethod::Single)?;
/// // 0 and 2 merge first, then item 1 (id 1) joins cluster 3
/// assert_eq!(dendrogram_order(&tree), vec![1, 0, 2]);
/// # Ok::<(), seriate_cluster::ClusterError>(())
/// ```
#[must_use]
pub fn dendrogram_order(tree: &LinkageTree) -> Vec<usize> {
    let ranges = subtree_ranges(tree);
    let mut order = vec![0; tree.leaves()];
    for (leaf, range) in ranges.iter().take(tree.leaves()).enumerate() {
        order[range.start] = leaf;
    }
    order
}

/// Sum of the distances between adjacent items of `order`.
///
/// # Examples
///
/// ```
/// use ndarray::aview1;
/// use seriate_cluster::{distance::DistanceMatrix, ordering::ordering_cost};
///
/// let distances = DistanceMatrix::from_condensed(aview1(&[1.0, 2.0, 3.0]))?;
/// assert_eq!(ordering_cost(&[0, 1, 2], &distances), 4.0);
/// assert_eq!(ordering_cost(&[1, 0, 2], &distances), 3.0);
/// # Ok::<(), seriate_cluster::ClusterError>(())
/// ```
#[must_use]
pub fn ordering_cost(order: &[usize], distances: &DistanceMatrix) -> f64 {
    order
        .windows(2)
        .map(|pair| distances.get(pair[0], pair[1]))
        .sum()
}

/// Tree-compatible leaf order with the smallest [`ordering_cost`].
///
/// # Errors
///
/// Fails if the tree and the matrix disagree on the number of items, or if
/// an off-diagonal distance is not finite.
pub fn optimal_leaf_order(
    tree: &LinkageTree,
    distances: &DistanceMatrix,
) -> Result<Vec<usize>, ClusterError> {
    let n = tree.leaves();
    if distances.len() != n {
        return Err(ClusterError::LeafCountMismatch {
            leaves: n,
            items: distances.len(),
        });
    }
    for row in 0..n {
        for col in row + 1..n {
            if !distances.get(row, col).is_finite() {
                return Err(ClusterError::NonFiniteDistance { row, col });
            }
        }
    }
    if n <= 2 {
        return Ok(dendrogram_order(tree));
    }

    let ordering = OptimalOrdering::new(tree, distances);
    let costs = ordering.fill_costs();
    let order = ordering.trace_back(&costs);
    tracing::debug!(
        items = n,
        cost = ordering_cost(&order, distances),
        "computed optimal leaf order"
    );
    Ok(order)
}

struct OptimalOrdering<'a> {
    tree: &'a LinkageTree,
    distances: &'a DistanceMatrix,
    ranges: Vec<Range<usize>>,
    natural: Vec<usize>,
}

impl<'a> OptimalOrdering<'a> {
    fn new(tree: &'a LinkageTree, distances: &'a DistanceMatrix) -> Self {
        let ranges = subtree_ranges(tree);
        let natural = dendrogram_order(tree);
        Self {
            tree,
            distances,
            ranges,
            natural,
        }
    }

    fn leaves_of(&self, cluster: usize) -> &[usize] {
        &self.natural[self.ranges[cluster].clone()]
    }

    /// The child of `cluster` that contains `leaf`, and the other child.
    fn split(&self, cluster: usize, leaf: usize) -> Option<(usize, usize)> {
        let (left, right) = self.tree.children(cluster)?;
        if self.ranges[left].contains(&self.ranges[leaf].start) {
            Some((left, right))
        } else {
            Some((right, left))
        }
    }

    /// Leaves that can end an ordering of `cluster` starting at `leaf`.
    fn opposite_leaves(&self, cluster: usize, leaf: usize) -> &[usize] {
        match self.split(cluster, leaf) {
            Some((_, other)) => self.leaves_of(other),
            None => self.leaves_of(cluster),
        }
    }

    /// `costs[[u, w]]` is the cheapest ordering of the smallest cluster
    /// containing both `u` and `w` that starts at `u` and ends at `w`.
    fn fill_costs(&self) -> Array2<f64> {
        let n = self.tree.leaves();
        let mut costs = Array2::zeros((n, n));
        let mut via = Vec::new();

        for merge in self.tree.merges() {
            let (left, right) = (merge.left, merge.right);
            let right_leaves = self.leaves_of(right);
            for &u in self.leaves_of(left) {
                // cheapest way from u through the left cluster to each right leaf k
                via.clear();
                via.extend(right_leaves.iter().map(|&k| {
                    self.opposite_leaves(left, u)
                        .iter()
                        .map(|&m| costs[[u, m]] + self.distances.get(m, k))
                        .fold(f64::INFINITY, f64::min)
                }));
                for &w in right_leaves {
                    let best = self
                        .opposite_leaves(right, w)
                        .iter()
                        .map(|&k| {
                            let pos = self.ranges[k].start - self.ranges[right].start;
                            via[pos] + costs[[k, w]]
                        })
                        .fold(f64::INFINITY, f64::min);
                    costs[[u, w]] = best;
                    costs[[w, u]] = best;
                }
            }
        }
        costs
    }

    /// Best pair `(x, y)` joining an ordering of `first_child` that starts at
    /// `first` with an ordering of `last_child` that ends at `last`.
    fn best_junction(
        &self,
        costs: &Array2<f64>,
        (first_child, first): (usize, usize),
        (last_child, last): (usize, usize),
    ) -> (usize, usize) {
        let mut best = (first, last);
        let mut best_cost = f64::INFINITY;
        for &x in self.opposite_leaves(first_child, first) {
            for &y in self.opposite_leaves(last_child, last) {
                let cost = costs[[first, x]] + self.distances.get(x, y) + costs[[y, last]];
                if cost < best_cost {
                    best_cost = cost;
                    best = (x, y);
                }
            }
        }
        best
    }

    fn trace_back(&self, costs: &Array2<f64>) -> Vec<usize> {
        let Some(root) = self.tree.root() else {
            return vec![];
        };
        let Some((left, right)) = self.tree.children(root) else {
            return vec![root];
        };

        let mut endpoints = (self.leaves_of(left)[0], self.leaves_of(right)[0]);
        let mut best_cost = f64::INFINITY;
        for &u in self.leaves_of(left) {
            for &w in self.leaves_of(right) {
                if costs[[u, w]] < best_cost {
                    best_cost = costs[[u, w]];
                    endpoints = (u, w);
                }
            }
        }

        let mut order = Vec::with_capacity(self.tree.leaves());
        let mut stack = vec![(root, endpoints.0, endpoints.1)];
        while let Some((cluster, first, last)) = stack.pop() {
            let Some((first_child, last_child)) = self.split(cluster, first) else {
                order.push(first);
                continue;
            };
            let (x, y) = self.best_junction(costs, (first_child, first), (last_child, last));
            stack.push((last_child, y, last));
            stack.push((first_child, first, x));
        }
        order
    }
}

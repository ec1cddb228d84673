//! Agglomerative hierarchical clustering
//!
//! [`linkage`] merges the two closest clusters until a single cluster is
//! left, recording every merge in a [`LinkageTree`]. Distances from a freshly
//! merged cluster to the others follow the Lance-Williams update of the
//! chosen [`LinkageMethod`].
//!
//! # Cluster ids
//!
//! For `n` items, ids `0..n` are the items themselves and id `n + k` is the
//! cluster created by merge `k`.
//!
//! ```text
//!          6 (merge 2)
//!         / \
//!        4   5 (merge 1)
//!       / \ / \
//!      0  1 2  3
//! ```

use std::str::FromStr;

use crate::{
    ClusterError,
    distance::{DistanceMatrix, condensed_index},
};

/// Rule for the distance between a merged cluster and the other clusters.
///
/// `centroid`, `median` and `ward` assume Euclidean input distances.
/// `centroid` and `median` may produce merge distances that decrease.
///
/// # Examples
///
/// ```
/// use seriate_cluster::linkage::LinkageMethod;
///
/// assert_eq!(LinkageMethod::default(), LinkageMethod::Average);
/// assert_eq!("ward".parse::<LinkageMethod>()?, LinkageMethod::Ward);
/// assert!("upgma".parse::<LinkageMethod>().is_err());
/// # Ok::<(), seriate_cluster::ClusterError>(())
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum LinkageMethod {
    /// Nearest members
    #[display("single")]
    Single,
    /// Farthest members
    #[display("complete")]
    Complete,
    /// Size-weighted mean distance (UPGMA)
    #[default]
    #[display("average")]
    Average,
    /// Unweighted mean of the two merged clusters' distances (WPGMA)
    #[display("weighted")]
    Weighted,
    /// Distance between centroids (UPGMC)
    #[display("centroid")]
    Centroid,
    /// Distance between midpoints of merged clusters (WPGMC)
    #[display("median")]
    Median,
    /// Minimum increase of within-cluster variance
    #[display("ward")]
    Ward,
}

impl LinkageMethod {
    pub const ALL: [Self; 7] = [
        Self::Single,
        Self::Complete,
        Self::Average,
        Self::Weighted,
        Self::Centroid,
        Self::Median,
        Self::Ward,
    ];

    /// Lance-Williams update.
    ///
    /// Distance from cluster `k` to the union of `a` and `b`, given the
    /// distances `d_ak`, `d_bk`, `d_ab` and the cluster sizes.
    #[expect(clippy::cast_precision_loss)]
    fn update(self, d_ak: f64, d_bk: f64, d_ab: f64, sizes: [usize; 3]) -> f64 {
        let [n_a, n_b, n_k] = sizes.map(|size| size as f64);
        match self {
            Self::Single => d_ak.min(d_bk),
            Self::Complete => d_ak.max(d_bk),
            Self::Average => (n_a * d_ak + n_b * d_bk) / (n_a + n_b),
            Self::Weighted => f64::midpoint(d_ak, d_bk),
            Self::Centroid => {
                let n_ab = n_a + n_b;
                let sq = (n_a * d_ak * d_ak + n_b * d_bk * d_bk) / n_ab
                    - n_a * n_b * d_ab * d_ab / (n_ab * n_ab);
                sq.max(0.0).sqrt()
            }
            Self::Median => {
                let sq = d_ak * d_ak / 2.0 + d_bk * d_bk / 2.0 - d_ab * d_ab / 4.0;
                sq.max(0.0).sqrt()
            }
            Self::Ward => {
                let sq = ((n_a + n_k) * d_ak * d_ak + (n_b + n_k) * d_bk * d_bk
                    - n_k * d_ab * d_ab)
                    / (n_a + n_b + n_k);
                sq.max(0.0).sqrt()
            }
        }
    }
}

impl FromStr for LinkageMethod {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.to_string() == s)
            .ok_or_else(|| ClusterError::UnknownLinkage { name: s.to_owned() })
    }
}

/// A single merge of two clusters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// The smaller of the two merged cluster ids
    pub left: usize,
    /// The larger of the two merged cluster ids
    pub right: usize,
    /// Distance between the merged clusters
    pub distance: f64,
    /// Number of items in the merged cluster
    pub size: usize,
}

/// Merge history of an agglomerative clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkageTree {
    leaves: usize,
    merges: Vec<Merge>,
}

impl LinkageTree {
    /// Builds a tree from an explicit merge list.
    ///
    /// Every merge must reference ids that already exist and have not been
    /// merged before, and a non-empty tree must end in a single root.
    pub fn from_merges(leaves: usize, merges: Vec<Merge>) -> Result<Self, ClusterError> {
        if merges.len() != leaves.saturating_sub(1) {
            return Err(ClusterError::MalformedTree {
                merge: merges.len().min(leaves.saturating_sub(1)),
            });
        }
        let mut used = vec![false; leaves + merges.len()];
        for (k, merge) in merges.iter().enumerate() {
            let available = leaves + k;
            for id in [merge.left, merge.right] {
                if id >= available || used[id] {
                    return Err(ClusterError::MalformedTree { merge: k });
                }
                used[id] = true;
            }
        }
        Ok(Self { leaves, merges })
    }

    /// Number of items (leaves).
    #[must_use]
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    #[must_use]
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Id of the root cluster, or `None` for an empty tree.
    #[must_use]
    pub fn root(&self) -> Option<usize> {
        match self.leaves {
            0 => None,
            n => Some(n - 1 + self.merges.len()),
        }
    }

    /// The two clusters merged into `id`, or `None` if `id` is a leaf.
    #[must_use]
    pub fn children(&self, id: usize) -> Option<(usize, usize)> {
        let merge = self.merges.get(id.checked_sub(self.leaves)?)?;
        Some((merge.left, merge.right))
    }
}

/// Nearest active neighbour with a larger slot index.
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    slot: usize,
    distance: f64,
}

/// Working state of the clustering: condensed distances between slots.
///
/// A merged cluster takes over the slot of its larger-indexed member.
struct Clustering {
    n: usize,
    distances: Vec<f64>,
    active: Vec<bool>,
    sizes: Vec<usize>,
    ids: Vec<usize>,
    nearest: Vec<Option<Neighbor>>,
}

impl Clustering {
    fn new(distances: &DistanceMatrix) -> Self {
        let n = distances.len();
        let mut clustering = Self {
            n,
            distances: distances.to_condensed(),
            active: vec![true; n],
            sizes: vec![1; n],
            ids: (0..n).collect(),
            nearest: vec![None; n],
        };
        for i in 0..n {
            clustering.refresh_nearest(i);
        }
        clustering
    }

    fn distance(&self, i: usize, j: usize) -> f64 {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        self.distances[condensed_index(self.n, i, j)]
    }

    fn set_distance(&mut self, i: usize, j: usize, d: f64) {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        self.distances[condensed_index(self.n, i, j)] = d;
    }

    fn refresh_nearest(&mut self, i: usize) {
        let mut best: Option<Neighbor> = None;
        for j in (i + 1..self.n).filter(|&j| self.active[j]) {
            let d = self.distance(i, j);
            if best.is_none_or(|b| d < b.distance) {
                best = Some(Neighbor { slot: j, distance: d });
            }
        }
        self.nearest[i] = best;
    }

    /// Closest pair of active slots; the lowest slot index wins ties.
    fn closest_pair(&self) -> Option<(usize, Neighbor)> {
        let mut best: Option<(usize, Neighbor)> = None;
        for i in (0..self.n).filter(|&i| self.active[i]) {
            let Some(nb) = self.nearest[i] else {
                continue;
            };
            if best.is_none_or(|(_, b)| nb.distance < b.distance) {
                best = Some((i, nb));
            }
        }
        best
    }

    fn merge(&mut self, method: LinkageMethod, step: usize) -> Option<Merge> {
        let (a, Neighbor { slot: b, distance }) = self.closest_pair()?;
        let (size_a, size_b) = (self.sizes[a], self.sizes[b]);

        for k in 0..self.n {
            if !self.active[k] || k == a || k == b {
                continue;
            }
            let d = method.update(
                self.distance(a, k),
                self.distance(b, k),
                distance,
                [size_a, size_b, self.sizes[k]],
            );
            self.set_distance(b, k, d);
        }

        let (id_a, id_b) = (self.ids[a], self.ids[b]);
        self.active[a] = false;
        self.nearest[a] = None;
        self.sizes[b] = size_a + size_b;
        self.ids[b] = self.n + step;

        for k in 0..b {
            if !self.active[k] {
                continue;
            }
            match self.nearest[k] {
                Some(nb) if nb.slot == a || nb.slot == b => self.refresh_nearest(k),
                Some(nb) if self.distance(k, b) < nb.distance => {
                    self.nearest[k] = Some(Neighbor {
                        slot: b,
                        distance: self.distance(k, b),
                    });
                }
                Some(_) => {}
                None => self.refresh_nearest(k),
            }
        }
        self.refresh_nearest(b);

        Some(Merge {
            left: id_a.min(id_b),
            right: id_a.max(id_b),
            distance,
            size: size_a + size_b,
        })
    }
}

/// Clusters the items of `distances` with `method`.
///
/// The matrix must not contain missing entries; run
/// [`repair`](crate::repair::repair) first.
///
/// # Examples
///
/// ```
/// use ndarray::aview1;
/// use seriate_cluster::{
///     distance::DistanceMatrix,
///     linkage::{LinkageMethod, linkage},
/// };
///
/// // items 0 and 1 are close, item 2 is far from both
/// let distances = DistanceMatrix::from_condensed(aview1(&[1.0, 8.0, 9.0]))?;
/// let tree = linkage(&distances, LinkageMethod::Average)?;
///
/// let merges = tree.merges();
/// assert_eq!((merges[0].left, merges[0].right), (0, 1));
/// assert_eq!((merges[1].left, merges[1].right), (2, 3));
/// assert_eq!(merges[1].distance, 8.5);
/// # Ok::<(), seriate_cluster::ClusterError>(())
/// ```
pub fn linkage(
    distances: &DistanceMatrix,
    method: LinkageMethod,
) -> Result<LinkageTree, ClusterError> {
    if distances.has_missing() {
        return Err(ClusterError::MissingDistances);
    }
    let n = distances.len();
    let mut clustering = Clustering::new(distances);
    let merges = (0..n.saturating_sub(1))
        .map_while(|step| clustering.merge(method, step))
        .collect::<Vec<_>>();
    tracing::debug!(items = n, %method, "built linkage tree");
    Ok(LinkageTree { leaves: n, merges })
}

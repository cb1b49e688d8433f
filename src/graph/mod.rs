//! User-item interaction graphs and the provider seam the model reads from.
//!
//! The model only needs a symmetric-normalized adjacency over the node set
//! `[users | items]`; where it comes from is up to the
//! [`SparseGraphProvider`]. [`InteractionGraph`] builds the usual
//! bipartite normalization from an interaction list:
//!
//! ```text
//!     A = | 0   R |        Â = D^{-1/2} A D^{-1/2}
//!         | Rᵀ  0 |
//! ```
//!
//! # Examples
//!
//! ```
//! use lightgcn::graph::{InteractionGraph, SparseGraphProvider};
//!
//! let g = InteractionGraph::new(2, 3, &[(0, 0), (0, 2), (1, 1)]).expect("indices in range");
//! let adj = g.sparse_graph().expect("graph builds").merged().expect("single block");
//! assert_eq!(adj.shape(), (5, 5));
//! assert!(adj.is_symmetric(1e-6));
//! ```

use crate::error::{GcnError, Result};
use crate::sparse::CsrMatrix;
use rand::Rng;

/// Supplies the normalized adjacency and the node counts it was built for.
pub trait SparseGraphProvider {
    /// Number of user nodes (rows `0..n_users`).
    fn n_users(&self) -> usize;

    /// Number of item nodes (rows `n_users..n_users + n_items`).
    fn n_items(&self) -> usize;

    /// Normalized adjacency over `n_users + n_items` nodes.
    ///
    /// # Errors
    ///
    /// Implementations report construction failures as [`GcnError`].
    fn sparse_graph(&self) -> Result<AdjacencyGraph>;
}

/// Adjacency either as one matrix or as contiguous row folds.
///
/// Folds keep very large graphs in smaller blocks; edge dropout is applied
/// fold by fold before the blocks are stacked for propagation.
#[derive(Debug, Clone, PartialEq)]
pub enum AdjacencyGraph {
    /// Whole matrix.
    Whole(CsrMatrix),
    /// Row blocks, top to bottom.
    Folds(Vec<CsrMatrix>),
}

impl AdjacencyGraph {
    /// Total `(rows, cols)` across all blocks.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Self::Whole(m) => m.shape(),
            Self::Folds(folds) => (
                folds.iter().map(|f| f.shape().0).sum(),
                folds.first().map_or(0, |f| f.shape().1),
            ),
        }
    }

    /// Stored entries across all blocks.
    #[must_use]
    pub fn nnz(&self) -> usize {
        match self {
            Self::Whole(m) => m.nnz(),
            Self::Folds(folds) => folds.iter().map(CsrMatrix::nnz).sum(),
        }
    }

    /// One matrix for propagation.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if folds disagree on width or there are none.
    pub fn merged(&self) -> Result<CsrMatrix> {
        match self {
            Self::Whole(m) => Ok(m.clone()),
            Self::Folds(folds) => CsrMatrix::vstack(folds),
        }
    }

    /// Edge dropout applied per block, then merged.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a bad `keep_prob`, or `ShapeMismatch` if
    /// folds can't be stacked.
    pub fn drop_edges<R: Rng + ?Sized>(&self, keep_prob: f32, rng: &mut R) -> Result<CsrMatrix> {
        match self {
            Self::Whole(m) => m.dropout(keep_prob, rng),
            Self::Folds(folds) => {
                let dropped = folds
                    .iter()
                    .map(|f| f.dropout(keep_prob, rng))
                    .collect::<Result<Vec<_>>>()?;
                CsrMatrix::vstack(&dropped)
            }
        }
    }

    /// Same adjacency regrouped into `n_folds` row blocks.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `n_folds` is zero or exceeds the row count.
    pub fn into_folds(self, n_folds: usize) -> Result<Self> {
        let merged = self.merged()?;
        Ok(Self::Folds(merged.split_rows(n_folds)?))
    }
}

/// Bipartite user-item graph built from observed interactions.
#[derive(Debug, Clone)]
pub struct InteractionGraph {
    n_users: usize,
    n_items: usize,
    adjacency: CsrMatrix,
    n_folds: Option<usize>,
}

impl InteractionGraph {
    /// Build the normalized adjacency from `(user, item)` pairs. Repeated
    /// pairs count once. Isolated nodes keep an all-zero row.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for a user or item index beyond its count.
    pub fn new(n_users: usize, n_items: usize, interactions: &[(usize, usize)]) -> Result<Self> {
        for &(u, i) in interactions {
            if u >= n_users {
                return Err(GcnError::IndexOutOfRange {
                    kind: "user",
                    index: u,
                    len: n_users,
                });
            }
            if i >= n_items {
                return Err(GcnError::IndexOutOfRange {
                    kind: "item",
                    index: i,
                    len: n_items,
                });
            }
        }

        let mut pairs = interactions.to_vec();
        pairs.sort_unstable();
        pairs.dedup();

        let n = n_users + n_items;
        let mut degree = vec![0.0_f32; n];
        for &(u, i) in &pairs {
            degree[u] += 1.0;
            degree[n_users + i] += 1.0;
        }
        let inv_sqrt: Vec<f32> = degree
            .iter()
            .map(|&d| if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 })
            .collect();

        let mut triplets = Vec::with_capacity(pairs.len() * 2);
        for &(u, i) in &pairs {
            let j = n_users + i;
            let w = inv_sqrt[u] * inv_sqrt[j];
            triplets.push((u, j, w));
            triplets.push((j, u, w));
        }
        let adjacency = CsrMatrix::from_triplets(n, n, &triplets)?;

        Ok(Self {
            n_users,
            n_items,
            adjacency,
            n_folds: None,
        })
    }

    /// Serve the adjacency as `n_folds` row blocks.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `n_folds` is zero or exceeds the node count.
    pub fn with_folds(mut self, n_folds: usize) -> Result<Self> {
        let n = self.n_users + self.n_items;
        if n_folds == 0 || n_folds > n.max(1) {
            return Err(GcnError::config("n_folds", n_folds, "in [1, n_users + n_items]"));
        }
        self.n_folds = Some(n_folds);
        Ok(self)
    }

    /// Borrow the normalized adjacency.
    #[must_use]
    pub fn adjacency(&self) -> &CsrMatrix {
        &self.adjacency
    }
}

impl SparseGraphProvider for InteractionGraph {
    fn n_users(&self) -> usize {
        self.n_users
    }

    fn n_items(&self) -> usize {
        self.n_items
    }

    fn sparse_graph(&self) -> Result<AdjacencyGraph> {
        let whole = AdjacencyGraph::Whole(self.adjacency.clone());
        match self.n_folds {
            Some(k) => whole.into_folds(k),
            None => Ok(whole),
        }
    }
}

/// Provider around an adjacency that was normalized elsewhere.
#[derive(Debug, Clone)]
pub struct PrebuiltGraph {
    n_users: usize,
    n_items: usize,
    graph: AdjacencyGraph,
}

impl PrebuiltGraph {
    /// Wrap a prebuilt adjacency.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` unless the adjacency is square with
    /// `n_users + n_items` rows.
    pub fn new(n_users: usize, n_items: usize, graph: AdjacencyGraph) -> Result<Self> {
        let n = n_users + n_items;
        if graph.shape() != (n, n) {
            return Err(GcnError::shape("prebuilt adjacency", (n, n), graph.shape()));
        }
        Ok(Self {
            n_users,
            n_items,
            graph,
        })
    }
}

impl SparseGraphProvider for PrebuiltGraph {
    fn n_users(&self) -> usize {
        self.n_users
    }

    fn n_items(&self) -> usize {
        self.n_items
    }

    fn sparse_graph(&self) -> Result<AdjacencyGraph> {
        Ok(self.graph.clone())
    }
}

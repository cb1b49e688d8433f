//! Graph-convolution recommendation with learned subgraph partitioning.
//!
//! A forward pass flows leaves first:
//!
//! ```text
//! EmbeddingStore ──► GroupAssigner ──► SubgraphBuilder ──► PropagationEngine ──► ScoringHead
//!  (ego tables)      (user labels)     (masked Â_g)        (layers, noise)       (scores, BPR)
//! ```
//!
//! [`LightGcn`] wires the pieces together over a
//! [`SparseGraphProvider`](crate::graph::SparseGraphProvider);
//! [`PureMf`] is the factorization baseline with the same surface.
//!
//! # Quick Start
//!
//! ```
//! use lightgcn::config::GcnConfig;
//! use lightgcn::graph::InteractionGraph;
//! use lightgcn::recommend::{LightGcn, PairwiseModel};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let graph = InteractionGraph::new(4, 5, &[(0, 0), (0, 3), (1, 1), (2, 2), (3, 4), (3, 0)])
//!     .expect("indices in range");
//! let config = GcnConfig::default()
//!     .with_latent_dim(16)
//!     .and_then(|c| c.with_edge_dropout(0.8))
//!     .expect("valid values")
//!     .with_seed(42);
//! let model = LightGcn::new(config, &graph).expect("valid model");
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let (loss, reg) = model.bpr_loss(&[0, 1], &[3, 1], &[2, 4], &mut rng).expect("valid batch");
//! let cl = model.contrastive_loss(&[0, 1], &[3, 1], &mut rng).expect("valid batch");
//! let total = loss + 1e-4 * reg + model.cl_rate() * cl;
//! assert!(total.is_finite());
//! ```

mod embedding;
mod group;
mod mf;
mod model;
mod propagation;
mod scoring;
mod subgraph;

pub use embedding::{EmbeddingInit, EmbeddingStore};
pub use group::{argmax_first, GroupAssigner, GroupAssignment};
pub use mf::PureMf;
pub use model::LightGcn;
pub use propagation::{perturb_signal, PropagationEngine, PropagationTrace};
pub use scoring::{EmbeddingBatch, ScoringHead};
pub use subgraph::SubgraphBuilder;

use crate::error::Result;
use crate::primitives::Matrix;
use rand::Rng;

/// Scores users against items.
pub trait Recommender {
    /// Number of users the model knows.
    fn n_users(&self) -> usize;

    /// Number of items the model knows.
    fn n_items(&self) -> usize;

    /// `[users.len(), n_items]` preference scores in (0, 1).
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an unknown user.
    fn users_rating<R: Rng + ?Sized>(&self, users: &[usize], rng: &mut R) -> Result<Matrix<f32>>;

    /// Score of each `(users[k], items[k])` pair, in (0, 1).
    ///
    /// Every implementation returns `sigmoid(<u, i>)` over the rows it scores
    /// with, the same values [`users_rating`](Self::users_rating) reports for
    /// those pairs. [`LightGcn`] scores propagated rows in the current mode;
    /// the raw logits are the row dot products of
    /// [`LightGcn::computer`].
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` for lists of different lengths and
    /// `IndexOutOfRange` for an unknown index.
    fn forward<R: Rng + ?Sized>(&self, users: &[usize], items: &[usize], rng: &mut R) -> Result<Vec<f32>>;
}

/// Trained with a pairwise ranking objective.
pub trait PairwiseModel: Recommender {
    /// `(loss, reg)` for a batch of `(user, positive, negative)` triples.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an unknown index and `ShapeMismatch`
    /// for an empty batch or lists of different lengths.
    fn bpr_loss<R: Rng + ?Sized>(&self, users: &[usize], pos: &[usize], neg: &[usize], rng: &mut R) -> Result<(f32, f32)>;
}

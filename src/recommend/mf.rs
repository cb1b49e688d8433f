//! Plain matrix factorization baseline.

use super::embedding::{EmbeddingInit, EmbeddingStore};
use super::scoring::{EmbeddingBatch, ScoringHead};
use super::{PairwiseModel, Recommender};
use crate::config::GcnConfig;
use crate::error::{GcnError, Result};
use crate::graph::SparseGraphProvider;
use crate::primitives::Matrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Factorization tables start from a standard normal.
const MF_INIT_STD: f32 = 1.0;

/// Dot-product recommender over the ego tables, no message passing.
///
/// Shares the [`Recommender`] and [`PairwiseModel`] surface with
/// [`LightGcn`](super::LightGcn), so training and evaluation code can swap
/// the two. Its ego and "propagated" rows are the same.
#[derive(Debug, Clone)]
pub struct PureMf {
    store: EmbeddingStore,
}

impl PureMf {
    /// Random tables sized by the provider's node counts and
    /// `config.latent_dim`. Only the width and the seed are read from
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a zero `latent_dim`.
    pub fn new<P: SparseGraphProvider + ?Sized>(config: &GcnConfig, provider: &P) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let store = EmbeddingStore::initialize(
            provider.n_users(),
            provider.n_items(),
            config.latent_dim,
            EmbeddingInit::RandomNormal { std: MF_INIT_STD },
            &mut rng,
        )?;
        info!(
            n_users = store.n_users(),
            n_items = store.n_items(),
            latent_dim = store.latent_dim(),
            "PureMf initialized"
        );
        Ok(Self { store })
    }

    /// Wrap existing tables.
    #[must_use]
    pub fn from_store(store: EmbeddingStore) -> Self {
        Self { store }
    }

    /// Embedding tables.
    #[must_use]
    pub fn embeddings(&self) -> &EmbeddingStore {
        &self.store
    }

    /// Mutable tables, for an external optimizer.
    pub fn embeddings_mut(&mut self) -> &mut EmbeddingStore {
        &mut self.store
    }
}

impl Recommender for PureMf {
    fn n_users(&self) -> usize {
        self.store.n_users()
    }

    fn n_items(&self) -> usize {
        self.store.n_items()
    }

    fn users_rating<R: Rng + ?Sized>(&self, users: &[usize], _rng: &mut R) -> Result<Matrix<f32>> {
        ScoringHead::rank(&self.store.lookup_users(users)?, self.store.items())
    }

    fn forward<R: Rng + ?Sized>(&self, users: &[usize], items: &[usize], _rng: &mut R) -> Result<Vec<f32>> {
        if users.len() != items.len() {
            return Err(GcnError::length("forward pairs", users.len(), items.len()));
        }
        ScoringHead::score(&self.store.lookup_users(users)?, &self.store.lookup_items(items)?)
    }
}

impl PairwiseModel for PureMf {
    fn bpr_loss<R: Rng + ?Sized>(&self, users: &[usize], pos: &[usize], neg: &[usize], _rng: &mut R) -> Result<(f32, f32)> {
        let users = self.store.lookup_users(users)?;
        let pos = self.store.lookup_items(pos)?;
        let neg = self.store.lookup_items(neg)?;
        ScoringHead::pairwise_loss(&EmbeddingBatch {
            users_ego: users.clone(),
            pos_ego: pos.clone(),
            neg_ego: neg.clone(),
            users,
            pos,
            neg,
        })
    }
}

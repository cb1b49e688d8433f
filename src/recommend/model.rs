//! Subgraph-partitioned LightGCN.

use super::embedding::{check_indices, EmbeddingInit, EmbeddingStore};
use super::group::GroupAssigner;
use super::propagation::{PropagationEngine, PropagationTrace};
use super::scoring::{EmbeddingBatch, ScoringHead};
use super::{PairwiseModel, Recommender};
use crate::config::GcnConfig;
use crate::error::{GcnError, Result};
use crate::graph::{AdjacencyGraph, SparseGraphProvider};
use crate::nn::Mode;
use crate::primitives::Matrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Graph-convolution recommender with learned user groups.
///
/// Owns the parameters (embedding tables and group projection), the base
/// adjacency and a train/eval flag. Every call that may sample (edge dropout,
/// feature dropout, perturbation) takes the random source explicitly.
///
/// # Example
///
/// ```
/// use lightgcn::config::GcnConfig;
/// use lightgcn::graph::InteractionGraph;
/// use lightgcn::recommend::{LightGcn, Recommender};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let graph = InteractionGraph::new(3, 4, &[(0, 0), (0, 1), (1, 2), (2, 3)]).expect("valid");
/// let config = GcnConfig::default()
///     .with_latent_dim(8)
///     .expect("valid")
///     .with_seed(1);
/// let mut model = LightGcn::new(config, &graph).expect("valid model");
/// model.eval();
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let ratings = model.users_rating(&[0, 2], &mut rng).expect("known users");
/// assert_eq!(ratings.shape(), (2, 4));
/// ```
#[derive(Debug, Clone)]
pub struct LightGcn {
    config: GcnConfig,
    store: EmbeddingStore,
    assigner: GroupAssigner,
    engine: PropagationEngine,
    graph: AdjacencyGraph,
    mode: Mode,
}

impl LightGcn {
    /// Build the model over `provider`'s graph.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an invalid configuration, `ShapeMismatch`
    /// if the pretrained tables or the graph don't match the provider's
    /// node counts, and whatever the provider reports while building the
    /// graph.
    pub fn new<P: SparseGraphProvider + ?Sized>(config: GcnConfig, provider: &P) -> Result<Self> {
        config.validate()?;
        let (n_users, n_items) = (provider.n_users(), provider.n_items());
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let init = match (&config.user_emb, &config.item_emb) {
            (Some(users), Some(items)) if config.pretrain => EmbeddingInit::Pretrained {
                users: users.clone(),
                items: items.clone(),
            },
            _ => EmbeddingInit::RandomNormal { std: config.init_std },
        };
        let pretrained = matches!(init, EmbeddingInit::Pretrained { .. });
        let store = EmbeddingStore::initialize(n_users, n_items, config.latent_dim, init, &mut rng)?;
        let assigner = GroupAssigner::new(
            config.latent_dim,
            config.groups,
            config.group_dropout,
            config.leaky_slope,
            &mut rng,
        )?;
        let engine = PropagationEngine::new(&config)?;

        let mut graph = provider.sparse_graph()?;
        let n = n_users + n_items;
        if graph.shape() != (n, n) {
            return Err(GcnError::shape("provider adjacency", (n, n), graph.shape()));
        }
        match graph {
            AdjacencyGraph::Whole(_) if config.a_split => {
                return Err(GcnError::config("a_split", true, "requires a provider serving row folds"));
            }
            AdjacencyGraph::Folds(_) if !config.a_split => {
                debug!("a_split unset, merging folded adjacency");
                graph = AdjacencyGraph::Whole(graph.merged()?);
            }
            _ => {}
        }

        info!(
            n_users,
            n_items,
            latent_dim = config.latent_dim,
            n_layers = config.n_layers,
            groups = config.groups,
            edges = graph.nnz(),
            pretrained,
            edge_dropout = config.dropout,
            "LightGcn initialized"
        );

        Ok(Self {
            config,
            store,
            assigner,
            engine,
            graph,
            mode: Mode::Train,
        })
    }

    /// Switch to training mode.
    pub fn train(&mut self) {
        self.mode = Mode::Train;
    }

    /// Switch to inference mode.
    pub fn eval(&mut self) {
        self.mode = Mode::Eval;
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Configuration the model was built with.
    #[must_use]
    pub fn config(&self) -> &GcnConfig {
        &self.config
    }

    /// Contrastive loss weight for the training loop.
    #[must_use]
    pub fn cl_rate(&self) -> f32 {
        self.config.cl_rate
    }

    /// Ego embedding tables.
    #[must_use]
    pub fn embeddings(&self) -> &EmbeddingStore {
        &self.store
    }

    /// Mutable ego tables, for an external optimizer.
    pub fn embeddings_mut(&mut self) -> &mut EmbeddingStore {
        &mut self.store
    }

    /// Group projection.
    #[must_use]
    pub fn assigner(&self) -> &GroupAssigner {
        &self.assigner
    }

    /// Mutable group projection, for an external optimizer.
    pub fn assigner_mut(&mut self) -> &mut GroupAssigner {
        &mut self.assigner
    }

    /// Base adjacency.
    #[must_use]
    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    /// Propagated user and item embeddings for the whole node set.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if an optimizer changed a table's shape.
    pub fn computer<R: Rng + ?Sized>(&self, perturbed: bool, rng: &mut R) -> Result<(Matrix<f32>, Matrix<f32>)> {
        self.engine
            .propagate(&self.store, &self.graph, &self.assigner, self.mode, perturbed, rng)
    }

    /// Like [`computer`](Self::computer), keeping the per-layer signals and
    /// the group assignment.
    ///
    /// # Errors
    ///
    /// Same as [`computer`](Self::computer).
    pub fn computer_traced<R: Rng + ?Sized>(&self, perturbed: bool, rng: &mut R) -> Result<PropagationTrace> {
        self.engine
            .propagate_traced(&self.store, &self.graph, &self.assigner, self.mode, perturbed, rng)
    }

    /// Propagated and ego rows for a `(user, positive, negative)` batch.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an unknown user or item.
    pub fn embedding<R: Rng + ?Sized>(
        &self,
        users: &[usize],
        pos: &[usize],
        neg: &[usize],
        rng: &mut R,
    ) -> Result<EmbeddingBatch> {
        let users_ego = self.store.lookup_users(users)?;
        let pos_ego = self.store.lookup_items(pos)?;
        let neg_ego = self.store.lookup_items(neg)?;
        let (all_users, all_items) = self.computer(false, rng)?;
        Ok(EmbeddingBatch {
            users: all_users.gather_rows(users),
            pos: all_items.gather_rows(pos),
            neg: all_items.gather_rows(neg),
            users_ego,
            pos_ego,
            neg_ego,
        })
    }

    /// InfoNCE between two independently perturbed passes, summed over the
    /// user and item rows of the batch. Unweighted; scale by
    /// [`cl_rate`](Self::cl_rate).
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an unknown index and `ShapeMismatch`
    /// for an empty index list.
    pub fn contrastive_loss<R: Rng + ?Sized>(&self, users: &[usize], items: &[usize], rng: &mut R) -> Result<f32> {
        check_indices("user", users, self.store.n_users())?;
        check_indices("item", items, self.store.n_items())?;
        let (u1, i1) = self.computer(true, rng)?;
        let (u2, i2) = self.computer(true, rng)?;
        let user_loss = ScoringHead::info_nce(&u1.gather_rows(users), &u2.gather_rows(users), self.config.temperature)?;
        let item_loss = ScoringHead::info_nce(&i1.gather_rows(items), &i2.gather_rows(items), self.config.temperature)?;
        debug!(user_loss, item_loss, "contrastive loss");
        Ok(user_loss + item_loss)
    }
}

impl Recommender for LightGcn {
    fn n_users(&self) -> usize {
        self.store.n_users()
    }

    fn n_items(&self) -> usize {
        self.store.n_items()
    }

    fn users_rating<R: Rng + ?Sized>(&self, users: &[usize], rng: &mut R) -> Result<Matrix<f32>> {
        check_indices("user", users, self.store.n_users())?;
        let (all_users, all_items) = self.computer(false, rng)?;
        ScoringHead::rank(&all_users.gather_rows(users), &all_items)
    }

    fn forward<R: Rng + ?Sized>(&self, users: &[usize], items: &[usize], rng: &mut R) -> Result<Vec<f32>> {
        if users.len() != items.len() {
            return Err(GcnError::length("forward pairs", users.len(), items.len()));
        }
        check_indices("user", users, self.store.n_users())?;
        check_indices("item", items, self.store.n_items())?;
        let (all_users, all_items) = self.computer(false, rng)?;
        ScoringHead::score(&all_users.gather_rows(users), &all_items.gather_rows(items))
    }
}

impl PairwiseModel for LightGcn {
    fn bpr_loss<R: Rng + ?Sized>(&self, users: &[usize], pos: &[usize], neg: &[usize], rng: &mut R) -> Result<(f32, f32)> {
        let batch = self.embedding(users, pos, neg, rng)?;
        ScoringHead::pairwise_loss(&batch)
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;

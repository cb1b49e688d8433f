//! Multi-layer message passing over learned subgraphs.
//!
//! One pass:
//!
//! 1. `all = [users | items]`
//! 2. edge dropout on the base graph (training only, when enabled)
//! 3. `side = Â · all`
//! 4. groups assigned from `all + side`, one masked subgraph per group
//! 5. layer 0 of every group is the same signal: `side` plus one noise draw
//!    per group, accumulated, when perturbation is requested
//! 6. layer `l` of group `g` is `Â_g · (h_{l-1,g} + noise)`
//! 7. each layer's signal is the sum over groups; layers are combined by
//!    fixed weights and split back into user and item blocks
//!
//! Noise is `sign(x) ⊙ normalize(U[0,1)) · eps`: it never flips the sign
//! of an entry and never moves a zero.

use super::embedding::EmbeddingStore;
use super::group::{GroupAssigner, GroupAssignment};
use super::subgraph::SubgraphBuilder;
use crate::config::GcnConfig;
use crate::error::{GcnError, Result};
use crate::graph::AdjacencyGraph;
use crate::nn::{init, Mode, F};
use crate::primitives::Matrix;
use rand::Rng;
use tracing::{debug, trace};

/// Row norms below this are treated as this when normalizing noise.
const NOISE_NORM_EPS: f32 = 1e-12;

/// Everything a pass computed, for inspection and tests.
#[derive(Debug, Clone)]
pub struct PropagationTrace {
    /// Group labels used for this pass.
    pub assignment: GroupAssignment,
    /// `Â · all` before perturbation.
    pub side: Matrix<f32>,
    /// Group-summed signal of every layer, layer 0 first.
    pub layers: Vec<Matrix<f32>>,
    /// Final user block.
    pub users: Matrix<f32>,
    /// Final item block.
    pub items: Matrix<f32>,
}

/// Stateless propagation schedule: layer count, combination weights,
/// perturbation magnitude and edge dropout.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationEngine {
    layer_weights: Vec<f32>,
    eps: f32,
    keep_prob: Option<f32>,
}

impl PropagationEngine {
    /// Schedule described by a configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration doesn't validate.
    pub fn new(config: &GcnConfig) -> Result<Self> {
        config.validate()?;
        Self::from_parts(
            config.resolved_layer_weights(),
            config.eps,
            config.dropout.then_some(config.keep_prob),
        )
    }

    /// Schedule with one weight per layer. `keep_prob: None` disables edge
    /// dropout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for no layers, a negative or non-finite
    /// `eps`, or a `keep_prob` outside (0, 1].
    pub fn from_parts(layer_weights: Vec<f32>, eps: f32, keep_prob: Option<f32>) -> Result<Self> {
        if layer_weights.is_empty() {
            return Err(GcnError::config("n_layers", 0, ">= 1"));
        }
        if !(eps >= 0.0 && eps.is_finite()) {
            return Err(GcnError::config("eps", eps, "finite and >= 0"));
        }
        if let Some(p) = keep_prob {
            if !(p > 0.0 && p <= 1.0) {
                return Err(GcnError::config("keep_prob", p, "in (0, 1]"));
            }
        }
        Ok(Self {
            layer_weights,
            eps,
            keep_prob,
        })
    }

    /// Number of layers, counting the side-embedding step.
    #[must_use]
    pub fn n_layers(&self) -> usize {
        self.layer_weights.len()
    }

    /// Combination weight of each layer.
    #[must_use]
    pub fn layer_weights(&self) -> &[f32] {
        &self.layer_weights
    }

    /// Perturbation magnitude.
    #[must_use]
    pub fn eps(&self) -> f32 {
        self.eps
    }

    /// Final user and item embeddings.
    ///
    /// # Errors
    ///
    /// See [`propagate_traced`](Self::propagate_traced).
    pub fn propagate<R: Rng + ?Sized>(
        &self,
        store: &EmbeddingStore,
        graph: &AdjacencyGraph,
        assigner: &GroupAssigner,
        mode: Mode,
        perturb: bool,
        rng: &mut R,
    ) -> Result<(Matrix<f32>, Matrix<f32>)> {
        let trace = self.propagate_traced(store, graph, assigner, mode, perturb, rng)?;
        Ok((trace.users, trace.items))
    }

    /// Full pass, keeping the intermediate signals.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the graph isn't square over
    /// `n_users + n_items` nodes or the assigner's width differs from the
    /// embedding width.
    pub fn propagate_traced<R: Rng + ?Sized>(
        &self,
        store: &EmbeddingStore,
        graph: &AdjacencyGraph,
        assigner: &GroupAssigner,
        mode: Mode,
        perturb: bool,
        rng: &mut R,
    ) -> Result<PropagationTrace> {
        let n = store.n_users() + store.n_items();
        if graph.shape() != (n, n) {
            return Err(GcnError::shape("adjacency", (n, n), graph.shape()));
        }
        let all = store.concat()?;

        let base = match self.keep_prob {
            Some(keep) if mode.is_training() => graph.drop_edges(keep, rng)?,
            _ => graph.merged()?,
        };
        let side = base.spmm(&all)?;

        let assignment = assigner.assign(&all.add(&side)?, store.n_users(), mode, rng)?;
        let subgraphs = SubgraphBuilder::build_all(&base, &assignment)?;
        debug!(
            nodes = n,
            base_edges = base.nnz(),
            group_sizes = ?assignment.group_sizes(),
            perturb,
            "propagating"
        );

        // one fresh draw per group, accumulated on the shared layer-0 signal
        let mut side0 = side.clone();
        if perturb {
            for _ in 0..subgraphs.len() {
                side0 = perturb_signal(&side0, self.eps, rng);
            }
        }
        let mut per_group = vec![side0; subgraphs.len()];
        let mut layers = Vec::with_capacity(self.n_layers());
        layers.push(sum_groups(&per_group, n, store.latent_dim())?);

        for layer in 1..self.n_layers() {
            let mut next = Vec::with_capacity(subgraphs.len());
            for (sub, h) in subgraphs.iter().zip(&per_group) {
                let out = if perturb {
                    sub.spmm(&perturb_signal(h, self.eps, rng))?
                } else {
                    sub.spmm(h)?
                };
                next.push(out);
            }
            per_group = next;
            let summed = sum_groups(&per_group, n, store.latent_dim())?;
            trace!(layer, norm = summed.squared_norm().sqrt(), "layer signal");
            layers.push(summed);
        }

        let mut combined = Matrix::zeros(n, store.latent_dim());
        for (signal, &w) in layers.iter().zip(&self.layer_weights) {
            combined.add_scaled(signal, w)?;
        }
        let (users, items) = store.split(&combined)?;
        Ok(PropagationTrace {
            assignment,
            side,
            layers,
            users,
            items,
        })
    }
}

/// `x + sign(x) ⊙ normalize_rows(U[0,1)) · eps`.
#[must_use]
pub fn perturb_signal<R: Rng + ?Sized>(x: &Matrix<f32>, eps: f32, rng: &mut R) -> Matrix<f32> {
    let (rows, cols) = x.shape();
    let noise = init::uniform(rows, cols, 0.0, 1.0, rng).normalize_rows(NOISE_NORM_EPS);
    let mut out = x.clone();
    for (o, &z) in out.as_mut_slice().iter_mut().zip(noise.as_slice()) {
        *o += F::sign(*o) * z * eps;
    }
    out
}

fn sum_groups(signals: &[Matrix<f32>], n: usize, dim: usize) -> Result<Matrix<f32>> {
    let mut total = Matrix::zeros(n, dim);
    for s in signals {
        total.add_scaled(s, 1.0)?;
    }
    Ok(total)
}

#[cfg(test)]
#[path = "propagation_tests.rs"]
mod tests;

//! Learned hard partition of users into groups.
//!
//! ```text
//! E ──► fc ──► LeakyReLU ──► dropout ──► fc_g ──► dropout ──► scores [N, groups]
//!                                                               │
//!                                          arg-max per user row ▼
//!                                                   GroupAssignment
//! ```
//!
//! The arg-max is a discrete labeling step. Nothing downstream differentiates
//! through it; only the score computation carries parameters.

use super::embedding::check_indices;
use crate::error::{GcnError, Result};
use crate::nn::{Dropout, Linear, Mode, F};
use crate::primitives::Matrix;
use rand::Rng;

/// Two-layer projection from node embeddings to per-group scores.
#[derive(Debug, Clone)]
pub struct GroupAssigner {
    fc: Linear,
    fc_g: Linear,
    dropout: Dropout,
    leaky_slope: f32,
}

impl GroupAssigner {
    /// Create an assigner for `latent_dim`-wide embeddings and `groups`
    /// partitions.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for zero `groups` or `latent_dim`, or a
    /// dropout probability outside [0, 1).
    pub fn new<R: Rng + ?Sized>(
        latent_dim: usize,
        groups: usize,
        dropout: f32,
        leaky_slope: f32,
        rng: &mut R,
    ) -> Result<Self> {
        if latent_dim == 0 {
            return Err(GcnError::config("latent_dim", latent_dim, "> 0"));
        }
        if groups == 0 {
            return Err(GcnError::config("groups", groups, ">= 1"));
        }
        Ok(Self {
            fc: Linear::new(latent_dim, latent_dim, rng),
            fc_g: Linear::new(latent_dim, groups, rng),
            dropout: Dropout::new(dropout)?,
            leaky_slope,
        })
    }

    /// Build from explicit projection layers.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `fc` isn't square or `fc_g` doesn't read
    /// `fc`'s output, and `InvalidConfig` for a bad dropout probability.
    pub fn from_layers(fc: Linear, fc_g: Linear, dropout: f32, leaky_slope: f32) -> Result<Self> {
        if fc.in_features() != fc.out_features() {
            return Err(GcnError::shape(
                "group projection fc",
                (fc.in_features(), fc.in_features()),
                (fc.out_features(), fc.in_features()),
            ));
        }
        if fc_g.in_features() != fc.out_features() {
            return Err(GcnError::length("group projection fc_g input", fc.out_features(), fc_g.in_features()));
        }
        Ok(Self {
            fc,
            fc_g,
            dropout: Dropout::new(dropout)?,
            leaky_slope,
        })
    }

    /// Number of groups.
    #[must_use]
    pub fn groups(&self) -> usize {
        self.fc_g.out_features()
    }

    /// Mutable projection layers, for an external optimizer.
    pub fn layers_mut(&mut self) -> (&mut Linear, &mut Linear) {
        (&mut self.fc, &mut self.fc_g)
    }

    /// Raw group scores for every row of `embeddings`.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the embedding width differs from the
    /// projection input.
    pub fn scores<R: Rng + ?Sized>(&self, embeddings: &Matrix<f32>, mode: Mode, rng: &mut R) -> Result<Matrix<f32>> {
        let hidden = F::leaky_relu(&self.fc.forward(embeddings)?, self.leaky_slope);
        let hidden = self.dropout.forward(&hidden, mode, rng);
        let scores = self.fc_g.forward(&hidden)?;
        Ok(self.dropout.forward(&scores, mode, rng))
    }

    /// Assign each of the first `n_users` rows to its highest-scoring group.
    ///
    /// Scores are computed for item rows too, then ignored: items belong to
    /// every group.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` for a width mismatch or if `embeddings` has
    /// fewer than `n_users` rows.
    pub fn assign<R: Rng + ?Sized>(
        &self,
        embeddings: &Matrix<f32>,
        n_users: usize,
        mode: Mode,
        rng: &mut R,
    ) -> Result<GroupAssignment> {
        if embeddings.n_rows() < n_users {
            return Err(GcnError::length("group assigner rows", n_users, embeddings.n_rows()));
        }
        let scores = self.scores(embeddings, mode, rng)?;
        let labels = (0..n_users).map(|i| argmax_first(scores.row(i))).collect();
        Ok(GroupAssignment {
            labels,
            n_items: embeddings.n_rows() - n_users,
            groups: self.groups(),
        })
    }
}

/// Index of the first maximum. NaN never wins.
#[must_use]
pub fn argmax_first(row: &[f32]) -> usize {
    let mut best = 0;
    for (j, &v) in row.iter().enumerate().skip(1) {
        if v > row[best] || row[best].is_nan() {
            best = j;
        }
    }
    best
}

/// One categorical label per user; items implicitly in every group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupAssignment {
    labels: Vec<usize>,
    n_items: usize,
    groups: usize,
}

impl GroupAssignment {
    /// Build from explicit user labels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for zero groups and `IndexOutOfRange` for a
    /// label `>= groups`.
    pub fn from_labels(labels: Vec<usize>, n_items: usize, groups: usize) -> Result<Self> {
        if groups == 0 {
            return Err(GcnError::config("groups", groups, ">= 1"));
        }
        check_indices("group", &labels, groups)?;
        Ok(Self {
            labels,
            n_items,
            groups,
        })
    }

    /// Group label of every user.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of groups.
    #[must_use]
    pub fn groups(&self) -> usize {
        self.groups
    }

    /// Total nodes covered (users + items).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.labels.len() + self.n_items
    }

    /// Number of users in each group.
    #[must_use]
    pub fn group_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.groups];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }

    /// 0/1 membership of every node in group `g`: users by label, items always 1.
    #[must_use]
    pub fn membership(&self, g: usize) -> Vec<f32> {
        self.labels
            .iter()
            .map(|&l| if l == g { 1.0 } else { 0.0 })
            .chain(std::iter::repeat(1.0).take(self.n_items))
            .collect()
    }

    /// Dense `[n_nodes, groups]` membership: one-hot user rows, all-ones item rows.
    #[must_use]
    pub fn one_hot(&self) -> Matrix<f32> {
        let mut m = Matrix::zeros(self.n_nodes(), self.groups);
        for (i, &l) in self.labels.iter().enumerate() {
            m.set(i, l, 1.0);
        }
        for i in self.labels.len()..self.n_nodes() {
            m.row_mut(i).fill(1.0);
        }
        m
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;

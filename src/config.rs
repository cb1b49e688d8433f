//! Model configuration.
//!
//! One explicit [`GcnConfig`] value is handed to every constructor; nothing
//! is read from process-wide state. Configs round-trip through JSON so a
//! training run can be described in a file:
//!
//! ```
//! use lightgcn::config::GcnConfig;
//!
//! let config = GcnConfig::default()
//!     .with_latent_dim(32)
//!     .and_then(|c| c.with_groups(3))
//!     .expect("valid values");
//! let json = config.to_json().expect("serializable");
//! let back = GcnConfig::from_json(&json).expect("valid json");
//! assert_eq!(back.latent_dim, 32);
//! assert_eq!(back.groups, 3);
//! ```

use crate::error::{GcnError, Result};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hyperparameters of the subgraph-partitioned propagation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcnConfig {
    /// Embedding width.
    pub latent_dim: usize,

    /// Number of propagation layers, counting the initial side-embedding step.
    pub n_layers: usize,

    /// Edge retention probability for graph dropout, in (0, 1].
    pub keep_prob: f32,

    /// Keep the provider's adjacency as row folds. When set the provider must
    /// serve folds; when unset a folded adjacency is merged into one block.
    pub a_split: bool,

    /// Number of learned subgraph partitions.
    pub groups: usize,

    /// Contrastive loss weight (lambda), applied by the training loop.
    pub cl_rate: f32,

    /// Perturbation magnitude (epsilon).
    pub eps: f32,

    /// Initialize from `user_emb` / `item_emb` instead of random normal.
    pub pretrain: bool,

    /// Enable graph edge dropout during training.
    pub dropout: bool,

    /// Pretrained user table, `n_users x latent_dim`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_emb: Option<Matrix<f32>>,

    /// Pretrained item table, `n_items x latent_dim`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_emb: Option<Matrix<f32>>,

    /// Use only the last layer's signal instead of the weighted combination.
    pub single: bool,

    /// Explicit per-layer weights; defaults to `1 / n_layers` each.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_weights: Option<Vec<f32>>,

    /// Feature dropout inside the group assigner, in [0, 1).
    pub group_dropout: f32,

    /// Negative slope of the group assigner's leaky ReLU.
    pub leaky_slope: f32,

    /// Standard deviation for random-normal embedding initialization.
    pub init_std: f32,

    /// InfoNCE temperature for the contrastive loss.
    pub temperature: f32,

    /// Seed for parameter initialization; `None` draws from entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GcnConfig {
    fn default() -> Self {
        Self {
            latent_dim: 64,
            n_layers: 5,
            keep_prob: 0.6,
            a_split: false,
            groups: 2,
            cl_rate: 0.1,
            eps: 0.1,
            pretrain: false,
            dropout: false,
            user_emb: None,
            item_emb: None,
            single: false,
            layer_weights: None,
            group_dropout: 0.4,
            leaky_slope: 0.01,
            init_std: 0.1,
            temperature: 0.2,
            seed: None,
        }
    }
}

impl GcnConfig {
    /// Validate configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        if self.latent_dim == 0 {
            return Err(GcnError::config("latent_dim", self.latent_dim, "> 0"));
        }
        if self.n_layers == 0 {
            return Err(GcnError::config("n_layers", self.n_layers, ">= 1"));
        }
        if self.groups == 0 {
            return Err(GcnError::config("groups", self.groups, ">= 1"));
        }
        if !(self.keep_prob > 0.0 && self.keep_prob <= 1.0) {
            return Err(GcnError::config("keep_prob", self.keep_prob, "in (0, 1]"));
        }
        if !(self.eps >= 0.0 && self.eps.is_finite()) {
            return Err(GcnError::config("eps", self.eps, "finite and >= 0"));
        }
        if !(self.cl_rate >= 0.0 && self.cl_rate.is_finite()) {
            return Err(GcnError::config("cl_rate", self.cl_rate, "finite and >= 0"));
        }
        if !(0.0..1.0).contains(&self.group_dropout) {
            return Err(GcnError::config("group_dropout", self.group_dropout, "in [0, 1)"));
        }
        if !self.leaky_slope.is_finite() {
            return Err(GcnError::config("leaky_slope", self.leaky_slope, "finite"));
        }
        if !(self.init_std > 0.0 && self.init_std.is_finite()) {
            return Err(GcnError::config("init_std", self.init_std, "finite and > 0"));
        }
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(GcnError::config("temperature", self.temperature, "finite and > 0"));
        }
        if let Some(weights) = &self.layer_weights {
            if weights.len() != self.n_layers {
                return Err(GcnError::config(
                    "layer_weights",
                    format!("{} weights", weights.len()),
                    &format!("exactly n_layers = {}", self.n_layers),
                ));
            }
            if weights.iter().any(|w| !w.is_finite()) {
                return Err(GcnError::config("layer_weights", format!("{weights:?}"), "finite"));
            }
        }
        if self.pretrain && (self.user_emb.is_none() || self.item_emb.is_none()) {
            return Err(GcnError::config(
                "pretrain",
                true,
                "user_emb and item_emb to be provided",
            ));
        }
        Ok(())
    }

    /// Weight applied to each layer's combined signal.
    ///
    /// `single` mode puts all weight on the last layer.
    #[must_use]
    pub fn resolved_layer_weights(&self) -> Vec<f32> {
        if self.single {
            let mut w = vec![0.0; self.n_layers];
            if let Some(last) = w.last_mut() {
                *last = 1.0;
            }
            return w;
        }
        self.layer_weights
            .clone()
            .unwrap_or_else(|| vec![1.0 / self.n_layers.max(1) as f32; self.n_layers])
    }

    /// Set embedding width with validation
    pub fn with_latent_dim(mut self, latent_dim: usize) -> Result<Self> {
        if latent_dim == 0 {
            return Err(GcnError::config("latent_dim", latent_dim, "> 0"));
        }
        self.latent_dim = latent_dim;
        Ok(self)
    }

    /// Set layer count with validation. Clears explicit layer weights of a
    /// different length.
    pub fn with_layers(mut self, n_layers: usize) -> Result<Self> {
        if n_layers == 0 {
            return Err(GcnError::config("n_layers", n_layers, ">= 1"));
        }
        if self.layer_weights.as_ref().is_some_and(|w| w.len() != n_layers) {
            self.layer_weights = None;
        }
        self.n_layers = n_layers;
        Ok(self)
    }

    /// Set number of groups with validation
    pub fn with_groups(mut self, groups: usize) -> Result<Self> {
        if groups == 0 {
            return Err(GcnError::config("groups", groups, ">= 1"));
        }
        self.groups = groups;
        Ok(self)
    }

    /// Enable edge dropout with the given retention probability
    pub fn with_edge_dropout(mut self, keep_prob: f32) -> Result<Self> {
        if !(keep_prob > 0.0 && keep_prob <= 1.0) {
            return Err(GcnError::config("keep_prob", keep_prob, "in (0, 1]"));
        }
        self.dropout = true;
        self.keep_prob = keep_prob;
        Ok(self)
    }

    /// Set perturbation magnitude with validation
    pub fn with_eps(mut self, eps: f32) -> Result<Self> {
        if !(eps >= 0.0 && eps.is_finite()) {
            return Err(GcnError::config("eps", eps, "finite and >= 0"));
        }
        self.eps = eps;
        Ok(self)
    }

    /// Set explicit layer weights; length must equal `n_layers`
    pub fn with_layer_weights(mut self, weights: Vec<f32>) -> Result<Self> {
        if weights.len() != self.n_layers {
            return Err(GcnError::config(
                "layer_weights",
                format!("{} weights", weights.len()),
                &format!("exactly n_layers = {}", self.n_layers),
            ));
        }
        self.layer_weights = Some(weights);
        Ok(self)
    }

    /// Use only the last layer's signal
    #[must_use]
    pub fn with_single_layer(mut self, single: bool) -> Self {
        self.single = single;
        self
    }

    /// Set group assigner dropout with validation
    pub fn with_group_dropout(mut self, p: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(GcnError::config("group_dropout", p, "in [0, 1)"));
        }
        self.group_dropout = p;
        Ok(self)
    }

    /// Initialize from pretrained tables
    #[must_use]
    pub fn with_pretrained(mut self, user_emb: Matrix<f32>, item_emb: Matrix<f32>) -> Self {
        self.pretrain = true;
        self.user_emb = Some(user_emb);
        self.item_emb = Some(item_emb);
        self
    }

    /// Keep a folded provider adjacency as folds
    #[must_use]
    pub fn with_split_adjacency(mut self, a_split: bool) -> Self {
        self.a_split = a_split;
        self
    }

    /// Seed parameter initialization
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse and validate from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` for malformed JSON or `InvalidConfig` for
    /// out-of-range values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Io`, `Serialization` or `InvalidConfig`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write as JSON to a file.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialization`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

//! LightGCN: graph-convolution recommendation with learned subgraphs.
//!
//! Users and items share one embedding space. Each forward pass assigns
//! every user to one learned group, masks the normalized interaction graph
//! down to one subgraph per group, propagates embeddings through those
//! subgraphs layer by layer and combines the layers with fixed weights.
//! Optional signed noise on every layer gives the perturbed views used by
//! the contrastive objective.
//!
//! # Quick Start
//!
//! ```
//! use lightgcn::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let graph = InteractionGraph::new(3, 3, &[(0, 0), (1, 1), (2, 2), (0, 1)]).unwrap();
//! let config = GcnConfig::default().with_latent_dim(8).unwrap().with_seed(3);
//! let mut model = LightGcn::new(config, &graph).unwrap();
//! model.eval();
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let scores = model.forward(&[0, 1], &[0, 2], &mut rng).unwrap();
//! assert!(scores.iter().all(|&s| s > 0.0 && s < 1.0));
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Dense row-major [`Matrix`]
//! - [`sparse`]: CSR sparse matrix, sparse × dense products, edge dropout
//! - [`graph`]: Interaction graphs and the [`graph::SparseGraphProvider`] seam
//! - [`nn`]: Linear layers, dropout, activations, initializers
//! - [`recommend`]: Embedding store, group assigner, subgraphs,
//!   propagation, scoring, models
//! - [`config`]: [`config::GcnConfig`] with JSON persistence
//!
//! # Features
//!
//! - `parallel`: row-parallel sparse products via rayon

pub mod config;
pub mod error;
pub mod graph;
pub mod nn;
pub mod prelude;
pub mod primitives;
pub mod recommend;
pub mod sparse;

pub use error::{GcnError, Result};
pub use primitives::Matrix;

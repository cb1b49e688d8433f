//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use lightgcn::prelude::*;
//! ```

pub use crate::config::GcnConfig;
pub use crate::error::{GcnError, Result};
pub use crate::graph::{AdjacencyGraph, InteractionGraph, PrebuiltGraph, SparseGraphProvider};
pub use crate::nn::Mode;
pub use crate::primitives::Matrix;
pub use crate::recommend::{LightGcn, PairwiseModel, PureMf, Recommender};
pub use crate::sparse::CsrMatrix;

//! Neural network building blocks for the group assigner.
//!
//! - **Layers**: [`Linear`]
//! - **Regularization**: [`Dropout`]
//! - **Functions**: [`functional`] (leaky ReLU, sigmoid, softplus, sign)
//! - **Initialization**: [`init`]
//!
//! Layers hold no random generator and no train/eval flag of their own: the
//! caller passes a [`Mode`] and a random source into each stochastic call.

mod dropout;
pub mod functional;
pub mod init;
mod linear;

pub use dropout::Dropout;
pub use functional as F;
pub use linear::Linear;

use serde::{Deserialize, Serialize};

/// Whether a forward pass is part of training or inference.
///
/// Training enables graph edge dropout and feature dropout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Stochastic regularizers active.
    #[default]
    Train,
    /// Deterministic inference.
    Eval,
}

impl Mode {
    /// True in training mode.
    #[must_use]
    pub fn is_training(self) -> bool {
        matches!(self, Mode::Train)
    }
}

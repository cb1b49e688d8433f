//! Dropout regularization.
//!
//! Dropout randomly zeroes elements during training to prevent co-adaptation
//! and reduce overfitting.
//!
//! # Reference
//!
//! - Srivastava, N., et al. (2014). Dropout: A simple way to prevent neural
//!   networks from overfitting. JMLR.

use super::Mode;
use crate::error::{GcnError, Result};
use crate::primitives::Matrix;
use rand::Rng;

/// Dropout regularization layer.
///
/// During training, zeroes each element with probability `p` and scales the
/// survivors by `1/(1-p)` (inverted dropout). During evaluation, returns the
/// input unchanged.
///
/// The layer owns no generator: every call takes the random source
/// explicitly.
///
/// # Example
///
/// ```
/// use lightgcn::nn::{Dropout, Mode};
/// use lightgcn::primitives::Matrix;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let dropout = Dropout::new(0.5).expect("valid probability");
/// let x = Matrix::ones(10, 10);
/// let mut rng = StdRng::seed_from_u64(0);
///
/// let y_eval = dropout.forward(&x, Mode::Eval, &mut rng);
/// assert_eq!(y_eval, x);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Dropout {
    /// Probability of element being zeroed
    p: f32,
}

impl Dropout {
    /// Create a new Dropout layer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `p` is not in [0, 1).
    pub fn new(p: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(GcnError::config("dropout", p, "in [0, 1)"));
        }
        Ok(Self { p })
    }

    /// Get the dropout probability.
    #[must_use]
    pub fn probability(&self) -> f32 {
        self.p
    }

    /// Apply dropout in training mode; identity in eval mode.
    #[must_use]
    pub fn forward<R: Rng + ?Sized>(&self, input: &Matrix<f32>, mode: Mode, rng: &mut R) -> Matrix<f32> {
        if !mode.is_training() || self.p == 0.0 {
            return input.clone();
        }

        let scale = 1.0 / (1.0 - self.p);
        let mut out = input.clone();
        for x in out.as_mut_slice() {
            *x = if rng.gen::<f32>() < self.p { 0.0 } else { *x * scale };
        }
        out
    }
}

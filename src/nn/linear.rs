//! Fully connected (linear) layer.
//!
//! Implements the transformation y = xW^T + b.

use super::init::{fan_in_bound, uniform};
use crate::error::{GcnError, Result};
use crate::primitives::Matrix;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fully connected layer: y = xW^T + b
///
/// Weights and bias are drawn from U(-1/√in, 1/√in).
///
/// # Shape
///
/// - Input: `(n, in_features)`
/// - Output: `(n, out_features)`
///
/// # Example
///
/// ```
/// use lightgcn::nn::Linear;
/// use lightgcn::primitives::Matrix;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let layer = Linear::new(20, 30, &mut StdRng::seed_from_u64(0));
/// let x = Matrix::ones(128, 20);
/// let output = layer.forward(&x).expect("20 input features");
///
/// assert_eq!(output.shape(), (128, 30));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Linear {
    /// Weight matrix, shape: [out_features, in_features]
    weight: Matrix<f32>,

    /// Bias vector, length out_features
    bias: Vec<f32>,
}

impl Linear {
    /// Create a new Linear layer with default uniform initialization.
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let bound = fan_in_bound(in_features);
        let weight = uniform(out_features, in_features, -bound, bound, rng);
        let bias = uniform(1, out_features, -bound, bound, rng).as_slice().to_vec();
        Self { weight, bias }
    }

    /// Create a Linear layer from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the bias length differs from the number of
    /// weight rows.
    pub fn from_parts(weight: Matrix<f32>, bias: Vec<f32>) -> Result<Self> {
        if bias.len() != weight.n_rows() {
            return Err(GcnError::length("linear bias", weight.n_rows(), bias.len()));
        }
        Ok(Self { weight, bias })
    }

    /// Get the input feature dimension.
    #[must_use]
    pub fn in_features(&self) -> usize {
        self.weight.n_cols()
    }

    /// Get the output feature dimension.
    #[must_use]
    pub fn out_features(&self) -> usize {
        self.weight.n_rows()
    }

    /// Get reference to the weight matrix.
    #[must_use]
    pub fn weight(&self) -> &Matrix<f32> {
        &self.weight
    }

    /// Get reference to the bias.
    #[must_use]
    pub fn bias(&self) -> &[f32] {
        &self.bias
    }

    /// Mutable access for an external optimizer.
    pub fn parameters_mut(&mut self) -> (&mut Matrix<f32>, &mut Vec<f32>) {
        (&mut self.weight, &mut self.bias)
    }

    /// Forward pass.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the input width differs from `in_features`.
    pub fn forward(&self, input: &Matrix<f32>) -> Result<Matrix<f32>> {
        let mut out = input.matmul_transposed(&self.weight)?;
        for i in 0..out.n_rows() {
            for (o, b) in out.row_mut(i).iter_mut().zip(&self.bias) {
                *o += b;
            }
        }
        Ok(out)
    }
}

//! Weight initialization functions.
//!
//! - Normal initialization for embedding tables
//! - Uniform fan-in initialization for dense projections, matching the
//!   conventional default for fully connected layers
//!
//! All initializers draw from a caller-supplied generator so a seeded
//! `StdRng` reproduces the same parameters.

use crate::primitives::Matrix;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Normal distribution initialization.
///
/// Samples every element from N(mean, std).
///
/// # Panics
///
/// Panics if `std` is negative or not finite; callers validate it first.
///
/// # Example
///
/// ```
/// use lightgcn::nn::init::normal;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let table = normal(10, 4, 0.0, 0.1, &mut rng);
/// assert_eq!(table.shape(), (10, 4));
/// ```
#[must_use]
pub fn normal<R: Rng + ?Sized>(rows: usize, cols: usize, mean: f32, std: f32, rng: &mut R) -> Matrix<f32> {
    let dist = Normal::new(mean, std).expect("std validated as finite and non-negative");
    let data: Vec<f32> = (0..rows * cols).map(|_| dist.sample(rng)).collect();
    Matrix::from_vec(rows, cols, data).expect("rows * cols elements generated")
}

/// Uniform distribution initialization.
///
/// Samples from U(low, high). A degenerate range (`low == high`) yields a
/// constant matrix.
#[must_use]
pub fn uniform<R: Rng + ?Sized>(rows: usize, cols: usize, low: f32, high: f32, rng: &mut R) -> Matrix<f32> {
    let data: Vec<f32> = (0..rows * cols)
        .map(|_| {
            if high > low {
                rng.gen_range(low..high)
            } else {
                low
            }
        })
        .collect();
    Matrix::from_vec(rows, cols, data).expect("rows * cols elements generated")
}

/// Bound for the default dense-layer initialization: `1 / sqrt(fan_in)`.
#[must_use]
pub fn fan_in_bound(fan_in: usize) -> f32 {
    1.0 / (fan_in.max(1) as f32).sqrt()
}

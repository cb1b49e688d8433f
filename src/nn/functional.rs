//! Stateless element-wise operations used in the forward pass.
//!
//! # Example
//!
//! ```
//! use lightgcn::nn::functional as F;
//!
//! assert!((F::softplus(0.0) - std::f32::consts::LN_2).abs() < 1e-7);
//! assert_eq!(F::sign(0.0), 0.0);
//! ```

use crate::primitives::Matrix;

/// Leaky `ReLU` activation: `max(negative_slope * x, x)`
#[must_use]
pub fn leaky_relu(x: &Matrix<f32>, negative_slope: f32) -> Matrix<f32> {
    x.map(|v| if v > 0.0 { v } else { negative_slope * v })
}

/// Scalar sigmoid: σ(x) = 1 / (1 + exp(-x))
#[inline]
#[must_use]
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Softplus: `ln(1 + exp(x))`, evaluated as `max(x, 0) + ln(1 + exp(-|x|))`
/// so large magnitudes neither overflow nor lose the linear tail.
#[inline]
#[must_use]
pub fn softplus(x: f32) -> f32 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// Three-valued sign: -1, 0 or 1.
///
/// Unlike [`f32::signum`], zero maps to zero, so perturbing an exact zero
/// leaves it untouched.
#[inline]
#[must_use]
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Numerically stable `ln(Σ exp(xᵢ))`.
#[must_use]
pub fn log_sum_exp(xs: &[f32]) -> f32 {
    let max = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return max;
    }
    max + xs.iter().map(|&x| (x - max).exp()).sum::<f32>().ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaky_relu() {
        let x = Matrix::from_vec(1, 4, vec![-2.0, -0.5, 0.0, 3.0]).expect("valid");
        let y = leaky_relu(&x, 0.01);
        assert_eq!(y.as_slice(), &[-0.02, -0.005, 0.0, 3.0]);
    }

    #[test]
    fn test_sigmoid_range_and_symmetry() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-7);
        for &x in &[-50.0_f32, -3.0, 0.7, 12.0, 50.0] {
            let s = sigmoid(x);
            assert!((0.0..=1.0).contains(&s));
            assert!((s + sigmoid(-x) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_softplus() {
        assert!((softplus(0.0) - std::f32::consts::LN_2).abs() < 1e-7);
        assert!((softplus(100.0) - 100.0).abs() < 1e-4);
        assert!(softplus(-100.0) >= 0.0);
        assert!(softplus(-100.0) < 1e-30);
        assert!((softplus(1.0) - (1.0_f32 + 1.0_f32.exp()).ln()).abs() < 1e-6);
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(3.5), 1.0);
        assert_eq!(sign(-0.1), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
    }

    #[test]
    fn test_log_sum_exp() {
        let v = [1.0_f32, 2.0, 3.0];
        let naive = v.iter().map(|x| x.exp()).sum::<f32>().ln();
        assert!((log_sum_exp(&v) - naive).abs() < 1e-5);
        // no overflow for large inputs
        assert!((log_sum_exp(&[1000.0, 1000.0]) - (1000.0 + std::f32::consts::LN_2)).abs() < 1e-3);
    }
}

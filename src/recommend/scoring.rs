//! Scores, rankings and training losses over propagated embeddings.

use crate::error::{GcnError, Result};
use crate::nn::F;
use crate::primitives::Matrix;

/// Row norms below this are treated as this when normalizing views.
const VIEW_NORM_EPS: f32 = 1e-12;

/// Propagated and ego embeddings of one `(user, positive, negative)` batch.
///
/// Row `k` of every matrix belongs to triple `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingBatch {
    /// Propagated user rows.
    pub users: Matrix<f32>,
    /// Propagated positive-item rows.
    pub pos: Matrix<f32>,
    /// Propagated negative-item rows.
    pub neg: Matrix<f32>,
    /// Ego user rows.
    pub users_ego: Matrix<f32>,
    /// Ego positive-item rows.
    pub pos_ego: Matrix<f32>,
    /// Ego negative-item rows.
    pub neg_ego: Matrix<f32>,
}

impl EmbeddingBatch {
    /// Number of triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.n_rows()
    }

    /// True when the batch has no triples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<()> {
        let expected = self.users.shape();
        if expected.0 == 0 {
            return Err(GcnError::length("batch size", 1, 0));
        }
        for (context, m) in [
            ("positive items", &self.pos),
            ("negative items", &self.neg),
            ("ego users", &self.users_ego),
            ("ego positive items", &self.pos_ego),
            ("ego negative items", &self.neg_ego),
        ] {
            if m.shape() != expected {
                return Err(GcnError::shape(context, expected, m.shape()));
            }
        }
        Ok(())
    }
}

/// Sigmoid dot-product scoring and the pairwise ranking loss.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringHead;

impl ScoringHead {
    /// `sigmoid(<user_k, item_k>)` for every row pair.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the matrices differ in shape.
    pub fn score(users: &Matrix<f32>, items: &Matrix<f32>) -> Result<Vec<f32>> {
        Ok(users.row_dot(items)?.into_iter().map(F::sigmoid).collect())
    }

    /// Full `[n_users, n_items]` rating matrix `sigmoid(U · Iᵀ)`.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the widths differ.
    pub fn rank(users: &Matrix<f32>, items: &Matrix<f32>) -> Result<Matrix<f32>> {
        Ok(users.matmul_transposed(items)?.map(F::sigmoid))
    }

    /// BPR loss and L2 regularizer.
    ///
    /// ```text
    /// loss = mean_k softplus(<u_k, n_k> - <u_k, p_k>)
    /// reg  = ½ (‖U₀‖² + ‖P₀‖² + ‖N₀‖²) / batch
    /// ```
    ///
    /// The regularizer reads the ego rows; the caller weights it.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` for an empty batch or rows that don't line up.
    pub fn pairwise_loss(batch: &EmbeddingBatch) -> Result<(f32, f32)> {
        batch.check()?;
        let pos = batch.users.row_dot(&batch.pos)?;
        let neg = batch.users.row_dot(&batch.neg)?;
        let n = batch.len() as f32;
        let loss = pos.iter().zip(&neg).map(|(p, q)| F::softplus(q - p)).sum::<f32>() / n;
        let reg = 0.5
            * (batch.users_ego.squared_norm() + batch.pos_ego.squared_norm() + batch.neg_ego.squared_norm())
            / n;
        Ok((loss, reg))
    }

    /// InfoNCE between two views of the same rows.
    ///
    /// Rows are L2-normalized; row `k` of `view1` is pulled towards row `k`
    /// of `view2` and pushed from every other row of `view2`:
    ///
    /// ```text
    /// loss = mean_k [ logsumexp_j(<a_k, b_j>/τ) - <a_k, b_k>/τ ]
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` for empty or differently shaped views and
    /// `InvalidConfig` for a non-positive temperature.
    pub fn info_nce(view1: &Matrix<f32>, view2: &Matrix<f32>, temperature: f32) -> Result<f32> {
        if !(temperature > 0.0 && temperature.is_finite()) {
            return Err(GcnError::config("temperature", temperature, "finite and > 0"));
        }
        if view1.shape() != view2.shape() {
            return Err(GcnError::shape("contrastive views", view1.shape(), view2.shape()));
        }
        if view1.n_rows() == 0 {
            return Err(GcnError::length("contrastive rows", 1, 0));
        }
        let a = view1.normalize_rows(VIEW_NORM_EPS);
        let b = view2.normalize_rows(VIEW_NORM_EPS);
        let logits = a.matmul_transposed(&b)?.mul_scalar(1.0 / temperature);
        let total: f32 = (0..logits.n_rows())
            .map(|k| F::log_sum_exp(logits.row(k)) - logits.get(k, k))
            .sum();
        Ok(total / logits.n_rows() as f32)
    }
}

#[cfg(test)]
#[path = "scoring_tests.rs"]
mod tests;

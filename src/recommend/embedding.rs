//! Trainable user and item embedding tables.

use crate::error::{GcnError, Result};
use crate::nn::init::normal;
use crate::primitives::Matrix;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the tables are filled at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingInit {
    /// Every entry drawn from N(0, std).
    RandomNormal {
        /// Standard deviation
        std: f32,
    },
    /// Copy externally supplied tables.
    Pretrained {
        /// `n_users x latent_dim`
        users: Matrix<f32>,
        /// `n_items x latent_dim`
        items: Matrix<f32>,
    },
}

/// Holds one `latent_dim`-wide row per user and per item.
///
/// The tables are the ego embeddings: raw parameters before any message
/// passing. They change only through [`EmbeddingStore::users_mut`] and
/// [`EmbeddingStore::items_mut`], which an external optimizer uses.
///
/// # Example
///
/// ```
/// use lightgcn::recommend::{EmbeddingInit, EmbeddingStore};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let store = EmbeddingStore::initialize(3, 2, 4, EmbeddingInit::RandomNormal { std: 0.1 }, &mut rng)
///     .expect("valid sizes");
/// let all = store.concat().expect("same width");
/// assert_eq!(all.shape(), (5, 4));
/// let (users, items) = store.split(&all).expect("5 rows");
/// assert_eq!(&users, store.users());
/// assert_eq!(&items, store.items());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingStore {
    users: Matrix<f32>,
    items: Matrix<f32>,
}

impl EmbeddingStore {
    /// Create the tables.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a zero `latent_dim` or a non-positive
    /// `std`, and `ShapeMismatch` when pretrained tables aren't exactly
    /// `(n_users, latent_dim)` and `(n_items, latent_dim)`.
    pub fn initialize<R: Rng + ?Sized>(
        n_users: usize,
        n_items: usize,
        latent_dim: usize,
        init: EmbeddingInit,
        rng: &mut R,
    ) -> Result<Self> {
        if latent_dim == 0 {
            return Err(GcnError::config("latent_dim", latent_dim, "> 0"));
        }
        match init {
            EmbeddingInit::RandomNormal { std } => {
                if !(std > 0.0 && std.is_finite()) {
                    return Err(GcnError::config("init_std", std, "finite and > 0"));
                }
                Ok(Self {
                    users: normal(n_users, latent_dim, 0.0, std, rng),
                    items: normal(n_items, latent_dim, 0.0, std, rng),
                })
            }
            EmbeddingInit::Pretrained { users, items } => {
                if users.shape() != (n_users, latent_dim) {
                    return Err(GcnError::shape(
                        "pretrained user embeddings",
                        (n_users, latent_dim),
                        users.shape(),
                    ));
                }
                if items.shape() != (n_items, latent_dim) {
                    return Err(GcnError::shape(
                        "pretrained item embeddings",
                        (n_items, latent_dim),
                        items.shape(),
                    ));
                }
                Ok(Self { users, items })
            }
        }
    }

    /// Number of users.
    #[must_use]
    pub fn n_users(&self) -> usize {
        self.users.n_rows()
    }

    /// Number of items.
    #[must_use]
    pub fn n_items(&self) -> usize {
        self.items.n_rows()
    }

    /// Embedding width.
    #[must_use]
    pub fn latent_dim(&self) -> usize {
        self.users.n_cols()
    }

    /// User table.
    #[must_use]
    pub fn users(&self) -> &Matrix<f32> {
        &self.users
    }

    /// Item table.
    #[must_use]
    pub fn items(&self) -> &Matrix<f32> {
        &self.items
    }

    /// Mutable user table, for an external optimizer.
    pub fn users_mut(&mut self) -> &mut Matrix<f32> {
        &mut self.users
    }

    /// Mutable item table, for an external optimizer.
    pub fn items_mut(&mut self) -> &mut Matrix<f32> {
        &mut self.items
    }

    /// Ego embeddings of the given users.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an index `>= n_users`.
    pub fn lookup_users(&self, indices: &[usize]) -> Result<Matrix<f32>> {
        check_indices("user", indices, self.n_users())?;
        Ok(self.users.gather_rows(indices))
    }

    /// Ego embeddings of the given items.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for an index `>= n_items`.
    pub fn lookup_items(&self, indices: &[usize]) -> Result<Matrix<f32>> {
        check_indices("item", indices, self.n_items())?;
        Ok(self.items.gather_rows(indices))
    }

    /// `[users | items]` stacked by rows.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if an optimizer left the tables with
    /// different widths.
    pub fn concat(&self) -> Result<Matrix<f32>> {
        self.users.vstack(&self.items)
    }

    /// Inverse of [`concat`](Self::concat) for any matrix over the node set.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `all` doesn't have `n_users + n_items` rows.
    pub fn split(&self, all: &Matrix<f32>) -> Result<(Matrix<f32>, Matrix<f32>)> {
        let n = self.n_users() + self.n_items();
        if all.n_rows() != n {
            return Err(GcnError::shape("node split", (n, all.n_cols()), all.shape()));
        }
        all.split_rows(self.n_users())
    }
}

/// Reject indices outside `0..len`.
pub(crate) fn check_indices(kind: &'static str, indices: &[usize], len: usize) -> Result<()> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(GcnError::IndexOutOfRange { kind, index, len }),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "embedding_tests.rs"]
mod tests;

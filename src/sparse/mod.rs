//! Compressed Sparse Row (CSR) matrices for graph propagation.
//!
//! The adjacency of the user-item graph is stored as three flat vectors
//! (`row_ptr`, `col_indices`, `values`), so a propagation step is a single
//! sequential sweep over the stored entries:
//!
//! ```text
//! out[i] = Σ_{k in row_ptr[i]..row_ptr[i+1]} values[k] * dense[col_indices[k]]
//! ```
//!
//! Operations that derive a new graph (edge dropout, masking) never
//! densify: they produce a new CSR with the same or fewer stored entries.
//!
//! # Examples
//!
//! ```
//! use lightgcn::sparse::CsrMatrix;
//! use lightgcn::primitives::Matrix;
//!
//! let a = CsrMatrix::from_triplets(2, 2, &[(0, 1, 0.5), (1, 0, 0.5)]).expect("in range");
//! let x = Matrix::from_vec(2, 1, vec![2.0, 4.0]).expect("valid");
//! let y = a.spmm(&x).expect("compatible");
//! assert_eq!(y.as_slice(), &[2.0, 1.0]);
//! ```

use crate::error::{GcnError, Result};
use crate::primitives::Matrix;
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Sparse real-valued matrix in CSR layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,      // length n_rows + 1
    col_indices: Vec<usize>,  // sorted within each row
    values: Vec<f32>,         // parallel to col_indices
}

impl CsrMatrix {
    /// Empty matrix with no stored entries.
    #[must_use]
    pub fn empty(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            row_ptr: vec![0; n_rows + 1],
            col_indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Square identity matrix.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self {
            n_rows: n,
            n_cols: n,
            row_ptr: (0..=n).collect(),
            col_indices: (0..n).collect(),
            values: vec![1.0; n],
        }
    }

    /// Build from `(row, col, value)` triplets. Duplicate coordinates are
    /// summed; columns are sorted within each row.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if a coordinate falls outside the matrix.
    pub fn from_triplets(n_rows: usize, n_cols: usize, triplets: &[(usize, usize, f32)]) -> Result<Self> {
        let mut adj: Vec<Vec<(usize, f32)>> = vec![Vec::new(); n_rows];
        for &(r, c, v) in triplets {
            if r >= n_rows || c >= n_cols {
                return Err(GcnError::ShapeMismatch {
                    context: "sparse triplet".to_string(),
                    expected: format!("coordinate within {n_rows}x{n_cols}"),
                    actual: format!("({r}, {c})"),
                });
            }
            adj[r].push((c, v));
        }

        let mut row_ptr = Vec::with_capacity(n_rows + 1);
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        row_ptr.push(0);
        for row in &mut adj {
            row.sort_unstable_by_key(|&(c, _)| c);
            let row_start = col_indices.len();
            for &(c, v) in row.iter() {
                if col_indices.len() > row_start && col_indices.last() == Some(&c) {
                    if let Some(last) = values.last_mut() {
                        *last += v;
                    }
                } else {
                    col_indices.push(c);
                    values.push(v);
                }
            }
            row_ptr.push(col_indices.len());
        }

        Ok(Self {
            n_rows,
            n_cols,
            row_ptr,
            col_indices,
            values,
        })
    }

    /// Returns the shape as (rows, cols).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values stored in row `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> (&[usize], &[f32]) {
        let (start, end) = (self.row_ptr[i], self.row_ptr[i + 1]);
        (&self.col_indices[start..end], &self.values[start..end])
    }

    /// Value at (row, col), zero when not stored.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        let (cols, vals) = self.row(row);
        cols.binary_search(&col).map_or(0.0, |k| vals[k])
    }

    /// Iterate over stored `(row, col, value)` entries in row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (0..self.n_rows).flat_map(move |i| {
            let (cols, vals) = self.row(i);
            cols.iter().zip(vals).map(move |(&c, &v)| (i, c, v))
        })
    }

    /// Sparse × dense product.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `dense` doesn't have `n_cols` rows.
    pub fn spmm(&self, dense: &Matrix<f32>) -> Result<Matrix<f32>> {
        if dense.n_rows() != self.n_cols {
            return Err(GcnError::shape(
                "spmm",
                (self.n_cols, dense.n_cols()),
                dense.shape(),
            ));
        }
        let width = dense.n_cols();
        let mut out = Matrix::zeros(self.n_rows, width);
        if width == 0 {
            return Ok(out);
        }

        let fill_row = |(i, out_row): (usize, &mut [f32])| {
            let (cols, vals) = self.row(i);
            for (&c, &v) in cols.iter().zip(vals) {
                for (o, &x) in out_row.iter_mut().zip(dense.row(c)) {
                    *o += v * x;
                }
            }
        };

        #[cfg(feature = "parallel")]
        out.as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(fill_row);

        #[cfg(not(feature = "parallel"))]
        out.as_mut_slice()
            .chunks_mut(width)
            .enumerate()
            .for_each(fill_row);

        Ok(out)
    }

    /// Multiply column `j` by `scale[j]`. Entries that become zero are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `scale` doesn't have `n_cols` entries.
    pub fn scale_columns(&self, scale: &[f32]) -> Result<Self> {
        if scale.len() != self.n_cols {
            return Err(GcnError::length("column scale", self.n_cols, scale.len()));
        }
        Ok(self.filter_map_entries(|_, c, v| v * scale[c]))
    }

    /// Multiply row `i` by `scale[i]`. Entries that become zero are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `scale` doesn't have `n_rows` entries.
    pub fn scale_rows(&self, scale: &[f32]) -> Result<Self> {
        if scale.len() != self.n_rows {
            return Err(GcnError::length("row scale", self.n_rows, scale.len()));
        }
        Ok(self.filter_map_entries(|r, _, v| v * scale[r]))
    }

    /// Stochastic edge dropout.
    ///
    /// Every stored entry is kept independently when `u + keep_prob >= 1`
    /// for `u ~ U[0, 1)`, i.e. with probability `keep_prob`, and survivors
    /// are rescaled by `1 / keep_prob`. The original matrix is untouched.
    /// Mirror entries `(i, j)` and `(j, i)` are sampled separately, so the
    /// result need not be symmetric.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `keep_prob` is not in (0, 1].
    pub fn dropout<R: Rng + ?Sized>(&self, keep_prob: f32, rng: &mut R) -> Result<Self> {
        if !(keep_prob > 0.0 && keep_prob <= 1.0) {
            return Err(GcnError::config("keep_prob", keep_prob, "in (0, 1]"));
        }
        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for i in 0..self.n_rows {
            let (cols, vals) = self.row(i);
            for (&c, &v) in cols.iter().zip(vals) {
                let u: f32 = rng.gen();
                if u + keep_prob >= 1.0 {
                    col_indices.push(c);
                    values.push(v / keep_prob);
                }
            }
            row_ptr.push(col_indices.len());
        }
        Ok(Self {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr,
            col_indices,
            values,
        })
    }

    /// Split into `n_folds` contiguous row blocks. The last fold absorbs the
    /// remainder.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `n_folds` is zero or exceeds the row count.
    pub fn split_rows(&self, n_folds: usize) -> Result<Vec<Self>> {
        if n_folds == 0 || n_folds > self.n_rows.max(1) {
            return Err(GcnError::config("n_folds", n_folds, "in [1, n_rows]"));
        }
        let fold_len = self.n_rows / n_folds;
        let mut folds = Vec::with_capacity(n_folds);
        for f in 0..n_folds {
            let start = f * fold_len;
            let end = if f == n_folds - 1 { self.n_rows } else { start + fold_len };
            let (lo, hi) = (self.row_ptr[start], self.row_ptr[end]);
            folds.push(Self {
                n_rows: end - start,
                n_cols: self.n_cols,
                row_ptr: self.row_ptr[start..=end].iter().map(|p| p - lo).collect(),
                col_indices: self.col_indices[lo..hi].to_vec(),
                values: self.values[lo..hi].to_vec(),
            });
        }
        Ok(folds)
    }

    /// Stack row blocks back into one matrix.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the blocks have different column counts or
    /// the list is empty.
    pub fn vstack(blocks: &[Self]) -> Result<Self> {
        let first = blocks
            .first()
            .ok_or_else(|| GcnError::length("vstack blocks", 1, 0))?;
        let n_cols = first.n_cols;
        let mut out = Self::empty(0, n_cols);
        for block in blocks {
            if block.n_cols != n_cols {
                return Err(GcnError::shape(
                    "vstack",
                    (block.n_rows, n_cols),
                    block.shape(),
                ));
            }
            let offset = out.col_indices.len();
            out.row_ptr
                .extend(block.row_ptr[1..].iter().map(|p| p + offset));
            out.col_indices.extend_from_slice(&block.col_indices);
            out.values.extend_from_slice(&block.values);
            out.n_rows += block.n_rows;
        }
        Ok(out)
    }

    /// Whether `a[i][j] == a[j][i]` within `tol` for every stored entry.
    #[must_use]
    pub fn is_symmetric(&self, tol: f32) -> bool {
        self.n_rows == self.n_cols && self.iter().all(|(r, c, v)| (self.get(c, r) - v).abs() <= tol)
    }

    /// Dense copy, for inspection and tests.
    #[must_use]
    pub fn to_dense(&self) -> Matrix<f32> {
        let mut m = Matrix::zeros(self.n_rows, self.n_cols);
        for (r, c, v) in self.iter() {
            m.set(r, c, v);
        }
        m
    }

    fn filter_map_entries(&self, f: impl Fn(usize, usize, f32) -> f32) -> Self {
        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_indices = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());
        row_ptr.push(0);
        for i in 0..self.n_rows {
            let (cols, vals) = self.row(i);
            for (&c, &v) in cols.iter().zip(vals) {
                let nv = f(i, c, v);
                if nv != 0.0 {
                    col_indices.push(c);
                    values.push(nv);
                }
            }
            row_ptr.push(col_indices.len());
        }
        Self {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr,
            col_indices,
            values,
        }
    }
}

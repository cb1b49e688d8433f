//! Dense row-major matrix used for embeddings and propagated signals.

use crate::error::{GcnError, Result};
use serde::{Deserialize, Serialize};

/// A 2D matrix of floating-point values (row-major storage).
///
/// # Examples
///
/// ```
/// use lightgcn::primitives::Matrix;
///
/// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("data length matches rows * cols");
/// assert_eq!(m.shape(), (2, 3));
/// assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Copy> Matrix<T> {
    /// Creates a new matrix from a vector of data.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if data length doesn't match rows * cols.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(GcnError::length("matrix data", rows * cols, data.len()));
        }
        Ok(Self { data, rows, cols })
    }

    /// Returns the shape as (rows, cols).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.cols
    }

    /// Gets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    /// Sets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    /// Borrows a row.
    #[must_use]
    pub fn row(&self, row_idx: usize) -> &[T] {
        let start = row_idx * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Mutably borrows a row.
    pub fn row_mut(&mut self, row_idx: usize) -> &mut [T] {
        let start = row_idx * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Returns the underlying data as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the underlying data as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Copies the listed rows into a new matrix, in the given order.
    ///
    /// Indices are not checked here; callers validate against their own
    /// node counts so the error names the right index space.
    #[must_use]
    pub fn gather_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    /// Stacks `self` on top of `other`.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the column counts differ.
    pub fn vstack(&self, other: &Self) -> Result<Self> {
        if self.cols != other.cols {
            return Err(GcnError::shape(
                "vstack",
                (other.rows, self.cols),
                other.shape(),
            ));
        }
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Ok(Self {
            data,
            rows: self.rows + other.rows,
            cols: self.cols,
        })
    }

    /// Splits into the first `at` rows and the remaining rows.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `at` exceeds the row count.
    pub fn split_rows(&self, at: usize) -> Result<(Self, Self)> {
        if at > self.rows {
            return Err(GcnError::length("split_rows", self.rows, at));
        }
        let (top, bottom) = self.data.split_at(at * self.cols);
        Ok((
            Self {
                data: top.to_vec(),
                rows: at,
                cols: self.cols,
            },
            Self {
                data: bottom.to_vec(),
                rows: self.rows - at,
                cols: self.cols,
            },
        ))
    }
}

impl Matrix<f32> {
    /// Creates a matrix of zeros.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Creates a matrix of ones.
    #[must_use]
    pub fn ones(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![1.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Creates an identity matrix.
    #[must_use]
    pub fn eye(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self {
            data,
            rows: n,
            cols: n,
        }
    }

    /// Transposes the matrix.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut data = vec![0.0; self.rows * self.cols];
        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        Self {
            data,
            rows: self.cols,
            cols: self.rows,
        }
    }

    /// Matrix-matrix multiplication.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if inner dimensions don't match.
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(GcnError::shape(
                "matmul",
                (self.cols, other.cols),
                other.shape(),
            ));
        }

        // i-k-j order keeps both inner accesses sequential
        let mut result = vec![0.0; self.rows * other.cols];
        for i in 0..self.rows {
            let out = &mut result[i * other.cols..(i + 1) * other.cols];
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a == 0.0 {
                    continue;
                }
                for (o, &b) in out.iter_mut().zip(other.row(k)) {
                    *o += a * b;
                }
            }
        }

        Ok(Self {
            data: result,
            rows: self.rows,
            cols: other.cols,
        })
    }

    /// Multiplies by the transpose of `other` without materializing it:
    /// `self · otherᵀ`.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the column counts differ.
    pub fn matmul_transposed(&self, other: &Self) -> Result<Self> {
        if self.cols != other.cols {
            return Err(GcnError::shape(
                "matmul_transposed",
                (other.rows, self.cols),
                other.shape(),
            ));
        }
        let mut data = Vec::with_capacity(self.rows * other.rows);
        for i in 0..self.rows {
            let a = self.row(i);
            for j in 0..other.rows {
                data.push(dot(a, other.row(j)));
            }
        }
        Ok(Self {
            data,
            rows: self.rows,
            cols: other.rows,
        })
    }

    /// Adds another matrix element-wise.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if dimensions don't match.
    pub fn add(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        out.add_scaled(other, 1.0)?;
        Ok(out)
    }

    /// In-place `self += scale * other`.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if dimensions don't match.
    pub fn add_scaled(&mut self, other: &Self, scale: f32) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(GcnError::shape("add", self.shape(), other.shape()));
        }
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a += scale * b;
        }
        Ok(())
    }

    /// Multiplies each element by a scalar.
    #[must_use]
    pub fn mul_scalar(&self, scalar: f32) -> Self {
        Self {
            data: self.data.iter().map(|x| x * scalar).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Applies `f` to every element.
    #[must_use]
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            data: self.data.iter().map(|&x| f(x)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Squared Frobenius norm.
    #[must_use]
    pub fn squared_norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum()
    }

    /// Row-wise dot product with another matrix of the same shape.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if dimensions don't match.
    pub fn row_dot(&self, other: &Self) -> Result<Vec<f32>> {
        if self.shape() != other.shape() {
            return Err(GcnError::shape("row_dot", self.shape(), other.shape()));
        }
        Ok((0..self.rows)
            .map(|i| dot(self.row(i), other.row(i)))
            .collect())
    }

    /// Scales every row to unit L2 norm. Rows with norm below `eps` are
    /// divided by `eps` instead.
    #[must_use]
    pub fn normalize_rows(&self, eps: f32) -> Self {
        let mut out = self.clone();
        for i in 0..out.rows {
            let row = out.row_mut(i);
            let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt().max(eps);
            for v in row.iter_mut() {
                *v /= norm;
            }
        }
        out
    }
}

/// Dot product of two equal-length slices.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
#[path = "matrix_tests.rs"]
mod tests;

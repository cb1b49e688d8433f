//! Core compute primitives.
//!
//! Dense row-major [`Matrix`] for embedding tables and propagated signals.
//! Sparse adjacency lives in [`crate::sparse`].

mod matrix;

pub use matrix::{dot, Matrix};

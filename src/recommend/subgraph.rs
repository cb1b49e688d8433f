//! Per-group masked adjacency.
//!
//! Subgraph `g` keeps an edge `(i, j)` only when both endpoints belong to
//! group `g`. Items belong to every group, so in a bipartite graph this keeps
//! exactly the edges touching users labelled `g`.

use super::group::GroupAssignment;
use crate::error::{GcnError, Result};
use crate::sparse::CsrMatrix;

/// Builds masked copies of the base adjacency.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubgraphBuilder;

impl SubgraphBuilder {
    /// Subgraph for group `g`: columns then rows scaled by the 0/1 membership
    /// vector, zeroed entries pruned.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `g >= groups`, and `ShapeMismatch` if
    /// the adjacency isn't square over the assignment's node set.
    pub fn build(base: &CsrMatrix, assignment: &GroupAssignment, g: usize) -> Result<CsrMatrix> {
        if g >= assignment.groups() {
            return Err(GcnError::IndexOutOfRange {
                kind: "group",
                index: g,
                len: assignment.groups(),
            });
        }
        let n = assignment.n_nodes();
        if base.shape() != (n, n) {
            return Err(GcnError::shape("subgraph base adjacency", (n, n), base.shape()));
        }
        let mask = assignment.membership(g);
        base.scale_columns(&mask)?.scale_rows(&mask)
    }

    /// One subgraph per group, in group order.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_all(base: &CsrMatrix, assignment: &GroupAssignment) -> Result<Vec<CsrMatrix>> {
        (0..assignment.groups())
            .map(|g| Self::build(base, assignment, g))
            .collect()
    }
}

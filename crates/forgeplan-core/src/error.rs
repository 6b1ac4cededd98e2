//! Solve-level error taxonomy.
//!
//! Infeasible/unbounded results are *not* errors: they surface as a
//! [`SolveStatus`](crate::backend::SolveStatus) on the solution so the
//! caller (or the suggestion engine) can react. Errors here abort the
//! current solve and never yield a partially built solution.

use crate::backend::BackendError;
use crate::graph::GraphError;

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// A recipe claims to produce in a building with no catalog entry.
    /// Indicates a catalog/data integrity fault; the whole solve aborts.
    #[error("recipe {recipe} produces in unknown building {building}")]
    UnresolvableRecipe { recipe: String, building: String },

    /// The request references an item class name absent from the catalog.
    #[error("unknown resource reference: {0}")]
    UnknownResourceReference(String),

    /// The request references a recipe class name absent from the catalog.
    #[error("unknown recipe reference: {0}")]
    UnknownRecipeReference(String),

    /// The LP backend failed to run. Distinct from an infeasible result.
    #[error("solver unavailable: {0}")]
    SolverUnavailable(#[from] BackendError),

    /// Internal graph invariant violation (a constraint referenced a
    /// variable with no node, or an edge a missing node).
    #[error(transparent)]
    Graph(#[from] GraphError),
}

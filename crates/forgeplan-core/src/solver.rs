//! The solve pipeline: build, formulate, invoke the backend, interpret.
//!
//! One call = one graph build + one formulation + one backend invocation +
//! one interpretation, strictly in that order, with the whole intermediate
//! state owned by the call. Infeasible and unbounded results come back as
//! a [`Solution`] status; only catalog faults and backend failures are
//! errors.

use crate::backend::{Backend, MicrolpBackend, RawSolution, SolveStatus};
use crate::builder::build_request_graph;
use crate::catalog::Catalog;
use crate::error::SolveError;
use crate::formulate::formulate;
use crate::interpret::{Solution, interpret};
use crate::request::SolverRequest;

/// Solve a production request with the default backend.
pub fn solve_production<'a>(
    catalog: &'a Catalog,
    request: &'a SolverRequest,
) -> Result<Solution<'a>, SolveError> {
    solve_with_backend(catalog, request, &MicrolpBackend::new())
}

/// Solve a production request against a caller-provided backend.
pub fn solve_with_backend<'a>(
    catalog: &'a Catalog,
    request: &'a SolverRequest,
    backend: &dyn Backend,
) -> Result<Solution<'a>, SolveError> {
    let mut ctx = build_request_graph(catalog, request)?;
    let formulation = formulate(&mut ctx, request)?;
    if !formulation.unproducible.is_empty() {
        // A demanded item with no recipes and no extraction can never be
        // satisfied; skip the backend and report the result directly.
        return Ok(interpret(
            ctx,
            request,
            RawSolution::non_optimal(SolveStatus::Infeasible),
        ));
    }
    let raw = backend.solve(&formulation.problem)?;
    Ok(interpret(ctx, request, raw))
}

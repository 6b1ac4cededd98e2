//! Forgeplan Core -- production-chain planning for factory-building games.
//!
//! Given desired output rates (and optionally fixed inputs), the solver
//! determines which recipes, in what quantities, and through which
//! machines satisfy the request while minimizing a chosen objective
//! (power, resource use, or footprint).
//!
//! # Solve Pipeline
//!
//! Each call to [`solver::solve_production`] runs four phases over state
//! owned exclusively by that call:
//!
//! 1. **Build** -- [`builder::BuildContext`] recursively walks the recipes
//!    able to produce the requested resources, emitting typed graph nodes
//!    and linear constraints ([`builder::BuildContext::compute_production_constraints`]).
//! 2. **Formulate** -- [`formulate::formulate`] assembles the objective
//!    row, per-item balance rows, and the request's output/input pins into
//!    one [`expr::LpProblem`].
//! 3. **Solve** -- [`backend::Backend`] marshals the problem into the
//!    external LP engine and returns a status plus variable assignment.
//! 4. **Interpret** -- [`interpret::interpret`] converts the assignment
//!    into typed Resource/Machine/Byproduct nodes and display edges.
//!
//! Infeasible results are ordinary statuses, not errors; feed them to
//! [`suggest::suggest_fixes`] for actionable relaxation proposals.
//!
//! # Key Types
//!
//! - [`catalog::Catalog`] -- Immutable item/recipe/building tables
//!   (frozen at startup, shared across solves).
//! - [`request::SolverRequest`] -- Outputs, bounded inputs, recipe sets,
//!   per-recipe overrides, and the objective.
//! - [`interpret::Solution`] -- Typed nodes/edges plus the originating
//!   build context, kept for introspection.
//! - [`graph::ConstraintGraph`] -- Slotmap-keyed node/edge storage with
//!   deterministic variable naming (`p{item}r{recipe}`), so node identity
//!   is stable across re-solves.

pub mod backend;
pub mod builder;
pub mod catalog;
pub mod error;
pub mod expr;
pub mod formulate;
pub mod graph;
pub mod id;
pub mod interpret;
pub mod request;
pub mod solver;
pub mod suggest;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

//! Fallback search over relaxed constraints.
//!
//! When a solve comes back non-optimal, the engine re-runs it with
//! progressively relaxed constraints and turns whichever relaxation first
//! succeeds into concrete, actionable suggestions:
//!
//! 1. Relax "at least, but maximize" output minimums to zero.
//! 2. Additionally allow every MAM research recipe, minimizing power.
//! 3. Additionally allow every known recipe (including blocked ones).
//!
//! Each step is a complete, independent re-solve. Only non-optimal solve
//! *statuses* are absorbed here; real errors propagate unchanged.

use crate::backend::{Backend, MicrolpBackend};
use crate::builder::effective_allowed_recipes;
use crate::catalog::{Catalog, RecipeKind};
use crate::error::SolveError;
use crate::interpret::{NODE_EPSILON, Solution};
use crate::request::{Objective, OutputMode, SolverRequest};
use crate::solver::solve_with_backend;
use serde::Serialize;
use std::collections::HashSet;

/// A concrete fix the UI can offer for an unsatisfiable request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Suggestion {
    /// Dropping this output's minimum makes the request solvable; the
    /// achievable rate is what the relaxed solve actually produced.
    ResetOutputMinimum {
        item: String,
        requested_per_min: f64,
        achievable_per_min: f64,
    },
    /// Unlocking these recipes makes the request solvable.
    UnlockRecipes { recipes: Vec<String> },
}

/// Propose fixes for a non-optimal solution. Returns an empty list when the
/// solution is already optimal or when no relaxation helps.
pub fn suggest_fixes(
    catalog: &Catalog,
    request: &SolverRequest,
    solution: &Solution<'_>,
) -> Result<Vec<Suggestion>, SolveError> {
    suggest_fixes_with_backend(catalog, request, solution, &MicrolpBackend::new())
}

pub fn suggest_fixes_with_backend(
    catalog: &Catalog,
    request: &SolverRequest,
    solution: &Solution<'_>,
    backend: &dyn Backend,
) -> Result<Vec<Suggestion>, SolveError> {
    if solution.status.is_optimal() {
        return Ok(Vec::new());
    }

    // Step 1: relax maximize-mode output minimums.
    if request
        .outputs
        .iter()
        .any(|o| o.mode == OutputMode::AtLeastMaximize)
    {
        let mut relaxed = request.clone();
        for output in &mut relaxed.outputs {
            if output.mode == OutputMode::AtLeastMaximize {
                output.amount_per_min = 0.0;
            }
        }
        let attempt = solve_with_backend(catalog, &relaxed, backend)?;
        if attempt.status.is_optimal() {
            let mut suggestions = Vec::new();
            for output in &request.outputs {
                if output.mode != OutputMode::AtLeastMaximize {
                    continue;
                }
                let achieved = achieved_rate(&attempt, &output.item);
                if achieved + NODE_EPSILON < output.amount_per_min {
                    suggestions.push(Suggestion::ResetOutputMinimum {
                        item: output.item.clone(),
                        requested_per_min: output.amount_per_min,
                        achievable_per_min: achieved,
                    });
                }
            }
            return Ok(suggestions);
        }
    }

    // Step 2: the current set plus every default and MAM research recipe,
    // minimizing power.
    let base_allowed = effective_allowed_recipes(catalog, request)?;
    let widened: HashSet<String> = catalog
        .recipes()
        .filter(|(idx, r)| {
            base_allowed.contains(idx)
                || matches!(r.kind, RecipeKind::Default | RecipeKind::Mam)
        })
        .map(|(_, r)| r.class_name.clone())
        .collect();
    if let Some(suggestions) =
        try_unlock(catalog, request, backend, widened, &base_allowed, false)?
    {
        return Ok(suggestions);
    }

    // Step 3: literally every known recipe, user blocks included.
    let all: HashSet<String> = catalog
        .recipes()
        .map(|(_, r)| r.class_name.clone())
        .collect();
    if let Some(suggestions) = try_unlock(catalog, request, backend, all, &base_allowed, true)? {
        return Ok(suggestions);
    }

    // Step 4: nothing helps; the request is unsatisfiable as stated.
    Ok(Vec::new())
}

/// Re-solve with a widened allowed set; if optimal, report the added
/// recipes the solution actually uses.
fn try_unlock(
    catalog: &Catalog,
    request: &SolverRequest,
    backend: &dyn Backend,
    allowed: HashSet<String>,
    base_allowed: &HashSet<crate::id::RecipeIdx>,
    clear_blocks: bool,
) -> Result<Option<Vec<Suggestion>>, SolveError> {
    let mut widened = request.clone();
    widened.allowed_recipes = Some(allowed);
    widened.objective = Objective::MinimizePower;
    if clear_blocks {
        widened.blocked_recipes.clear();
    }
    let attempt = solve_with_backend(catalog, &widened, backend)?;
    if !attempt.status.is_optimal() {
        return Ok(None);
    }
    let mut recipes: Vec<String> = attempt
        .machines
        .iter()
        .filter(|m| !base_allowed.contains(&m.recipe))
        .map(|m| m.recipe_class.clone())
        .collect();
    recipes.sort();
    recipes.dedup();
    Ok(Some(vec![Suggestion::UnlockRecipes { recipes }]))
}

/// Net output rate of an item in a solution: its byproduct channel total,
/// or the extracted rate for a raw pass-through item.
fn achieved_rate(solution: &Solution<'_>, class_name: &str) -> f64 {
    let byproduct = solution.byproduct_total(class_name);
    if byproduct > 0.0 {
        byproduct
    } else {
        solution.resource_total(class_name)
    }
}

//! Solver adapter: marshals an [`LpProblem`] into the external LP backend.
//!
//! No business logic lives here. The backend is a black box capable of
//! solving a system of linear equalities/inequalities plus variable bounds,
//! returning a status and a variable assignment. The default backend is
//! `microlp` via the `good_lp` front-end; anything implementing [`Backend`]
//! can be swapped in without touching builder or interpreter code.

use crate::expr::{ConstraintOp, LinearExpr, LpProblem, Sense};
use good_lp::{Expression, ProblemVariables, ResolutionError, Solution as _, SolverModel, Variable, microlp, variable};
use std::collections::HashMap;

/// Terminal status of a solve attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// An optimal assignment was found.
    Optimal,
    /// The constraint system admits no feasible assignment.
    Infeasible,
    /// The objective is unbounded below (or above, for maximization).
    Unbounded,
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

/// Raw backend output: status plus the full variable assignment.
#[derive(Debug, Clone)]
pub struct RawSolution {
    pub status: SolveStatus,
    /// Variable name -> value. Empty unless the status is `Optimal`.
    pub values: HashMap<String, f64>,
    /// Objective value at the returned assignment.
    pub objective: f64,
}

impl RawSolution {
    /// An empty assignment carrying a non-optimal status.
    pub fn non_optimal(status: SolveStatus) -> Self {
        Self {
            status,
            values: HashMap::new(),
            objective: 0.0,
        }
    }

    pub fn value(&self, var: &str) -> f64 {
        self.values.get(var).copied().unwrap_or(0.0)
    }
}

/// A backend failure: the engine crashed, rejected the model, or never
/// initialized. Never used for infeasible results.
#[derive(Debug, thiserror::Error)]
#[error("LP backend failure: {0}")]
pub struct BackendError(pub String);

/// Narrow interface over the external LP/MIP engine.
pub trait Backend {
    fn solve(&self, problem: &LpProblem) -> Result<RawSolution, BackendError>;
}

// ---------------------------------------------------------------------------
// microlp backend
// ---------------------------------------------------------------------------

/// The default pure-Rust backend (`microlp` through `good_lp`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrolpBackend;

impl MicrolpBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for MicrolpBackend {
    fn solve(&self, problem: &LpProblem) -> Result<RawSolution, BackendError> {
        let mut vars = ProblemVariables::new();
        let names = problem.variable_names();
        let mut handles: HashMap<&str, Variable> = HashMap::with_capacity(names.len());
        for name in &names {
            let (min, max) = problem.effective_bounds(name);
            let mut def = variable().min(min).name(name.clone());
            if max.is_finite() {
                def = def.max(max);
            }
            handles.insert(name.as_str(), vars.add(def));
        }

        let objective = to_expression(&problem.objective, &handles);
        let mut model = match problem.sense {
            Sense::Minimize => vars.minimise(objective).using(microlp),
            Sense::Maximize => vars.maximise(objective).using(microlp),
        };

        for constraint in &problem.constraints {
            let lhs = to_expression(&constraint.expr, &handles);
            let rhs = Expression::from_other_affine(constraint.rhs);
            let row = match constraint.op {
                ConstraintOp::Eq => lhs.eq(rhs),
                ConstraintOp::Le => lhs.leq(rhs),
                ConstraintOp::Ge => lhs.geq(rhs),
            };
            model = model.with(row);
        }

        match model.solve() {
            Ok(solution) => {
                let values: HashMap<String, f64> = handles
                    .iter()
                    .map(|(&name, &var)| (name.to_string(), solution.value(var)))
                    .collect();
                let objective = problem.objective.evaluate(&values);
                Ok(RawSolution {
                    status: SolveStatus::Optimal,
                    values,
                    objective,
                })
            }
            Err(ResolutionError::Infeasible) => {
                Ok(RawSolution::non_optimal(SolveStatus::Infeasible))
            }
            Err(ResolutionError::Unbounded) => {
                Ok(RawSolution::non_optimal(SolveStatus::Unbounded))
            }
            Err(other) => Err(BackendError(other.to_string())),
        }
    }
}

fn to_expression(expr: &LinearExpr, handles: &HashMap<&str, Variable>) -> Expression {
    let mut out = Expression::default();
    for (name, coef) in expr.terms() {
        // Every term variable is registered up front via variable_names().
        out += coef * handles[name];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Bound, Constraint};

    /// min r0 + r1  s.t.  r0 + r1 >= 10, r0 <= 4
    #[test]
    fn solves_a_small_system() {
        let mut problem =
            LpProblem::minimize(LinearExpr::var("r0").with_term("r1", 1.0));
        problem.constraints.push(Constraint::ge(
            "demand",
            LinearExpr::var("r0").with_term("r1", 1.0),
            10.0,
        ));
        problem.bounds.push(Bound::at_most("r0", 4.0));

        let raw = MicrolpBackend::new().solve(&problem).unwrap();
        assert_eq!(raw.status, SolveStatus::Optimal);
        assert!((raw.value("r0") + raw.value("r1") - 10.0).abs() < 1e-6);
        assert!((raw.objective - 10.0).abs() < 1e-6);
    }

    #[test]
    fn reports_infeasible_as_status() {
        let mut problem = LpProblem::minimize(LinearExpr::var("x"));
        problem
            .constraints
            .push(Constraint::ge("lo", LinearExpr::var("x"), 10.0));
        problem.bounds.push(Bound::at_most("x", 5.0));

        let raw = MicrolpBackend::new().solve(&problem).unwrap();
        assert_eq!(raw.status, SolveStatus::Infeasible);
        assert!(raw.values.is_empty());
    }

    #[test]
    fn reports_unbounded_as_status() {
        // maximize x with no upper bound
        let mut problem = LpProblem::minimize(LinearExpr::new());
        problem.sense = Sense::Maximize;
        problem.objective = LinearExpr::var("x");
        problem
            .constraints
            .push(Constraint::ge("lo", LinearExpr::var("x"), 0.0));

        let raw = MicrolpBackend::new().solve(&problem).unwrap();
        assert_eq!(raw.status, SolveStatus::Unbounded);
    }

    #[test]
    fn equality_rows_pin_values() {
        let mut problem = LpProblem::minimize(LinearExpr::var("y"));
        problem.constraints.push(Constraint::eq(
            "pin",
            LinearExpr::var("x").with_term("y", -2.0),
            0.0,
        ));
        problem
            .constraints
            .push(Constraint::eq("fix", LinearExpr::var("x"), 8.0));

        let raw = MicrolpBackend::new().solve(&problem).unwrap();
        assert_eq!(raw.status, SolveStatus::Optimal);
        assert!((raw.value("x") - 8.0).abs() < 1e-6);
        assert!((raw.value("y") - 4.0).abs() < 1e-6);
    }
}

//! Typed sparse linear expressions, constraints, and the assembled problem.
//!
//! The solver core accumulates every relationship as a [`Constraint`] or
//! [`Bound`] over deterministically named variables, then hands the full
//! [`LpProblem`] to a backend. No string formatting or parsing is involved;
//! an expression is a sparse variable -> coefficient map.

use std::collections::BTreeMap;
use std::fmt;

/// A sparse linear expression: sum of `coefficient * variable` terms.
///
/// Terms are keyed by variable name in a `BTreeMap` so iteration order (and
/// therefore backend marshalling and `Display` output) is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<String, f64>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single `1.0 * var` term.
    pub fn var(name: impl Into<String>) -> Self {
        let mut expr = Self::new();
        expr.add_term(name, 1.0);
        expr
    }

    /// Add `coefficient * var` to the expression, merging with any existing
    /// term for the same variable. Terms that cancel to zero are kept (a
    /// zero coefficient still references the variable).
    pub fn add_term(&mut self, name: impl Into<String>, coefficient: f64) -> &mut Self {
        *self.terms.entry(name.into()).or_insert(0.0) += coefficient;
        self
    }

    /// Builder-style variant of [`add_term`](Self::add_term).
    pub fn with_term(mut self, name: impl Into<String>, coefficient: f64) -> Self {
        self.add_term(name, coefficient);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> {
        self.terms.iter().map(|(name, &coef)| (name.as_str(), coef))
    }

    /// Variable names referenced by this expression.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// Evaluate the expression against a variable assignment. Missing
    /// variables count as zero.
    pub fn evaluate(&self, values: &std::collections::HashMap<String, f64>) -> f64 {
        self.terms
            .iter()
            .map(|(name, coef)| coef * values.get(name).copied().unwrap_or(0.0))
            .sum()
    }
}

impl fmt::Display for LinearExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, coef) in &self.terms {
            if first {
                write!(f, "{coef}*{name}")?;
                first = false;
            } else if *coef < 0.0 {
                write!(f, " - {}*{name}", -coef)?;
            } else {
                write!(f, " + {coef}*{name}")?;
            }
        }
        if first {
            write!(f, "0")?;
        }
        Ok(())
    }
}

/// Comparison operator of a constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Eq,
    Le,
    Ge,
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintOp::Eq => write!(f, "="),
            ConstraintOp::Le => write!(f, "<="),
            ConstraintOp::Ge => write!(f, ">="),
        }
    }
}

/// One linear constraint row: `expr op rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Label for diagnostics, e.g. `balance:Desc_Stone_C`.
    pub name: String,
    pub expr: LinearExpr,
    pub op: ConstraintOp,
    pub rhs: f64,
}

impl Constraint {
    pub fn eq(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            op: ConstraintOp::Eq,
            rhs,
        }
    }

    pub fn le(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            op: ConstraintOp::Le,
            rhs,
        }
    }

    pub fn ge(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            op: ConstraintOp::Ge,
            rhs,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {} {}", self.name, self.expr, self.op, self.rhs)
    }
}

/// An interval bound on a single variable. Multiple bounds on the same
/// variable intersect; the default interval is `[0, +inf)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub var: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bound {
    pub fn at_least(var: impl Into<String>, min: f64) -> Self {
        Self {
            var: var.into(),
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(var: impl Into<String>, max: f64) -> Self {
        Self {
            var: var.into(),
            min: None,
            max: Some(max),
        }
    }

    pub fn fixed(var: impl Into<String>, value: f64) -> Self {
        Self {
            var: var.into(),
            min: Some(value),
            max: Some(value),
        }
    }
}

/// Objective sense. The formulator always minimizes; maximization terms are
/// folded in with negative weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// A fully assembled optimization problem.
#[derive(Debug, Clone)]
pub struct LpProblem {
    pub sense: Sense,
    pub objective: LinearExpr,
    pub constraints: Vec<Constraint>,
    pub bounds: Vec<Bound>,
}

impl LpProblem {
    pub fn minimize(objective: LinearExpr) -> Self {
        Self {
            sense: Sense::Minimize,
            objective,
            constraints: Vec::new(),
            bounds: Vec::new(),
        }
    }

    /// All variable names referenced anywhere in the problem, deduplicated
    /// and sorted. The backend registers exactly this set.
    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .objective
            .variables()
            .chain(self.constraints.iter().flat_map(|c| c.expr.variables()))
            .chain(self.bounds.iter().map(|b| b.var.as_str()))
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Effective `[min, max]` interval for a variable after intersecting
    /// all bounds. Defaults to `[0, +inf)`.
    pub fn effective_bounds(&self, var: &str) -> (f64, f64) {
        let mut min = 0.0f64;
        let mut max = f64::INFINITY;
        for bound in self.bounds.iter().filter(|b| b.var == var) {
            if let Some(m) = bound.min {
                min = min.max(m);
            }
            if let Some(m) = bound.max {
                max = max.min(m);
            }
        }
        (min, max)
    }
}

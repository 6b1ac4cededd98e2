//! User-level solve request.
//!
//! Supplied by the UI/state layer once per solve call. Items and recipes are
//! referenced by their stable class names; resolution against the catalog
//! happens at the start of the solve and failures surface as
//! [`SolveError::UnknownResourceReference`](crate::error::SolveError).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Constraint mode of a fixed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    /// The raw-supply variable is pinned to exactly this amount.
    Exact,
    /// The raw-supply variable must be at least this amount.
    Min,
    /// The raw-supply variable must be at most this amount.
    Max,
    /// The amount is available for free (already owned); the solver may use
    /// any portion of it and buys additional world supply only for the
    /// remainder.
    Input,
}

/// A fixed or bounded input the user supplies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSource {
    /// Item class name, e.g. `Desc_Stone_C`.
    pub item: String,
    pub amount_per_min: f64,
    pub mode: InputMode,
}

impl InputSource {
    pub fn new(item: impl Into<String>, amount_per_min: f64, mode: InputMode) -> Self {
        Self {
            item: item.into(),
            amount_per_min,
            mode,
        }
    }
}

/// Objective mode of a requested output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// Produce exactly the requested rate.
    Exact,
    /// Produce at least the requested rate, and maximize beyond it.
    AtLeastMaximize,
}

/// A desired output rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTarget {
    /// Item class name, e.g. `Desc_Cement_C`.
    pub item: String,
    pub amount_per_min: f64,
    pub mode: OutputMode,
}

impl OutputTarget {
    pub fn exact(item: impl Into<String>, amount_per_min: f64) -> Self {
        Self {
            item: item.into(),
            amount_per_min,
            mode: OutputMode::Exact,
        }
    }

    pub fn maximize(item: impl Into<String>, amount_per_min: f64) -> Self {
        Self {
            item: item.into(),
            amount_per_min,
            mode: OutputMode::AtLeastMaximize,
        }
    }
}

/// Per-recipe overrides: amplification slot usage and overclock factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeOverride {
    /// Somersloop slots in use per building, `0..=building.somersloop_slots`.
    pub somersloops: u32,
    /// Clock multiplier, typically `0.0..=2.5`.
    pub overclock: f64,
}

impl Default for NodeOverride {
    fn default() -> Self {
        Self {
            somersloops: 0,
            overclock: 1.0,
        }
    }
}

impl NodeOverride {
    pub fn somersloops(count: u32) -> Self {
        Self {
            somersloops: count,
            ..Self::default()
        }
    }

    pub fn overclock(factor: f64) -> Self {
        Self {
            overclock: factor,
            ..Self::default()
        }
    }
}

/// The quantity the solver minimizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Sum of per-recipe energy variables.
    MinimizePower,
    /// Scarcity-weighted sum of world-resource supply variables.
    #[default]
    MinimizeResources,
    /// Sum of per-recipe footprint variables.
    MinimizeArea,
}

/// A complete solve request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverRequest {
    pub outputs: Vec<OutputTarget>,
    pub inputs: Vec<InputSource>,
    /// Recipe class names the solver may use. `None` allows every recipe of
    /// kind `Default`.
    pub allowed_recipes: Option<HashSet<String>>,
    /// Recipe class names that may never be used, regardless of
    /// `allowed_recipes`.
    pub blocked_recipes: HashSet<String>,
    /// Item class names that may never appear in the production chain.
    pub blocked_resources: HashSet<String>,
    /// Per-recipe overrides keyed by recipe class name.
    pub overrides: HashMap<String, NodeOverride>,
    pub objective: Objective,
}

impl SolverRequest {
    /// A request for a single exact output with default settings.
    pub fn for_output(item: impl Into<String>, amount_per_min: f64) -> Self {
        Self {
            outputs: vec![OutputTarget::exact(item, amount_per_min)],
            ..Self::default()
        }
    }

    /// Override for a recipe, falling back to the default (no somersloops,
    /// 100% clock).
    pub fn override_for(&self, recipe_class: &str) -> NodeOverride {
        self.overrides
            .get(recipe_class)
            .copied()
            .unwrap_or_default()
    }
}

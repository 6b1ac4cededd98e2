//! The constraint graph: typed nodes, edges, and deterministic variable names.
//!
//! Built fresh for every solve and discarded afterwards. Node identity is
//! carried by variable names derived purely from catalog indices, so the
//! same recipe/item pair yields the same node name across invocations --
//! a saved UI layout keyed on node names stays valid across re-solves.

use crate::id::{EdgeId, ItemIdx, NodeId, RecipeIdx};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Variable naming
// ---------------------------------------------------------------------------

/// World-resource supply variable.
pub fn raw_var(item: ItemIdx) -> String {
    format!("r{}", item.0)
}

/// User-provided supply variable (Input-mode request entries).
pub fn supply_var(item: ItemIdx) -> String {
    format!("u{}", item.0)
}

/// Per-recipe energy accounting variable.
pub fn energy_var(recipe: RecipeIdx) -> String {
    format!("e{}", recipe.0)
}

/// Per-recipe footprint accounting variable.
pub fn area_var(recipe: RecipeIdx) -> String {
    format!("area{}", recipe.0)
}

/// Per (recipe, ingredient) consumption variable.
pub fn input_var(item: ItemIdx, recipe: RecipeIdx) -> String {
    format!("i{}r{}", item.0, recipe.0)
}

/// Original (unamplified) production-rate variable.
pub fn product_var(item: ItemIdx, recipe: RecipeIdx) -> String {
    format!("p{}r{}", item.0, recipe.0)
}

/// Amplified production-rate variable.
pub fn amplified_var(item: ItemIdx, recipe: RecipeIdx) -> String {
    format!("a{}r{}", item.0, recipe.0)
}

/// Total (original + amplified) production-rate variable.
pub fn total_var(item: ItemIdx, recipe: RecipeIdx) -> String {
    format!("t{}r{}", item.0, recipe.0)
}

/// Byproduct side-channel variable.
pub fn byproduct_var(item: ItemIdx, recipe: RecipeIdx) -> String {
    format!("b{}r{}", item.0, recipe.0)
}

// ---------------------------------------------------------------------------
// Nodes and edges
// ---------------------------------------------------------------------------

/// Kind and payload of a constraint-graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// World-resource supply, one per raw resource referenced.
    Raw { item: ItemIdx },
    /// User-provided supply injected by the formulator.
    Supply { item: ItemIdx },
    /// Per-recipe energy accounting.
    Energy { recipe: RecipeIdx },
    /// Per-recipe building-footprint accounting.
    Area { recipe: RecipeIdx },
    /// Per (recipe, ingredient) consumption.
    Input { item: ItemIdx, recipe: RecipeIdx },
    /// Per (recipe, product) production. Carries the original, amplified,
    /// and total rate variables.
    Output { item: ItemIdx, recipe: RecipeIdx },
    /// The always-present side channel off every output node.
    Byproduct { item: ItemIdx, recipe: RecipeIdx },
}

impl NodeKind {
    /// The node's primary variable name. For `Output` nodes this is the
    /// original-rate variable; the amplified/total companions are derived
    /// with [`amplified_var`]/[`total_var`].
    pub fn primary_var(&self) -> String {
        match *self {
            NodeKind::Raw { item } => raw_var(item),
            NodeKind::Supply { item } => supply_var(item),
            NodeKind::Energy { recipe } => energy_var(recipe),
            NodeKind::Area { recipe } => area_var(recipe),
            NodeKind::Input { item, recipe } => input_var(item, recipe),
            NodeKind::Output { item, recipe } => product_var(item, recipe),
            NodeKind::Byproduct { item, recipe } => byproduct_var(item, recipe),
        }
    }

    /// Every variable name owned by this node.
    pub fn all_vars(&self) -> Vec<String> {
        match *self {
            NodeKind::Output { item, recipe } => vec![
                product_var(item, recipe),
                amplified_var(item, recipe),
                total_var(item, recipe),
            ],
            _ => vec![self.primary_var()],
        }
    }

    /// The item this node supplies or consumes, if any.
    pub fn item(&self) -> Option<ItemIdx> {
        match *self {
            NodeKind::Raw { item }
            | NodeKind::Supply { item }
            | NodeKind::Input { item, .. }
            | NodeKind::Output { item, .. }
            | NodeKind::Byproduct { item, .. } => Some(item),
            NodeKind::Energy { .. } | NodeKind::Area { .. } => None,
        }
    }

    /// The recipe this node accounts for, if any.
    pub fn recipe(&self) -> Option<RecipeIdx> {
        match *self {
            NodeKind::Energy { recipe }
            | NodeKind::Area { recipe }
            | NodeKind::Input { recipe, .. }
            | NodeKind::Output { recipe, .. }
            | NodeKind::Byproduct { recipe, .. } => Some(recipe),
            NodeKind::Raw { .. } | NodeKind::Supply { .. } => None,
        }
    }
}

/// Per-edge data: a directed item flow between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    pub from: NodeId,
    pub to: NodeId,
    pub item: ItemIdx,
}

/// Errors raised by graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("constraint references variable {0} with no graph node")]
    UnboundVariable(String),
}

// ---------------------------------------------------------------------------
// ConstraintGraph
// ---------------------------------------------------------------------------

/// Directed graph of typed solver nodes, keyed by slotmap ids, with a
/// variable-name index for invariant checking and solution interpretation.
#[derive(Debug, Default)]
pub struct ConstraintGraph {
    nodes: SlotMap<NodeId, NodeKind>,
    edges: SlotMap<EdgeId, EdgeData>,
    by_var: HashMap<String, NodeId>,
}

impl ConstraintGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or return the existing one for the same kind.
    /// Idempotency is keyed on the primary variable name, which encodes the
    /// full node identity.
    pub fn ensure_node(&mut self, kind: NodeKind) -> NodeId {
        if let Some(&id) = self.by_var.get(&kind.primary_var()) {
            return id;
        }
        let id = self.nodes.insert(kind);
        for var in kind.all_vars() {
            self.by_var.insert(var, id);
        }
        id
    }

    /// Connect two existing nodes with an item flow.
    pub fn connect(&mut self, from: NodeId, to: NodeId, item: ItemIdx) -> Result<EdgeId, GraphError> {
        if !self.nodes.contains_key(from) {
            return Err(GraphError::NodeNotFound(from));
        }
        if !self.nodes.contains_key(to) {
            return Err(GraphError::NodeNotFound(to));
        }
        Ok(self.edges.insert(EdgeData { from, to, item }))
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id)
    }

    pub fn node_for_var(&self, var: &str) -> Option<NodeId> {
        self.by_var.get(var).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeKind)> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check that every variable in `vars` has a corresponding node.
    pub fn check_vars_bound<'a>(
        &self,
        vars: impl Iterator<Item = &'a str>,
    ) -> Result<(), GraphError> {
        for var in vars {
            if !self.by_var.contains_key(var) {
                return Err(GraphError::UnboundVariable(var.to_string()));
            }
        }
        Ok(())
    }
}

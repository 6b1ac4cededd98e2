use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a node in the constraint graph.
    pub struct NodeId;

    /// Identifies an edge in the constraint graph.
    pub struct EdgeId;
}

/// Identifies an item in the catalog. Cheap to copy and compare.
///
/// The inner index is dense (assigned in registration order) and doubles as
/// the item component of deterministic variable names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemIdx(pub u32);

/// Identifies a recipe in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipeIdx(pub u32);

/// Identifies a building in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingIdx(pub u32);

//! Serde data file structs for catalog content.
//!
//! These structs define the on-disk JSON format for items, recipes, and
//! buildings as produced by the external game-data ingestion pipeline.
//! They are deserialized as-is and then resolved into catalog types by the
//! loader.

use serde::Deserialize;

// ===========================================================================
// Items
// ===========================================================================

/// An item definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub class_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub form: FormData,
    #[serde(default)]
    pub energy_mj: f64,
    #[serde(default)]
    pub sink_points: u32,
    /// Marks a world resource even without a numeric limit (water).
    #[serde(default)]
    pub world_resource: bool,
    /// World-wide extraction limit in items/min; implies `world_resource`.
    #[serde(default)]
    pub extraction_limit: Option<f64>,
}

/// Physical form of an item.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormData {
    #[default]
    Solid,
    Liquid,
    Gas,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe definition in a data file. Item references are by class name.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub class_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<RecipeItemData>,
    pub products: Vec<RecipeItemData>,
    pub cycle_secs: f64,
    pub produced_in: String,
    #[serde(default)]
    pub kind: RecipeKindData,
}

/// One ingredient or product entry, amount per cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeItemData {
    pub item: String,
    pub amount: f64,
}

/// How a recipe is unlocked.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeKindData {
    #[default]
    Default,
    Mam,
    Alternate,
}

// ===========================================================================
// Buildings
// ===========================================================================

/// A building definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub class_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub width: f64,
    pub length: f64,
    pub avg_power_mw: f64,
    #[serde(default = "default_power_exponent")]
    pub power_exponent: f64,
    #[serde(default)]
    pub somersloop_slots: u32,
    #[serde(default = "default_amplification_exponent")]
    pub amplification_exponent: f64,
}

fn default_power_exponent() -> f64 {
    1.321928
}

fn default_amplification_exponent() -> f64 {
    2.0
}

// ===========================================================================
// Top level
// ===========================================================================

/// Top-level catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub items: Vec<ItemData>,
    #[serde(default)]
    pub recipes: Vec<RecipeData>,
    #[serde(default)]
    pub buildings: Vec<BuildingData>,
}

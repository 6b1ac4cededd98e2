//! Immutable item/recipe/building catalog.
//!
//! Loaded once at startup (typically through `forgeplan-data`), then shared
//! read-only across arbitrarily many solves. Follows a builder/finalize
//! lifecycle: register everything on a [`CatalogBuilder`], then [`build`]
//! validates referential integrity and freezes the tables.
//!
//! [`build`]: CatalogBuilder::build

use crate::id::{BuildingIdx, ItemIdx, RecipeIdx};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Physical form of an item. Determines how the UI renders transport, not
/// how the solver treats the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Form {
    Solid,
    Liquid,
    Gas,
}

/// How a recipe is unlocked in-game. The suggestion engine relaxes the
/// allowed set one tier at a time: `Mam` research recipes first, then
/// `Alternate` hard-drive recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeKind {
    Default,
    Mam,
    Alternate,
}

/// An item definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Stable string key, e.g. `Desc_Stone_C`.
    pub class_name: String,
    pub display_name: String,
    pub form: Form,
    /// Energy value in MJ (fuel items).
    pub energy_mj: f64,
    /// Awesome-sink points.
    pub sink_points: u32,
    /// World-wide extraction limit in items/min. `Some` marks the item as a
    /// world resource; `f64::INFINITY` means effectively unlimited (water).
    pub extraction_limit: Option<f64>,
}

impl Item {
    /// Whether the item can be extracted directly from the world.
    pub fn is_world_resource(&self) -> bool {
        self.extraction_limit.is_some()
    }
}

/// One ingredient or product entry of a recipe, amount per cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecipeItem {
    pub item: ItemIdx,
    pub amount: f64,
}

/// A recipe definition. The first listed product is the main product; all
/// recipe-relative ratios are normalized against its rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Stable string key, e.g. `Recipe_Concrete_C`.
    pub class_name: String,
    pub display_name: String,
    pub ingredients: Vec<RecipeItem>,
    pub products: Vec<RecipeItem>,
    /// Cycle time in seconds.
    pub cycle_secs: f64,
    /// Class name of the producing building. Resolved at solve time; an
    /// unresolvable building aborts the solve.
    pub produced_in: String,
    pub kind: RecipeKind,
}

impl Recipe {
    /// The first listed product.
    pub fn main_product(&self) -> &RecipeItem {
        &self.products[0]
    }

    /// Per-building reference rate in items/min for a per-cycle amount.
    pub fn per_minute(&self, amount: f64) -> f64 {
        amount * 60.0 / self.cycle_secs
    }

    /// Per-building items/min of the main product at 100% clock.
    pub fn main_rate(&self) -> f64 {
        self.per_minute(self.main_product().amount)
    }
}

/// A building definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    /// Stable string key, e.g. `Build_Packager_C`.
    pub class_name: String,
    pub display_name: String,
    /// Clearance footprint in meters.
    pub width: f64,
    pub length: f64,
    /// Average power draw in MW at 100% clock.
    pub avg_power_mw: f64,
    /// Exponent of the overclock -> power curve.
    pub power_exponent: f64,
    /// Amplification ("somersloop") slot count.
    pub somersloop_slots: u32,
    /// Exponent of the amplification -> power curve.
    pub amplification_exponent: f64,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Errors raised while finalizing a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate class name: {0}")]
    DuplicateClassName(String),
    #[error("recipe {recipe} references invalid item index {item:?}")]
    InvalidItemRef { recipe: String, item: ItemIdx },
    #[error("recipe {0} has no products")]
    NoProducts(String),
    #[error("recipe {0} has a non-positive cycle time")]
    InvalidCycleTime(String),
}

/// Builder for constructing an immutable [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: Vec<Item>,
    item_by_name: HashMap<String, ItemIdx>,
    recipes: Vec<Recipe>,
    recipe_by_name: HashMap<String, RecipeIdx>,
    buildings: Vec<Building>,
    building_by_name: HashMap<String, BuildingIdx>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item. Returns its index.
    pub fn add_item(&mut self, item: Item) -> ItemIdx {
        let idx = ItemIdx(self.items.len() as u32);
        self.item_by_name.insert(item.class_name.clone(), idx);
        self.items.push(item);
        idx
    }

    /// Register a recipe. Returns its index.
    pub fn add_recipe(&mut self, recipe: Recipe) -> RecipeIdx {
        let idx = RecipeIdx(self.recipes.len() as u32);
        self.recipe_by_name.insert(recipe.class_name.clone(), idx);
        self.recipes.push(recipe);
        idx
    }

    /// Register a building. Returns its index.
    pub fn add_building(&mut self, building: Building) -> BuildingIdx {
        let idx = BuildingIdx(self.buildings.len() as u32);
        self.building_by_name
            .insert(building.class_name.clone(), idx);
        self.buildings.push(building);
        idx
    }

    /// Lookup an item index by class name.
    pub fn item_idx(&self, class_name: &str) -> Option<ItemIdx> {
        self.item_by_name.get(class_name).copied()
    }

    /// Finalize and build the immutable catalog.
    ///
    /// Validates that every recipe references existing items, has at least
    /// one product and a positive cycle time, and that class names are
    /// unique. Collects the `producers_of` reverse index.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        if self.item_by_name.len() != self.items.len() {
            let dup = find_duplicate(self.items.iter().map(|i| i.class_name.as_str()));
            return Err(CatalogError::DuplicateClassName(dup));
        }
        if self.recipe_by_name.len() != self.recipes.len() {
            let dup = find_duplicate(self.recipes.iter().map(|r| r.class_name.as_str()));
            return Err(CatalogError::DuplicateClassName(dup));
        }
        if self.building_by_name.len() != self.buildings.len() {
            let dup = find_duplicate(self.buildings.iter().map(|b| b.class_name.as_str()));
            return Err(CatalogError::DuplicateClassName(dup));
        }

        let mut producers: Vec<Vec<RecipeIdx>> = vec![Vec::new(); self.items.len()];
        for (ridx, recipe) in self.recipes.iter().enumerate() {
            if recipe.products.is_empty() {
                return Err(CatalogError::NoProducts(recipe.class_name.clone()));
            }
            if recipe.cycle_secs <= 0.0 {
                return Err(CatalogError::InvalidCycleTime(recipe.class_name.clone()));
            }
            for entry in recipe.ingredients.iter().chain(recipe.products.iter()) {
                if entry.item.0 as usize >= self.items.len() {
                    return Err(CatalogError::InvalidItemRef {
                        recipe: recipe.class_name.clone(),
                        item: entry.item,
                    });
                }
            }
            for product in &recipe.products {
                producers[product.item.0 as usize].push(RecipeIdx(ridx as u32));
            }
        }

        Ok(Catalog {
            items: self.items,
            item_by_name: self.item_by_name,
            recipes: self.recipes,
            recipe_by_name: self.recipe_by_name,
            buildings: self.buildings,
            building_by_name: self.building_by_name,
            producers,
        })
    }
}

fn find_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let mut seen = HashMap::new();
    for name in names {
        if seen.insert(name, ()).is_some() {
            return name.to_string();
        }
    }
    String::new()
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog. Frozen after build, safe to share across solves.
#[derive(Debug)]
pub struct Catalog {
    items: Vec<Item>,
    item_by_name: HashMap<String, ItemIdx>,
    recipes: Vec<Recipe>,
    recipe_by_name: HashMap<String, RecipeIdx>,
    buildings: Vec<Building>,
    building_by_name: HashMap<String, BuildingIdx>,
    /// For each item index, the recipes that list it among their products.
    producers: Vec<Vec<RecipeIdx>>,
}

impl Catalog {
    pub fn item(&self, idx: ItemIdx) -> Option<&Item> {
        self.items.get(idx.0 as usize)
    }

    pub fn recipe(&self, idx: RecipeIdx) -> Option<&Recipe> {
        self.recipes.get(idx.0 as usize)
    }

    pub fn building(&self, idx: BuildingIdx) -> Option<&Building> {
        self.buildings.get(idx.0 as usize)
    }

    pub fn item_idx(&self, class_name: &str) -> Option<ItemIdx> {
        self.item_by_name.get(class_name).copied()
    }

    pub fn recipe_idx(&self, class_name: &str) -> Option<RecipeIdx> {
        self.recipe_by_name.get(class_name).copied()
    }

    pub fn building_idx(&self, class_name: &str) -> Option<BuildingIdx> {
        self.building_by_name.get(class_name).copied()
    }

    /// Recipes that list the given item among their products.
    pub fn producers_of(&self, item: ItemIdx) -> &[RecipeIdx] {
        self.producers
            .get(item.0 as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemIdx, &Item)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (ItemIdx(i as u32), item))
    }

    pub fn recipes(&self) -> impl Iterator<Item = (RecipeIdx, &Recipe)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(i, r)| (RecipeIdx(i as u32), r))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }
}

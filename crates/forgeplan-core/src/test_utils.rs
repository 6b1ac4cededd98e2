//! Shared test fixtures for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so the helpers
//! are available to unit tests here and to downstream test crates via the
//! `test-utils` feature.

use crate::catalog::{Building, Catalog, CatalogBuilder, Form, Item, Recipe, RecipeItem, RecipeKind};

// ===========================================================================
// Entity constructors
// ===========================================================================

pub fn item(class_name: &str, form: Form, extraction_limit: Option<f64>) -> Item {
    Item {
        class_name: class_name.to_string(),
        display_name: class_name
            .trim_start_matches("Desc_")
            .trim_end_matches("_C")
            .to_string(),
        form,
        energy_mj: 0.0,
        sink_points: 1,
        extraction_limit,
    }
}

pub fn building(
    class_name: &str,
    width: f64,
    length: f64,
    avg_power_mw: f64,
    somersloop_slots: u32,
) -> Building {
    Building {
        class_name: class_name.to_string(),
        display_name: class_name
            .trim_start_matches("Build_")
            .trim_end_matches("_C")
            .to_string(),
        width,
        length,
        avg_power_mw,
        power_exponent: 1.321928,
        somersloop_slots,
        amplification_exponent: 2.0,
    }
}

pub fn recipe(
    class_name: &str,
    produced_in: &str,
    cycle_secs: f64,
    ingredients: Vec<(crate::id::ItemIdx, f64)>,
    products: Vec<(crate::id::ItemIdx, f64)>,
    kind: RecipeKind,
) -> Recipe {
    Recipe {
        class_name: class_name.to_string(),
        display_name: class_name
            .trim_start_matches("Recipe_")
            .trim_end_matches("_C")
            .to_string(),
        ingredients: ingredients
            .into_iter()
            .map(|(item, amount)| RecipeItem { item, amount })
            .collect(),
        products: products
            .into_iter()
            .map(|(item, amount)| RecipeItem { item, amount })
            .collect(),
        cycle_secs,
        produced_in: produced_in.to_string(),
        kind,
    }
}

// ===========================================================================
// Catalog fixtures
// ===========================================================================

/// Limestone -> concrete in a constructor. The smallest useful chain.
pub fn concrete_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    let stone = b.add_item(item("Desc_Stone_C", Form::Solid, Some(52860.0)));
    let cement = b.add_item(item("Desc_Cement_C", Form::Solid, None));
    b.add_building(building("Build_ConstructorMk1_C", 8.0, 10.0, 4.0, 1));
    // 3 stone -> 1 concrete per 4s: 45/min -> 15/min.
    b.add_recipe(recipe(
        "Recipe_Concrete_C",
        "Build_ConstructorMk1_C",
        4.0,
        vec![(stone, 3.0)],
        vec![(cement, 1.0)],
        RecipeKind::Default,
    ));
    b.build().unwrap()
}

/// Crude oil -> plastic + heavy oil residue in a refinery, with fuel as a
/// downstream sink for the residue. Exercises byproducts and amplification.
pub fn plastic_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    let oil = b.add_item(item("Desc_LiquidOil_C", Form::Liquid, Some(11700.0)));
    let plastic = b.add_item(item("Desc_Plastic_C", Form::Solid, None));
    let residue = b.add_item(item("Desc_HeavyOilResidue_C", Form::Liquid, None));
    let fuel = b.add_item(item("Desc_LiquidFuel_C", Form::Liquid, None));
    b.add_building(building("Build_OilRefinery_C", 10.0, 20.0, 30.0, 4));
    // 3 oil -> 2 plastic + 1 residue per 6s: 30/min -> 20 + 10/min.
    b.add_recipe(recipe(
        "Recipe_Plastic_C",
        "Build_OilRefinery_C",
        6.0,
        vec![(oil, 3.0)],
        vec![(plastic, 2.0), (residue, 1.0)],
        RecipeKind::Default,
    ));
    // 6 residue -> 4 fuel per 6s: 60/min -> 40/min.
    b.add_recipe(recipe(
        "Recipe_ResidualFuel_C",
        "Build_OilRefinery_C",
        6.0,
        vec![(residue, 6.0)],
        vec![(fuel, 4.0)],
        RecipeKind::Default,
    ));
    b.build().unwrap()
}

/// A catalog with an unresolvable producing building, for the fatal-error
/// path.
pub fn broken_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    let stone = b.add_item(item("Desc_Stone_C", Form::Solid, Some(52860.0)));
    let cement = b.add_item(item("Desc_Cement_C", Form::Solid, None));
    b.add_recipe(recipe(
        "Recipe_Concrete_C",
        "Build_DoesNotExist_C",
        4.0,
        vec![(stone, 3.0)],
        vec![(cement, 1.0)],
        RecipeKind::Default,
    ));
    b.build().unwrap()
}

/// A hand-craft-only recipe (workbench) plus an automated alternative.
/// Only the automated recipe may enter the graph.
pub fn handcraft_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    let ore = b.add_item(item("Desc_OreIron_C", Form::Solid, Some(70380.0)));
    let ingot = b.add_item(item("Desc_IronIngot_C", Form::Solid, None));
    b.add_building(building("Build_SmelterMk1_C", 6.0, 9.0, 4.0, 1));
    b.add_recipe(recipe(
        "Recipe_IngotIron_C",
        "Build_SmelterMk1_C",
        2.0,
        vec![(ore, 1.0)],
        vec![(ingot, 1.0)],
        RecipeKind::Default,
    ));
    b.add_recipe(recipe(
        "Recipe_IngotIron_Manual_C",
        "BP_WorkBenchComponent_C",
        2.0,
        vec![(ore, 1.0)],
        vec![(ingot, 1.0)],
        RecipeKind::Default,
    ));
    b.build().unwrap()
}

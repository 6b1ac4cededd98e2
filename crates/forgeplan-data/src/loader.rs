//! Resolution pipeline: parses catalog JSON, resolves item references by
//! class name, and builds the immutable [`Catalog`].

use crate::schema::{CatalogFile, FormData, RecipeKindData};
use forgeplan_core::catalog::{
    Building, Catalog, CatalogBuilder, CatalogError, Form, Item, Recipe, RecipeItem, RecipeKind,
};
use std::path::Path;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A deserialization error occurred.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The parsed data failed catalog validation.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A recipe references an item class name with no definition.
    #[error("recipe {recipe} references unknown item {item}")]
    UnknownItemRef { recipe: String, item: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Loading
// ===========================================================================

/// Load a catalog from a JSON string.
pub fn load_catalog_json(json: &str) -> Result<Catalog, DataLoadError> {
    let file: CatalogFile = serde_json::from_str(json)?;
    build_catalog(file)
}

/// Load a catalog from a JSON file on disk.
pub fn load_catalog_file(path: impl AsRef<Path>) -> Result<Catalog, DataLoadError> {
    let json = std::fs::read_to_string(path)?;
    load_catalog_json(&json)
}

fn build_catalog(file: CatalogFile) -> Result<Catalog, DataLoadError> {
    let mut builder = CatalogBuilder::new();

    // Items first, so recipe references resolve against the full table.
    for item in &file.items {
        let extraction_limit = match (item.extraction_limit, item.world_resource) {
            (Some(limit), _) => Some(limit),
            (None, true) => Some(f64::INFINITY),
            (None, false) => None,
        };
        builder.add_item(Item {
            class_name: item.class_name.clone(),
            display_name: item
                .display_name
                .clone()
                .unwrap_or_else(|| item.class_name.clone()),
            form: match item.form {
                FormData::Solid => Form::Solid,
                FormData::Liquid => Form::Liquid,
                FormData::Gas => Form::Gas,
            },
            energy_mj: item.energy_mj,
            sink_points: item.sink_points,
            extraction_limit,
        });
    }

    for recipe in &file.recipes {
        let resolve = |entry: &crate::schema::RecipeItemData| -> Result<RecipeItem, DataLoadError> {
            let item = builder.item_idx(&entry.item).ok_or_else(|| {
                DataLoadError::UnknownItemRef {
                    recipe: recipe.class_name.clone(),
                    item: entry.item.clone(),
                }
            })?;
            Ok(RecipeItem {
                item,
                amount: entry.amount,
            })
        };
        let ingredients = recipe
            .ingredients
            .iter()
            .map(&resolve)
            .collect::<Result<Vec<_>, _>>()?;
        let products = recipe
            .products
            .iter()
            .map(&resolve)
            .collect::<Result<Vec<_>, _>>()?;
        builder.add_recipe(Recipe {
            class_name: recipe.class_name.clone(),
            display_name: recipe
                .display_name
                .clone()
                .unwrap_or_else(|| recipe.class_name.clone()),
            ingredients,
            products,
            cycle_secs: recipe.cycle_secs,
            produced_in: recipe.produced_in.clone(),
            kind: match recipe.kind {
                RecipeKindData::Default => RecipeKind::Default,
                RecipeKindData::Mam => RecipeKind::Mam,
                RecipeKindData::Alternate => RecipeKind::Alternate,
            },
        });
    }

    for building in &file.buildings {
        builder.add_building(Building {
            class_name: building.class_name.clone(),
            display_name: building
                .display_name
                .clone()
                .unwrap_or_else(|| building.class_name.clone()),
            width: building.width,
            length: building.length,
            avg_power_mw: building.avg_power_mw,
            power_exponent: building.power_exponent,
            somersloop_slots: building.somersloop_slots,
            amplification_exponent: building.amplification_exponent,
        });
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "items": [
            {"class_name": "Desc_Stone_C", "display_name": "Limestone",
             "sink_points": 2, "extraction_limit": 52860.0},
            {"class_name": "Desc_Cement_C", "display_name": "Concrete",
             "energy_mj": 0.0, "sink_points": 12},
            {"class_name": "Desc_Water_C", "form": "liquid", "world_resource": true}
        ],
        "recipes": [
            {"class_name": "Recipe_Concrete_C", "display_name": "Concrete",
             "produced_in": "Build_ConstructorMk1_C", "cycle_secs": 4.0,
             "ingredients": [{"item": "Desc_Stone_C", "amount": 3.0}],
             "products": [{"item": "Desc_Cement_C", "amount": 1.0}]}
        ],
        "buildings": [
            {"class_name": "Build_ConstructorMk1_C", "display_name": "Constructor",
             "width": 8.0, "length": 10.0, "avg_power_mw": 4.0, "somersloop_slots": 1}
        ]
    }"#;

    #[test]
    fn loads_a_minimal_catalog() {
        let catalog = load_catalog_json(MINIMAL).unwrap();
        assert_eq!(catalog.item_count(), 3);
        assert_eq!(catalog.recipe_count(), 1);
        assert_eq!(catalog.building_count(), 1);

        let stone = catalog.item_idx("Desc_Stone_C").unwrap();
        assert_eq!(catalog.item(stone).unwrap().display_name, "Limestone");
        assert_eq!(catalog.item(stone).unwrap().extraction_limit, Some(52860.0));
    }

    #[test]
    fn world_resource_without_limit_is_unlimited() {
        let catalog = load_catalog_json(MINIMAL).unwrap();
        let water = catalog.item_idx("Desc_Water_C").unwrap();
        let def = catalog.item(water).unwrap();
        assert!(def.is_world_resource());
        assert_eq!(def.extraction_limit, Some(f64::INFINITY));
        assert_eq!(def.form, Form::Liquid);
    }

    #[test]
    fn recipe_references_resolve_by_class_name() {
        let catalog = load_catalog_json(MINIMAL).unwrap();
        let concrete = catalog.recipe_idx("Recipe_Concrete_C").unwrap();
        let recipe = catalog.recipe(concrete).unwrap();
        let stone = catalog.item_idx("Desc_Stone_C").unwrap();
        assert_eq!(recipe.ingredients[0].item, stone);
        assert_eq!(recipe.kind, RecipeKind::Default);
    }

    #[test]
    fn unknown_item_reference_fails() {
        let json = r#"{
            "items": [],
            "recipes": [
                {"class_name": "Recipe_Bad_C", "produced_in": "Build_X_C",
                 "cycle_secs": 1.0,
                 "products": [{"item": "Desc_Missing_C", "amount": 1.0}]}
            ]
        }"#;
        let err = load_catalog_json(json).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::UnknownItemRef { recipe, item }
                if recipe == "Recipe_Bad_C" && item == "Desc_Missing_C"
        ));
    }

    #[test]
    fn malformed_json_fails() {
        assert!(matches!(
            load_catalog_json("{not json"),
            Err(DataLoadError::JsonParse(_))
        ));
    }

    #[test]
    fn unknown_recipe_kind_fails() {
        let json = r#"{
            "items": [{"class_name": "Desc_A_C"}],
            "recipes": [
                {"class_name": "Recipe_A_C", "produced_in": "Build_X_C",
                 "cycle_secs": 1.0, "kind": "legendary",
                 "products": [{"item": "Desc_A_C", "amount": 1.0}]}
            ]
        }"#;
        assert!(matches!(
            load_catalog_json(json),
            Err(DataLoadError::JsonParse(_))
        ));
    }
}

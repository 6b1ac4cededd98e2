//! Shared fixture loading for scenario tests.

use forgeplan_core::catalog::Catalog;

/// The Satisfactory oil/concrete subset used by all scenario tests.
pub fn catalog() -> Catalog {
    forgeplan_data::load_catalog_json(include_str!("../../data/satisfactory_subset.json"))
        .expect("fixture catalog parses")
}

/// Every recipe class name in the fixture.
#[allow(dead_code)]
pub fn all_recipe_names(catalog: &Catalog) -> std::collections::HashSet<String> {
    catalog
        .recipes()
        .map(|(_, r)| r.class_name.clone())
        .collect()
}

//! Oil-chain scenarios: the 900/900 plastic+rubber optimum, amplification,
//! and stoichiometric conservation.

mod common;

use common::{all_recipe_names, catalog};
use forgeplan_core::graph;
use forgeplan_core::interpret::auto_set_inputs;
use forgeplan_core::request::{NodeOverride, OutputTarget, SolverRequest};
use forgeplan_core::solver::solve_production;

/// 900 Plastic + 900 Rubber per minute with the blender diluted-fuel recipe
/// blocked, forcing the packaged-fuel loop through the packager.
fn plastic_rubber_request(catalog: &forgeplan_core::catalog::Catalog) -> SolverRequest {
    SolverRequest {
        outputs: vec![
            OutputTarget::exact("Desc_Plastic_C", 900.0),
            OutputTarget::exact("Desc_Rubber_C", 900.0),
        ],
        allowed_recipes: Some(all_recipe_names(catalog)),
        blocked_recipes: ["Recipe_Alternate_DilutedFuel_C".to_string()]
            .into_iter()
            .collect(),
        ..SolverRequest::default()
    }
}

#[test]
fn plastic_rubber_900_runs_on_600_oil_through_two_packagers() {
    let catalog = catalog();
    let request = plastic_rubber_request(&catalog);
    let solution = solve_production(&catalog, &request).unwrap();
    assert!(solution.status.is_optimal());

    // The packaged-water/unpackage-fuel loop is the only fuel route left.
    let packagers = solution.machines_in("Build_Packager_C");
    assert_eq!(
        packagers.len(),
        2,
        "packager machines: {:?}",
        packagers.iter().map(|m| &m.recipe_class).collect::<Vec<_>>()
    );

    let oil_nodes = solution.resource_nodes_for("Desc_LiquidOil_C");
    assert_eq!(oil_nodes.len(), 1);
    assert!(
        (oil_nodes[0].amount_per_min - 600.0).abs() < 1e-3,
        "oil = {}",
        oil_nodes[0].amount_per_min
    );

    // Water: 400/min into residual rubber, 1600/min into packaged water.
    assert!((solution.resource_total("Desc_Water_C") - 2000.0).abs() < 1e-3);

    // Requested rates leave through the byproduct channels.
    assert!((solution.byproduct_total("Desc_Plastic_C") - 900.0).abs() < 1e-3);
    assert!((solution.byproduct_total("Desc_Rubber_C") - 900.0).abs() < 1e-3);
}

#[test]
fn blocked_recipe_is_absent_from_the_solution() {
    let catalog = catalog();
    let request = plastic_rubber_request(&catalog);
    let solution = solve_production(&catalog, &request).unwrap();
    assert!(
        solution
            .machines
            .iter()
            .all(|m| m.recipe_class != "Recipe_Alternate_DilutedFuel_C")
    );
}

#[test]
fn amplified_plastic_doubles_output_and_byproduct() {
    let catalog = catalog();
    let mut request = SolverRequest::for_output("Desc_Plastic_C", 40.0);
    request
        .overrides
        .insert("Recipe_Plastic_C".to_string(), NodeOverride::somersloops(4));
    let solution = solve_production(&catalog, &request).unwrap();
    assert!(solution.status.is_optimal());

    // Full amplification doubles both products of the plastic recipe: one
    // refinery consumes 30 oil and emits 40 plastic + 20 residue.
    assert!((solution.resource_total("Desc_LiquidOil_C") - 30.0).abs() < 1e-6);
    assert!((solution.byproduct_total("Desc_Plastic_C") - 40.0).abs() < 1e-6);
    assert!((solution.byproduct_total("Desc_HeavyOilResidue_C") - 20.0).abs() < 1e-6);

    let machine = solution
        .machines
        .iter()
        .find(|m| m.recipe_class == "Recipe_Plastic_C")
        .unwrap();
    assert!((machine.original_per_min - 20.0).abs() < 1e-6);
    assert!((machine.amplified_per_min - 20.0).abs() < 1e-6);
    assert_eq!(machine.buildings.whole, 1);
}

#[test]
fn amplified_rate_never_exceeds_the_slooped_share() {
    let catalog = catalog();
    let mut request = SolverRequest::for_output("Desc_Plastic_C", 60.0);
    request
        .overrides
        .insert("Recipe_Plastic_C".to_string(), NodeOverride::somersloops(2));
    let solution = solve_production(&catalog, &request).unwrap();
    assert!(solution.status.is_optimal());

    let plastic = catalog.item_idx("Desc_Plastic_C").unwrap();
    let recipe = catalog.recipe_idx("Recipe_Plastic_C").unwrap();
    let amplified = solution
        .assignment
        .value(&graph::amplified_var(plastic, recipe));
    let original = solution
        .assignment
        .value(&graph::product_var(plastic, recipe));
    // 2 of 4 slots: at most half the original rate on top.
    assert!(amplified <= 0.5 * original + 1e-6);
    assert!((original + amplified - 60.0).abs() < 1e-6);
}

#[test]
fn non_main_products_conserve_recipe_stoichiometry() {
    let catalog = catalog();
    let request = plastic_rubber_request(&catalog);
    let solution = solve_production(&catalog, &request).unwrap();
    assert!(solution.status.is_optimal());

    for machine in &solution.machines {
        let recipe = catalog
            .recipe(machine.recipe)
            .expect("machine recipe in catalog");
        let main = recipe.main_product();
        for product in recipe.products.iter().skip(1) {
            let expected = machine.original_per_min * product.amount / main.amount;
            let actual = solution
                .assignment
                .value(&graph::product_var(product.item, machine.recipe));
            assert!(
                (actual - expected).abs() < 1e-6,
                "{}: non-main product rate {actual}, expected {expected}",
                recipe.class_name
            );
        }
    }
}

#[test]
fn oil_chain_auto_set_inputs_are_idempotent() {
    let catalog = catalog();
    let request = plastic_rubber_request(&catalog);
    let first = solve_production(&catalog, &request).unwrap();
    assert!(first.status.is_optimal());

    let inputs = auto_set_inputs(&first);
    let mut refed = request.clone();
    refed.inputs = inputs.clone();
    let second = solve_production(&catalog, &refed).unwrap();
    assert!(second.status.is_optimal());
    assert_eq!(auto_set_inputs(&second), inputs);
    assert_eq!(second.machines.len(), first.machines.len());
}

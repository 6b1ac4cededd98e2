//! Converts raw variable assignments back into typed solution nodes.
//!
//! Zero-valued graph branches are pruned; the surviving nodes carry their
//! resolved per-minute rates plus derived quantities (building counts,
//! partial-building overclock). The originating [`BuildContext`] rides
//! along for introspection and for the suggestion engine.

use crate::backend::{RawSolution, SolveStatus};
use crate::builder::BuildContext;
use crate::graph::{self, NodeKind};
use crate::id::{BuildingIdx, ItemIdx, RecipeIdx};
use crate::request::{InputMode, InputSource, SolverRequest};
use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Policy constants
// ---------------------------------------------------------------------------

/// Below this a variable is an unused graph branch and its node is pruned.
pub const NODE_EPSILON: f64 = 1e-5;

/// Solver tolerance subtracted from a fractional building count before the
/// partial-building test.
pub const MACHINE_EPSILON: f64 = 1e-4;

/// A fractional building above this (after tolerance) becomes one extra
/// building at a prorated clock; below it, the fraction is rounding noise.
pub const PARTIAL_THRESHOLD: f64 = 1e-3;

/// Decimal places kept by [`stabilize_amount`].
const STABILIZE_SCALE: f64 = 1e6;

// ---------------------------------------------------------------------------
// Solution data model
// ---------------------------------------------------------------------------

/// Where a resource node's supply comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResourceKind {
    /// Extracted from the world.
    Extraction,
    /// Provided by the user (`Input`-mode request entry).
    Provided,
}

/// A raw-supply node with nonzero value.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceNode {
    pub item: ItemIdx,
    pub class_name: String,
    pub kind: ResourceKind,
    pub amount_per_min: f64,
    /// Stable node identity (the supply variable name).
    pub var: String,
}

/// Whole-building count plus an optional partial building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BuildingCount {
    pub whole: u32,
    /// Clock factor of the one extra partial building, when the fractional
    /// remainder is above [`PARTIAL_THRESHOLD`].
    pub partial_clock: Option<f64>,
}

/// One recipe's aggregated machine group.
#[derive(Debug, Clone, Serialize)]
pub struct MachineNode {
    pub recipe: RecipeIdx,
    pub recipe_class: String,
    pub building: BuildingIdx,
    pub building_class: String,
    /// Main-product rates in items/min.
    pub original_per_min: f64,
    pub amplified_per_min: f64,
    pub total_per_min: f64,
    pub buildings: BuildingCount,
    pub overclock: f64,
    pub somersloops: u32,
    /// Power draw of the whole group in MW.
    pub power_mw: f64,
    /// Stable node identity (the main-product variable name).
    pub var: String,
}

/// A byproduct side channel with nonzero value.
#[derive(Debug, Clone, Serialize)]
pub struct ByproductNode {
    pub item: ItemIdx,
    pub class_name: String,
    pub recipe: RecipeIdx,
    pub amount_per_min: f64,
    pub var: String,
}

/// A display edge between two surviving nodes.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayEdge {
    pub from_var: String,
    pub to_var: String,
    pub item: ItemIdx,
    pub amount_per_min: f64,
}

/// The interpreted result of one solve.
pub struct Solution<'a> {
    pub status: SolveStatus,
    pub objective: f64,
    pub resources: Vec<ResourceNode>,
    pub machines: Vec<MachineNode>,
    pub byproducts: Vec<ByproductNode>,
    pub edges: Vec<DisplayEdge>,
    /// The raw variable assignment the nodes were derived from.
    pub assignment: RawSolution,
    /// The graph/constraint state this solution was interpreted from, kept
    /// for introspection and re-solves.
    pub context: BuildContext<'a>,
}

impl<'a> Solution<'a> {
    /// Total supply of an item across all resource nodes.
    pub fn resource_total(&self, class_name: &str) -> f64 {
        self.resources
            .iter()
            .filter(|r| r.class_name == class_name)
            .map(|r| r.amount_per_min)
            .sum()
    }

    pub fn resource_nodes_for(&self, class_name: &str) -> Vec<&ResourceNode> {
        self.resources
            .iter()
            .filter(|r| r.class_name == class_name)
            .collect()
    }

    pub fn machines_in(&self, building_class: &str) -> Vec<&MachineNode> {
        self.machines
            .iter()
            .filter(|m| m.building_class == building_class)
            .collect()
    }

    pub fn byproduct_total(&self, class_name: &str) -> f64 {
        self.byproducts
            .iter()
            .filter(|b| b.class_name == class_name)
            .map(|b| b.amount_per_min)
            .sum()
    }
}

impl std::fmt::Debug for Solution<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solution")
            .field("status", &self.status)
            .field("objective", &self.objective)
            .field("resources", &self.resources)
            .field("machines", &self.machines)
            .field("byproducts", &self.byproducts)
            .field("edges", &self.edges.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Interpretation
// ---------------------------------------------------------------------------

/// Interpret a raw backend result against the graph it was formulated from.
/// Non-optimal results yield an empty solution carrying only the status.
pub fn interpret<'a>(
    context: BuildContext<'a>,
    request: &SolverRequest,
    raw: RawSolution,
) -> Solution<'a> {
    if !raw.status.is_optimal() {
        return Solution {
            status: raw.status,
            objective: raw.objective,
            resources: Vec::new(),
            machines: Vec::new(),
            byproducts: Vec::new(),
            edges: Vec::new(),
            assignment: raw,
            context,
        };
    }

    let catalog = context.catalog();
    let mut resources = Vec::new();
    let mut machines = Vec::new();
    let mut byproducts = Vec::new();

    // Group output nodes per recipe so each active recipe becomes exactly
    // one machine node, keyed by its main product.
    let mut seen_recipes: std::collections::BTreeSet<RecipeIdx> = Default::default();

    for (_, kind) in context.graph.nodes() {
        match *kind {
            NodeKind::Raw { item } => {
                let var = graph::raw_var(item);
                let value = raw.value(&var);
                if value > NODE_EPSILON {
                    let def = catalog.item(item).expect("raw node item is in catalog");
                    resources.push(ResourceNode {
                        item,
                        class_name: def.class_name.clone(),
                        kind: ResourceKind::Extraction,
                        amount_per_min: value,
                        var,
                    });
                }
            }
            NodeKind::Supply { item } => {
                let var = graph::supply_var(item);
                let value = raw.value(&var);
                if value > NODE_EPSILON {
                    let def = catalog.item(item).expect("supply node item is in catalog");
                    resources.push(ResourceNode {
                        item,
                        class_name: def.class_name.clone(),
                        kind: ResourceKind::Provided,
                        amount_per_min: value,
                        var,
                    });
                }
            }
            NodeKind::Output { recipe, .. } => {
                seen_recipes.insert(recipe);
            }
            NodeKind::Byproduct { item, recipe } => {
                let var = graph::byproduct_var(item, recipe);
                let value = raw.value(&var);
                if value > NODE_EPSILON {
                    let def = catalog.item(item).expect("byproduct item is in catalog");
                    byproducts.push(ByproductNode {
                        item,
                        class_name: def.class_name.clone(),
                        recipe,
                        amount_per_min: value,
                        var,
                    });
                }
            }
            NodeKind::Energy { .. } | NodeKind::Area { .. } | NodeKind::Input { .. } => {}
        }
    }

    for &recipe_idx in &seen_recipes {
        let recipe = catalog.recipe(recipe_idx).expect("processed recipe exists");
        let main = recipe.main_product();
        let var = graph::product_var(main.item, recipe_idx);
        let original = raw.value(&var);
        if original <= NODE_EPSILON {
            continue;
        }
        let amplified = raw.value(&graph::amplified_var(main.item, recipe_idx));
        let total = raw.value(&graph::total_var(main.item, recipe_idx));

        let building_idx = catalog
            .building_idx(&recipe.produced_in)
            .expect("builder resolved the producing building");
        let building = catalog.building(building_idx).unwrap();
        let node_override = request.override_for(&recipe.class_name);
        let overclock = node_override.overclock;
        let somersloops = node_override.somersloops.min(building.somersloop_slots);

        let buildings = split_building_count(original / recipe.main_rate() / overclock, overclock);
        machines.push(MachineNode {
            recipe: recipe_idx,
            recipe_class: recipe.class_name.clone(),
            building: building_idx,
            building_class: building.class_name.clone(),
            original_per_min: original,
            amplified_per_min: amplified,
            total_per_min: total,
            buildings,
            overclock,
            somersloops,
            power_mw: raw.value(&graph::energy_var(recipe_idx)),
            var,
        });
    }

    let edges = build_display_edges(&context, &raw, &resources, &machines, &byproducts);

    let mut solution = Solution {
        status: raw.status,
        objective: raw.objective,
        resources,
        machines,
        byproducts,
        edges,
        assignment: raw,
        context,
    };
    solution.resources.sort_by(|a, b| a.var.cmp(&b.var));
    solution.byproducts.sort_by(|a, b| a.var.cmp(&b.var));
    solution
}

/// Split an exact building count into whole buildings plus an optional
/// partial building at a prorated clock.
fn split_building_count(exact: f64, overclock: f64) -> BuildingCount {
    let whole = exact.floor();
    let frac = exact - whole;
    if frac - MACHINE_EPSILON > PARTIAL_THRESHOLD {
        BuildingCount {
            whole: whole as u32,
            partial_clock: Some(frac * overclock),
        }
    } else if whole == 0.0 && exact > 0.0 {
        // A nonzero rate always counts at least one building.
        BuildingCount {
            whole: 1,
            partial_clock: None,
        }
    } else {
        BuildingCount {
            whole: whole as u32,
            partial_clock: None,
        }
    }
}

/// Proportionally allocate item flows from surviving suppliers to surviving
/// consumers, plus the byproduct side channels.
fn build_display_edges(
    context: &BuildContext<'_>,
    raw: &RawSolution,
    resources: &[ResourceNode],
    machines: &[MachineNode],
    byproducts: &[ByproductNode],
) -> Vec<DisplayEdge> {
    let machine_vars: BTreeMap<RecipeIdx, &str> = machines
        .iter()
        .map(|m| (m.recipe, m.var.as_str()))
        .collect();

    // Suppliers per item: (node var, net rate available for consumption).
    let mut suppliers: BTreeMap<ItemIdx, Vec<(String, f64)>> = BTreeMap::new();
    for resource in resources {
        suppliers
            .entry(resource.item)
            .or_default()
            .push((resource.var.clone(), resource.amount_per_min));
    }
    // Consumers per item: (machine var, consumed rate).
    let mut consumers: BTreeMap<ItemIdx, Vec<(String, f64)>> = BTreeMap::new();

    for (_, kind) in context.graph.nodes() {
        match *kind {
            NodeKind::Output { item, recipe } => {
                let Some(&mvar) = machine_vars.get(&recipe) else {
                    continue;
                };
                let net = raw.value(&graph::total_var(item, recipe))
                    - raw.value(&graph::byproduct_var(item, recipe));
                if net > NODE_EPSILON {
                    suppliers
                        .entry(item)
                        .or_default()
                        .push((mvar.to_string(), net));
                }
            }
            NodeKind::Input { item, recipe } => {
                let Some(&mvar) = machine_vars.get(&recipe) else {
                    continue;
                };
                let consumed = raw.value(&graph::input_var(item, recipe));
                if consumed > NODE_EPSILON {
                    consumers
                        .entry(item)
                        .or_default()
                        .push((mvar.to_string(), consumed));
                }
            }
            _ => {}
        }
    }

    let mut edges = Vec::new();
    for (&item, consumer_list) in &consumers {
        let Some(supplier_list) = suppliers.get(&item) else {
            continue;
        };
        let total_consumed: f64 = consumer_list.iter().map(|(_, c)| c).sum();
        if total_consumed <= NODE_EPSILON {
            continue;
        }
        for (from, available) in supplier_list {
            for (to, consumed) in consumer_list {
                let amount = available * consumed / total_consumed;
                if amount > NODE_EPSILON {
                    edges.push(DisplayEdge {
                        from_var: from.clone(),
                        to_var: to.clone(),
                        item,
                        amount_per_min: amount,
                    });
                }
            }
        }
    }

    // Byproduct side channels off their producing machine.
    for byproduct in byproducts {
        if let Some(&mvar) = machine_vars.get(&byproduct.recipe) {
            edges.push(DisplayEdge {
                from_var: mvar.to_string(),
                to_var: byproduct.var.clone(),
                item: byproduct.item,
                amount_per_min: byproduct.amount_per_min,
            });
        }
    }
    edges
}

// ---------------------------------------------------------------------------
// Auto-set inputs
// ---------------------------------------------------------------------------

/// Round a computed supply amount so that re-feeding it as a fixed input
/// reproduces the identical solution: snap to six decimals, nudging up by
/// one unit in the last place when the raw value carries more digits.
pub fn stabilize_amount(value: f64) -> f64 {
    let scaled = value * STABILIZE_SCALE;
    let rounded = scaled.round();
    if (scaled - rounded).abs() < 1e-2 {
        rounded / STABILIZE_SCALE
    } else {
        (scaled.floor() + 1.0) / STABILIZE_SCALE
    }
}

/// Derive the "auto-set inputs" list from a solution: one `Input`-mode
/// entry per supplied item, with a stabilized amount.
pub fn auto_set_inputs(solution: &Solution<'_>) -> Vec<InputSource> {
    let mut totals: BTreeMap<ItemIdx, (String, f64)> = BTreeMap::new();
    for resource in &solution.resources {
        let entry = totals
            .entry(resource.item)
            .or_insert_with(|| (resource.class_name.clone(), 0.0));
        entry.1 += resource.amount_per_min;
    }
    totals
        .into_values()
        .map(|(class_name, amount)| {
            InputSource::new(class_name, stabilize_amount(amount), InputMode::Input)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stabilize_keeps_clean_values() {
        assert_eq!(stabilize_amount(60.0), 60.0);
        assert_eq!(stabilize_amount(59.25), 59.25);
        assert_eq!(stabilize_amount(0.0), 0.0);
    }

    #[test]
    fn stabilize_snaps_near_grid_values() {
        assert_eq!(stabilize_amount(59.999999999999), 60.0);
        assert_eq!(stabilize_amount(60.000000000001), 60.0);
    }

    #[test]
    fn stabilize_nudges_repeating_decimals_up() {
        let stabilized = stabilize_amount(100.0 / 3.0);
        assert_eq!(stabilized, 33.333334);
        assert!(stabilized > 100.0 / 3.0);
    }

    #[test]
    fn stabilize_is_idempotent() {
        for value in [60.0, 100.0 / 3.0, 59.999999999, 0.1234567891] {
            let once = stabilize_amount(value);
            assert_eq!(stabilize_amount(once), once);
        }
    }

    #[test]
    fn split_rounds_noise_down() {
        let count = split_building_count(2.00005, 1.0);
        assert_eq!(count.whole, 2);
        assert!(count.partial_clock.is_none());
    }

    #[test]
    fn split_emits_partial_building() {
        let count = split_building_count(2.5, 1.0);
        assert_eq!(count.whole, 2);
        assert_eq!(count.partial_clock, Some(0.5));
    }

    #[test]
    fn split_prorates_partial_clock_by_overclock() {
        let count = split_building_count(1.25, 2.0);
        assert_eq!(count.whole, 1);
        assert_eq!(count.partial_clock, Some(0.5));
    }

    #[test]
    fn split_counts_at_least_one_building() {
        let count = split_building_count(0.0005, 1.0);
        assert_eq!(count.whole, 1);
        assert!(count.partial_clock.is_none());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Stabilization may snap down only within the grid tolerance,
            /// and is a fixed point of itself.
            #[test]
            fn stabilize_rounds_safely(value in 0.0f64..100_000.0) {
                let stabilized = stabilize_amount(value);
                prop_assert!(stabilized >= value - 1e-7);
                prop_assert!(stabilized - value < 2e-6);
                prop_assert_eq!(stabilize_amount(stabilized), stabilized);
            }
        }
    }
}

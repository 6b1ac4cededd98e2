//! Assembles the full optimization problem from accumulated graph state
//! plus the user's request.
//!
//! The builder leaves per-recipe relationships in the context; this module
//! adds what spans the whole graph: per-item balance rows, the request's
//! output and input pins, and the objective row.

use crate::builder::BuildContext;
use crate::error::SolveError;
use crate::expr::{Bound, Constraint, LinearExpr, LpProblem};
use crate::graph::{self, NodeKind};
use crate::id::{ItemIdx, RecipeIdx};
use crate::request::{InputMode, Objective, OutputMode, SolverRequest};
use std::collections::BTreeMap;

/// Scaling base for scarcity weights: `weight = WEIGHT_BASE / extraction
/// limit`. An unlimited resource (water) weighs nothing.
pub const WEIGHT_BASE: f64 = 10_000.0;

/// Objective weight pulling "at least, but maximize" outputs upward. Must
/// dominate every per-unit cost the primary objective can produce.
pub const MAXIMIZE_WEIGHT: f64 = 10_000.0;

/// A formulated problem, plus the requested outputs that have no possible
/// supply in the graph (no producing recipe and no world extraction). The
/// caller reports those as an infeasible result without invoking the
/// backend.
#[derive(Debug)]
pub struct Formulation {
    pub problem: LpProblem,
    pub unproducible: Vec<String>,
}

/// Per-item view of the graph, collected once before emitting rows.
#[derive(Debug, Default)]
struct ItemPresence {
    raw: Option<String>,
    supply: Option<String>,
    /// (recipe, total var, byproduct var) per producing output node.
    outputs: Vec<(RecipeIdx, String, String)>,
    inputs: Vec<String>,
}

/// Assemble the optimization problem for the built graph and request.
pub fn formulate(
    ctx: &mut BuildContext<'_>,
    request: &SolverRequest,
) -> Result<Formulation, SolveError> {
    let mut constraints = Vec::new();
    let mut bounds = Vec::new();
    let mut unproducible = Vec::new();

    // Input pins first: they may add supply nodes that the balance rows
    // must see.
    for input in &request.inputs {
        let item = ctx
            .catalog()
            .item_idx(&input.item)
            .ok_or_else(|| SolveError::UnknownResourceReference(input.item.clone()))?;
        let is_world = ctx
            .catalog()
            .item(item)
            .is_some_and(|def| def.is_world_resource());

        if is_world && input.mode != InputMode::Input {
            // Exact/Min/Max constrain total world extraction.
            ctx.graph.ensure_node(NodeKind::Raw { item });
            let r = graph::raw_var(item);
            bounds.push(match input.mode {
                InputMode::Exact => Bound::fixed(&r, input.amount_per_min),
                InputMode::Min => Bound::at_least(&r, input.amount_per_min),
                InputMode::Max => Bound::at_most(&r, input.amount_per_min),
                InputMode::Input => unreachable!(),
            });
        } else {
            // User-provided supply: a separate zero-cost channel.
            ctx.graph.ensure_node(NodeKind::Supply { item });
            let u = graph::supply_var(item);
            bounds.push(match input.mode {
                InputMode::Exact => Bound::fixed(&u, input.amount_per_min),
                InputMode::Min => Bound::at_least(&u, input.amount_per_min),
                InputMode::Max | InputMode::Input => Bound::at_most(&u, input.amount_per_min),
            });
        }
    }

    // Collect the per-item graph presence.
    let mut presence: BTreeMap<ItemIdx, ItemPresence> = BTreeMap::new();
    for (_, kind) in ctx.graph.nodes() {
        match *kind {
            NodeKind::Raw { item } => {
                presence.entry(item).or_default().raw = Some(graph::raw_var(item));
            }
            NodeKind::Supply { item } => {
                presence.entry(item).or_default().supply = Some(graph::supply_var(item));
            }
            NodeKind::Output { item, recipe } => {
                presence.entry(item).or_default().outputs.push((
                    recipe,
                    graph::total_var(item, recipe),
                    graph::byproduct_var(item, recipe),
                ));
            }
            NodeKind::Input { item, recipe } => {
                presence
                    .entry(item)
                    .or_default()
                    .inputs
                    .push(graph::input_var(item, recipe));
            }
            NodeKind::Energy { .. } | NodeKind::Area { .. } | NodeKind::Byproduct { .. } => {}
        }
    }
    for p in presence.values_mut() {
        p.outputs.sort_by_key(|(recipe, _, _)| *recipe);
    }

    // Output pins. Produced items pin the byproduct channel; a world
    // resource with no producers is delivered straight from extraction via
    // its balance row.
    let mut raw_demand: BTreeMap<ItemIdx, (f64, bool)> = BTreeMap::new();
    for output in &request.outputs {
        let item = ctx
            .catalog()
            .item_idx(&output.item)
            .ok_or_else(|| SolveError::UnknownResourceReference(output.item.clone()))?;
        let maximize = output.mode == OutputMode::AtLeastMaximize;
        match presence.get(&item) {
            Some(p) if !p.outputs.is_empty() => {
                let mut expr = LinearExpr::new();
                for (_, _, b) in &p.outputs {
                    expr.add_term(b, 1.0);
                }
                let name = format!("output:{}", output.item);
                constraints.push(if maximize {
                    Constraint::ge(name, expr, output.amount_per_min)
                } else {
                    Constraint::eq(name, expr, output.amount_per_min)
                });
            }
            Some(p) if p.raw.is_some() => {
                let entry = raw_demand.entry(item).or_insert((0.0, false));
                entry.0 += output.amount_per_min;
                entry.1 |= maximize;
            }
            _ => unproducible.push(output.item.clone()),
        }
    }

    // Per-item balance: supply in, consumption and byproduct out.
    for (&item, p) in &presence {
        let mut expr = LinearExpr::new();
        if let Some(r) = &p.raw {
            expr.add_term(r, 1.0);
        }
        if let Some(u) = &p.supply {
            expr.add_term(u, 1.0);
        }
        for (_, t, b) in &p.outputs {
            expr.add_term(t, 1.0);
            expr.add_term(b, -1.0);
        }
        for i in &p.inputs {
            expr.add_term(i, -1.0);
        }
        let class_name = ctx
            .catalog()
            .item(item)
            .map(|def| def.class_name.clone())
            .unwrap_or_default();
        let name = format!("balance:{class_name}");
        let (demand, relaxed) = raw_demand.get(&item).copied().unwrap_or((0.0, false));
        constraints.push(if relaxed {
            Constraint::ge(name, expr, demand)
        } else {
            Constraint::eq(name, expr, demand)
        });
    }

    // Objective row.
    let mut objective = LinearExpr::new();
    match request.objective {
        Objective::MinimizePower => {
            for (_, kind) in ctx.graph.nodes() {
                if let NodeKind::Energy { recipe } = kind {
                    objective.add_term(graph::energy_var(*recipe), 1.0);
                }
            }
        }
        Objective::MinimizeResources => {
            for (_, kind) in ctx.graph.nodes() {
                if let NodeKind::Raw { item } = kind {
                    objective.add_term(graph::raw_var(*item), resource_weight(ctx, *item));
                }
            }
        }
        Objective::MinimizeArea => {
            for (_, kind) in ctx.graph.nodes() {
                if let NodeKind::Area { recipe } = kind {
                    objective.add_term(graph::area_var(*recipe), 1.0);
                }
            }
        }
    }
    for output in &request.outputs {
        if output.mode != OutputMode::AtLeastMaximize {
            continue;
        }
        if let Some(item) = ctx.catalog().item_idx(&output.item) {
            match presence.get(&item) {
                Some(p) if !p.outputs.is_empty() => {
                    for (_, _, b) in &p.outputs {
                        objective.add_term(b, -MAXIMIZE_WEIGHT);
                    }
                }
                Some(p) => {
                    if let Some(r) = &p.raw {
                        objective.add_term(r, -MAXIMIZE_WEIGHT);
                    }
                }
                None => {}
            }
        }
    }

    let mut problem = LpProblem::minimize(objective);
    problem.constraints.extend(ctx.constraints.iter().cloned());
    problem.constraints.extend(constraints);
    problem.bounds.extend(ctx.bounds.iter().cloned());
    problem.bounds.extend(bounds);

    // The supply nodes added above must keep the graph invariant intact.
    ctx.validate().map_err(SolveError::from)?;
    ctx.graph
        .check_vars_bound(problem.constraints.iter().flat_map(|c| c.expr.variables()))
        .map_err(SolveError::from)?;

    Ok(Formulation {
        problem,
        unproducible,
    })
}

fn resource_weight(ctx: &BuildContext<'_>, item: ItemIdx) -> f64 {
    let limit = ctx
        .catalog()
        .item(item)
        .and_then(|def| def.extraction_limit)
        .unwrap_or(f64::INFINITY);
    if limit.is_finite() && limit > 0.0 {
        WEIGHT_BASE / limit
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, MicrolpBackend, SolveStatus};
    use crate::builder::build_request_graph;
    use crate::request::{InputSource, OutputTarget};
    use crate::test_utils::*;

    fn solve(catalog: &crate::catalog::Catalog, request: &SolverRequest) -> crate::backend::RawSolution {
        let mut ctx = build_request_graph(catalog, request).unwrap();
        let formulation = formulate(&mut ctx, request).unwrap();
        assert!(formulation.unproducible.is_empty());
        MicrolpBackend::new().solve(&formulation.problem).unwrap()
    }

    #[test]
    fn concrete_demand_pulls_stone() {
        let catalog = concrete_catalog();
        let request = SolverRequest::for_output("Desc_Cement_C", 20.0);
        let raw = solve(&catalog, &request);
        assert_eq!(raw.status, SolveStatus::Optimal);
        // 20 concrete needs 60 stone.
        assert!((raw.value("r0") - 60.0).abs() < 1e-6, "r0 = {}", raw.value("r0"));
        assert!((raw.value("b1r0") - 20.0).abs() < 1e-6);
    }

    #[test]
    fn exact_input_below_requirement_is_infeasible() {
        let catalog = concrete_catalog();
        let mut request = SolverRequest::for_output("Desc_Cement_C", 20.0);
        request
            .inputs
            .push(InputSource::new("Desc_Stone_C", 59.0, InputMode::Exact));
        let raw = solve(&catalog, &request);
        assert_eq!(raw.status, SolveStatus::Infeasible);
    }

    #[test]
    fn max_input_below_requirement_is_infeasible() {
        let catalog = concrete_catalog();
        let mut request = SolverRequest::for_output("Desc_Cement_C", 20.0);
        request
            .inputs
            .push(InputSource::new("Desc_Stone_C", 59.0, InputMode::Max));
        let raw = solve(&catalog, &request);
        assert_eq!(raw.status, SolveStatus::Infeasible);
    }

    #[test]
    fn input_mode_buys_the_deficit() {
        let catalog = concrete_catalog();
        let mut request = SolverRequest::for_output("Desc_Cement_C", 20.0);
        request
            .inputs
            .push(InputSource::new("Desc_Stone_C", 59.0, InputMode::Input));
        let raw = solve(&catalog, &request);
        assert_eq!(raw.status, SolveStatus::Optimal);
        // Free supply is exhausted first; extraction covers the last unit.
        assert!((raw.value("u0") - 59.0).abs() < 1e-6, "u0 = {}", raw.value("u0"));
        assert!((raw.value("r0") - 1.0).abs() < 1e-6, "r0 = {}", raw.value("r0"));
    }

    #[test]
    fn byproducts_absorb_unconsumed_products() {
        let catalog = plastic_catalog();
        let request = SolverRequest::for_output("Desc_Plastic_C", 40.0);
        let raw = solve(&catalog, &request);
        assert_eq!(raw.status, SolveStatus::Optimal);
        // 40 plastic -> 60 oil, residue 20 all byproduct.
        assert!((raw.value("r0") - 60.0).abs() < 1e-6);
        assert!((raw.value("b2r0") - 20.0).abs() < 1e-6);
    }

    #[test]
    fn maximize_mode_grows_output_to_the_input_cap() {
        let catalog = concrete_catalog();
        let mut request = SolverRequest {
            outputs: vec![OutputTarget::maximize("Desc_Cement_C", 5.0)],
            ..SolverRequest::default()
        };
        request
            .inputs
            .push(InputSource::new("Desc_Stone_C", 90.0, InputMode::Max));
        let raw = solve(&catalog, &request);
        assert_eq!(raw.status, SolveStatus::Optimal);
        // 90 stone supports 30 concrete, well past the 5 minimum.
        assert!((raw.value("b1r0") - 30.0).abs() < 1e-6);
    }

    #[test]
    fn unproducible_output_is_flagged() {
        let catalog = concrete_catalog();
        let mut request = SolverRequest::for_output("Desc_Cement_C", 20.0);
        request
            .blocked_resources
            .insert("Desc_Stone_C".to_string());
        // Cement itself is producible; stone is not consumable though, so
        // the solve is infeasible rather than unproducible.
        let mut ctx = build_request_graph(&catalog, &request).unwrap();
        let formulation = formulate(&mut ctx, &request).unwrap();
        assert!(formulation.unproducible.is_empty());
        let raw = MicrolpBackend::new().solve(&formulation.problem).unwrap();
        assert_eq!(raw.status, SolveStatus::Infeasible);

        // A demanded item with no recipes and no extraction is unproducible.
        let request = SolverRequest::for_output("Desc_Cement_C", 20.0);
        let blocked = SolverRequest {
            outputs: vec![OutputTarget::exact("Desc_Cement_C", 20.0)],
            blocked_recipes: ["Recipe_Concrete_C".to_string()].into_iter().collect(),
            ..request
        };
        let mut ctx = build_request_graph(&catalog, &blocked).unwrap();
        let formulation = formulate(&mut ctx, &blocked).unwrap();
        assert_eq!(formulation.unproducible, vec!["Desc_Cement_C".to_string()]);
    }

    #[test]
    fn requested_raw_resource_is_served_by_extraction() {
        let catalog = concrete_catalog();
        let request = SolverRequest::for_output("Desc_Stone_C", 120.0);
        let raw = solve(&catalog, &request);
        assert_eq!(raw.status, SolveStatus::Optimal);
        assert!((raw.value("r0") - 120.0).abs() < 1e-6);
    }

    #[test]
    fn resource_objective_prefers_abundant_resources() {
        // Two interchangeable recipes; the scarce-resource one should idle.
        use crate::catalog::{CatalogBuilder, Form, RecipeKind};
        let mut b = CatalogBuilder::new();
        let scarce = b.add_item(item("Desc_Scarce_C", Form::Solid, Some(100.0)));
        let common = b.add_item(item("Desc_Common_C", Form::Solid, Some(100_000.0)));
        let widget = b.add_item(item("Desc_Widget_C", Form::Solid, None));
        b.add_building(building("Build_ConstructorMk1_C", 8.0, 10.0, 4.0, 1));
        b.add_recipe(recipe(
            "Recipe_WidgetScarce_C",
            "Build_ConstructorMk1_C",
            4.0,
            vec![(scarce, 1.0)],
            vec![(widget, 1.0)],
            RecipeKind::Default,
        ));
        b.add_recipe(recipe(
            "Recipe_WidgetCommon_C",
            "Build_ConstructorMk1_C",
            4.0,
            vec![(common, 1.0)],
            vec![(widget, 1.0)],
            RecipeKind::Default,
        ));
        let catalog = b.build().unwrap();

        let request = SolverRequest::for_output("Desc_Widget_C", 15.0);
        let raw = solve(&catalog, &request);
        assert_eq!(raw.status, SolveStatus::Optimal);
        assert!(raw.value("r0") < 1e-6, "scarce used: {}", raw.value("r0"));
        assert!((raw.value("r1") - 15.0).abs() < 1e-6);
    }

    #[test]
    fn power_objective_sums_energy_nodes() {
        let catalog = concrete_catalog();
        let mut request = SolverRequest::for_output("Desc_Cement_C", 30.0);
        request.objective = Objective::MinimizePower;
        let mut ctx = build_request_graph(&catalog, &request).unwrap();
        let formulation = formulate(&mut ctx, &request).unwrap();
        let terms: Vec<_> = formulation.problem.objective.terms().collect();
        assert_eq!(terms, vec![("e0", 1.0)]);
        let raw = MicrolpBackend::new().solve(&formulation.problem).unwrap();
        // 30/min = two constructors at 4 MW.
        assert!((raw.value("e0") - 8.0).abs() < 1e-6);
    }
}

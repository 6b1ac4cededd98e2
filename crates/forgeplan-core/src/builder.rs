//! Recursive production-constraint derivation.
//!
//! [`BuildContext`] owns everything one solve accumulates: the constraint
//! graph, the constraint and bound lists, and the processed-recipe set.
//! [`BuildContext::compute_production_constraints`] walks the recipe
//! dependency graph for a requested item, emitting nodes, edges, and linear
//! relationships. Recursion terminates because each recipe is expanded at
//! most once regardless of how many times it is reached.

use crate::catalog::{Catalog, RecipeKind};
use crate::error::SolveError;
use crate::expr::{Bound, Constraint, LinearExpr};
use crate::graph::{
    self, ConstraintGraph, GraphError, NodeKind,
};
use crate::id::{ItemIdx, RecipeIdx};
use crate::request::SolverRequest;
use std::collections::HashSet;

/// Buildings that represent hand-crafting rather than automation. Recipes
/// produced in these never enter the constraint graph.
fn is_handcraft_building(class_name: &str) -> bool {
    class_name.contains("WorkBench")
        || class_name.contains("Workshop")
        || class_name.contains("BuildGun")
}

/// Arena for one solve invocation: graph, constraints, bounds, and the
/// bookkeeping that makes the recursive walk idempotent. Created fresh per
/// solve and dropped with it.
#[derive(Debug)]
pub struct BuildContext<'a> {
    catalog: &'a Catalog,
    request: &'a SolverRequest,
    pub graph: ConstraintGraph,
    pub constraints: Vec<Constraint>,
    pub bounds: Vec<Bound>,
    processed: HashSet<RecipeIdx>,
    allowed: HashSet<RecipeIdx>,
    blocked_items: HashSet<ItemIdx>,
}

/// The recipe set a request may draw from: the explicit allowed set, or
/// every `Default`-kind recipe when none is given, minus the blocked set.
pub fn effective_allowed_recipes(
    catalog: &Catalog,
    request: &SolverRequest,
) -> Result<HashSet<RecipeIdx>, SolveError> {
    let mut allowed: HashSet<RecipeIdx> = match &request.allowed_recipes {
        Some(names) => names
            .iter()
            .map(|name| {
                catalog
                    .recipe_idx(name)
                    .ok_or_else(|| SolveError::UnknownRecipeReference(name.clone()))
            })
            .collect::<Result<_, _>>()?,
        None => catalog
            .recipes()
            .filter(|(_, r)| r.kind == RecipeKind::Default)
            .map(|(idx, _)| idx)
            .collect(),
    };
    for name in &request.blocked_recipes {
        let idx = catalog
            .recipe_idx(name)
            .ok_or_else(|| SolveError::UnknownRecipeReference(name.clone()))?;
        allowed.remove(&idx);
    }
    Ok(allowed)
}

impl<'a> BuildContext<'a> {
    /// Resolve the request's recipe/resource sets against the catalog.
    pub fn new(catalog: &'a Catalog, request: &'a SolverRequest) -> Result<Self, SolveError> {
        let allowed = effective_allowed_recipes(catalog, request)?;
        let blocked_items = request
            .blocked_resources
            .iter()
            .map(|name| {
                catalog
                    .item_idx(name)
                    .ok_or_else(|| SolveError::UnknownResourceReference(name.clone()))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            catalog,
            request,
            graph: ConstraintGraph::new(),
            constraints: Vec::new(),
            bounds: Vec::new(),
            processed: HashSet::new(),
            allowed,
            blocked_items,
        })
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Recipes expanded into the graph so far.
    pub fn processed_recipes(&self) -> impl Iterator<Item = RecipeIdx> + '_ {
        self.processed.iter().copied()
    }

    /// Ensure the given resource is representable in the graph: a raw-supply
    /// node if it is a world resource, and exactly one expansion of every
    /// eligible recipe that produces it (recursively, through each recipe's
    /// ingredients).
    ///
    /// Blocked resources get neither a raw node nor recipe expansions. A
    /// non-world resource with no eligible recipe yields no supply at all;
    /// the formulator treats demand for it as unproducible.
    pub fn compute_production_constraints(&mut self, item: ItemIdx) -> Result<(), SolveError> {
        if self.blocked_items.contains(&item) {
            return Ok(());
        }
        if self
            .catalog
            .item(item)
            .is_some_and(|def| def.is_world_resource())
        {
            self.graph.ensure_node(NodeKind::Raw { item });
        }

        let producers: Vec<RecipeIdx> = self.catalog.producers_of(item).to_vec();
        for recipe_idx in producers {
            if !self.allowed.contains(&recipe_idx) || self.processed.contains(&recipe_idx) {
                continue;
            }
            let recipe = self
                .catalog
                .recipe(recipe_idx)
                .expect("producers index is validated at catalog build");
            if is_handcraft_building(&recipe.produced_in) {
                continue;
            }
            // Mark before descending so cyclic recipe chains terminate.
            self.processed.insert(recipe_idx);
            self.process_recipe(recipe_idx)?;
        }
        Ok(())
    }

    /// Emit all nodes, constraints, and bounds for one recipe, then recurse
    /// into its ingredients.
    fn process_recipe(&mut self, recipe_idx: RecipeIdx) -> Result<(), SolveError> {
        let recipe = self.catalog.recipe(recipe_idx).unwrap().clone();
        let building_idx = self.catalog.building_idx(&recipe.produced_in).ok_or_else(|| {
            SolveError::UnresolvableRecipe {
                recipe: recipe.class_name.clone(),
                building: recipe.produced_in.clone(),
            }
        })?;
        let building = self.catalog.building(building_idx).unwrap().clone();

        let node_override = self.request.override_for(&recipe.class_name);
        let overclock = node_override.overclock;
        let slots = building.somersloop_slots;
        let sloops = node_override.somersloops.min(slots);

        let main = *recipe.main_product();
        let main_rate_oc = recipe.main_rate() * overclock;
        let p_main = graph::product_var(main.item, recipe_idx);

        // Products: rate split, amplification, stoichiometry, byproducts.
        for (pos, product) in recipe.products.iter().enumerate() {
            let output = self.graph.ensure_node(NodeKind::Output {
                item: product.item,
                recipe: recipe_idx,
            });
            let byproduct = self.graph.ensure_node(NodeKind::Byproduct {
                item: product.item,
                recipe: recipe_idx,
            });
            self.graph.connect(output, byproduct, product.item)?;

            let p = graph::product_var(product.item, recipe_idx);
            let a = graph::amplified_var(product.item, recipe_idx);
            let t = graph::total_var(product.item, recipe_idx);
            let b = graph::byproduct_var(product.item, recipe_idx);

            // original + amplified = total
            self.constraints.push(Constraint::eq(
                format!("total:{t}"),
                LinearExpr::var(&p).with_term(&a, 1.0).with_term(&t, -1.0),
                0.0,
            ));

            // Amplified portion is capped by the slooped share of the
            // original rate; zero when the request amplifies nothing. Full
            // slots double the output of every building in the group.
            if sloops > 0 {
                let share = sloops as f64 / slots as f64;
                self.constraints.push(Constraint::le(
                    format!("amp_cap:{a}"),
                    LinearExpr::var(&a).with_term(&p, -share),
                    0.0,
                ));
            } else {
                self.bounds.push(Bound::at_most(&a, 0.0));
            }

            // The byproduct channel never exceeds the total produced.
            self.constraints.push(Constraint::ge(
                format!("byproduct_cap:{b}"),
                LinearExpr::var(&t).with_term(&b, -1.0),
                0.0,
            ));

            // Non-main products follow the main product's rates at the
            // per-cycle amount ratio, for both the original and amplified
            // portions.
            if pos > 0 {
                let ratio = product.amount / main.amount;
                self.constraints.push(Constraint::eq(
                    format!("stoich:{p}"),
                    LinearExpr::var(&p).with_term(&p_main, -ratio),
                    0.0,
                ));
                let a_main = graph::amplified_var(main.item, recipe_idx);
                self.constraints.push(Constraint::eq(
                    format!("stoich_amp:{a}"),
                    LinearExpr::var(&a).with_term(&a_main, -ratio),
                    0.0,
                ));
            }
        }

        // Energy accounting, tied to the main-product rate. Overclock and
        // amplification scale a building's draw by their respective
        // exponents while only overclock scales its throughput.
        let amp_power = if slots > 0 {
            (1.0 + sloops as f64 / slots as f64).powf(building.amplification_exponent)
        } else {
            1.0
        };
        let power_coeff =
            building.avg_power_mw * overclock.powf(building.power_exponent) * amp_power;
        self.graph.ensure_node(NodeKind::Energy { recipe: recipe_idx });
        let e = graph::energy_var(recipe_idx);
        self.constraints.push(Constraint::eq(
            format!("energy:{e}"),
            LinearExpr::var(&e).with_term(&p_main, -(power_coeff / main_rate_oc)),
            0.0,
        ));

        // Footprint accounting, with a floor of one building.
        self.graph.ensure_node(NodeKind::Area { recipe: recipe_idx });
        let area = graph::area_var(recipe_idx);
        let footprint = building.width * building.length;
        self.constraints.push(Constraint::ge(
            format!("area:{area}"),
            LinearExpr::var(&area).with_term(&p_main, -(footprint / main_rate_oc)),
            0.0,
        ));
        self.bounds.push(Bound::at_least(&area, footprint));

        // Ingredients: consumption proportional to the main product, then
        // recurse to build the upstream production tree.
        for ingredient in &recipe.ingredients {
            self.graph.ensure_node(NodeKind::Input {
                item: ingredient.item,
                recipe: recipe_idx,
            });
            let i = graph::input_var(ingredient.item, recipe_idx);
            let ratio = ingredient.amount / main.amount;
            self.constraints.push(Constraint::eq(
                format!("ingredient:{i}"),
                LinearExpr::var(&i).with_term(&p_main, -ratio),
                0.0,
            ));
            self.compute_production_constraints(ingredient.item)?;
        }

        Ok(())
    }

    /// Second pass after the recursive walk: connect every input node to the
    /// supplies that can feed it (the item's raw node and every output node
    /// producing the item). Runs once, after all nodes exist.
    pub fn link_supplies(&mut self) -> Result<(), SolveError> {
        let inputs: Vec<(crate::id::NodeId, ItemIdx)> = self
            .graph
            .nodes()
            .filter_map(|(id, kind)| match kind {
                NodeKind::Input { item, .. } => Some((id, *item)),
                _ => None,
            })
            .collect();
        let supplies: Vec<(crate::id::NodeId, ItemIdx)> = self
            .graph
            .nodes()
            .filter_map(|(id, kind)| match kind {
                NodeKind::Raw { item } | NodeKind::Output { item, .. } => Some((id, *item)),
                _ => None,
            })
            .collect();
        for &(input, item) in &inputs {
            for &(supply, supply_item) in &supplies {
                if supply_item == item {
                    self.graph.connect(supply, input, item)?;
                }
            }
        }
        Ok(())
    }

    /// Invariant check: every variable referenced by a constraint or bound
    /// has a corresponding graph node.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.graph.check_vars_bound(
            self.constraints
                .iter()
                .flat_map(|c| c.expr.variables())
                .chain(self.bounds.iter().map(|b| b.var.as_str())),
        )
    }
}

/// Build the full constraint graph for a request: one recursive walk per
/// requested output, then supply linking and invariant validation.
pub fn build_request_graph<'a>(
    catalog: &'a Catalog,
    request: &'a SolverRequest,
) -> Result<BuildContext<'a>, SolveError> {
    let mut ctx = BuildContext::new(catalog, request)?;
    for output in &request.outputs {
        let item = catalog
            .item_idx(&output.item)
            .ok_or_else(|| SolveError::UnknownResourceReference(output.item.clone()))?;
        ctx.compute_production_constraints(item)?;
    }
    for input in &request.inputs {
        // Resolution only; supply nodes are the formulator's concern.
        catalog
            .item_idx(&input.item)
            .ok_or_else(|| SolveError::UnknownResourceReference(input.item.clone()))?;
    }
    ctx.link_supplies()?;
    ctx.validate()?;
    Ok(ctx)
}

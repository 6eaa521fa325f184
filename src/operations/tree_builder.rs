// Crafting tree builder - recursive recipe expansion with quantity aggregation
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::models::{CraftingTree, CraftingTreeNode, MaterialRequirement, Recipe};
use crate::operations::recipe_gateway::RecipeSource;
use crate::{v_debug, v_info};

/// Expands a target item into a tree of sub-components down to base
/// materials.
///
/// Shared sub-items (diamond dependencies) collapse into a single node per
/// item id: the first visit expands children and owns the node's position
/// in the tree, later visits only add quantity. When a revisit raises a
/// node's total, the extra demand is pushed down its existing children as
/// exact deltas, so descendant totals stay consistent with the round-up
/// craft rule on every path. Delta propagation is bounded by the same depth
/// limit as expansion, which keeps cyclic recipe data terminating.
pub struct CraftingTreeBuilder<'a> {
    recipes: &'a dyn RecipeSource,
}

struct NodeRecord {
    total: i64,
    depth: u32,
    is_base: bool,
    recipe: Option<Recipe>,
    /// Children attached here at first visit; defines tree placement.
    owned_children: Vec<u32>,
}

struct BuildState {
    records: HashMap<u32, NodeRecord>,
    /// Quantity each parent edge currently contributes to its child.
    edge_contrib: HashMap<(u32, u32), i64>,
    /// `None` means "no recipe" (base material); lookup failures also land
    /// here after being noted in `unresolved`.
    recipe_cache: HashMap<u32, Option<Recipe>>,
    unresolved: Vec<u32>,
    max_depth: u32,
}

impl<'a> CraftingTreeBuilder<'a> {
    pub fn new(recipes: &'a dyn RecipeSource) -> Self {
        Self { recipes }
    }

    /// Build the full crafting tree for `quantity` units of `item_id`.
    ///
    /// Returns `Ok(None)` when the item has no recipe at all: "not
    /// craftable" is a reportable condition, not a failure. A recipe
    /// lookup failure for the root itself is the one hard error.
    pub async fn build(
        &self,
        item_id: u32,
        quantity: i64,
        max_depth: u32,
    ) -> Result<Option<CraftingTree>, Box<dyn std::error::Error>> {
        let quantity = quantity.max(1);

        let root_lookup = self.recipes.recipes_for_outputs(&[item_id]).await?;
        if root_lookup.failed_ids.contains(&item_id) {
            return Err(format!("Recipe lookup failed for root item {}", item_id).into());
        }

        let root_recipe = match root_lookup.found.get(&item_id) {
            Some(recipe) => recipe.clone(),
            None => {
                v_info!("🚫 Item {} has no recipe - nothing to build", item_id);
                return Ok(None);
            }
        };

        v_info!("🌳 Expanding crafting tree for item {} x{} (depth ≤ {})", item_id, quantity, max_depth);

        let mut state = BuildState {
            records: HashMap::new(),
            edge_contrib: HashMap::new(),
            recipe_cache: HashMap::new(),
            unresolved: Vec::new(),
            max_depth,
        };
        state.recipe_cache.insert(item_id, Some(root_recipe));

        self.expand(&mut state, item_id, quantity, 0).await?;

        let root = materialize(&state, item_id);

        let mut total_materials = Vec::new();
        let mut base_materials = Vec::new();
        let mut craftable_intermediates = Vec::new();

        for (&id, record) in &state.records {
            if id == item_id {
                continue;
            }
            let requirement = MaterialRequirement { item_id: id, quantity: record.total };
            total_materials.push(requirement);
            if record.is_base {
                base_materials.push(requirement);
            } else {
                craftable_intermediates.push(requirement);
            }
        }

        total_materials.sort_unstable_by_key(|m| m.item_id);
        base_materials.sort_unstable_by_key(|m| m.item_id);
        craftable_intermediates.sort_unstable_by_key(|m| m.item_id);

        let mut unresolved_items = state.unresolved;
        unresolved_items.sort_unstable();
        unresolved_items.dedup();

        v_info!(
            "✅ Tree complete: {} nodes, {} base materials, {} intermediates",
            state.records.len(),
            base_materials.len(),
            craftable_intermediates.len()
        );

        Ok(Some(CraftingTree {
            root,
            total_materials,
            base_materials,
            craftable_intermediates,
            unresolved_items,
        }))
    }

    /// First-visit expansion of one node. The node's recipe must already be
    /// in the cache (the parent prefetches its whole fan-out in one call).
    fn expand<'s>(
        &'s self,
        state: &'s mut BuildState,
        item_id: u32,
        needed: i64,
        depth: u32,
    ) -> Pin<Box<dyn Future<Output = Result<(), Box<dyn std::error::Error>>> + 's>> {
        Box::pin(async move {
            let recipe = state.recipe_cache.get(&item_id).cloned().flatten();
            let is_base = recipe.is_none() || depth >= state.max_depth;

            if recipe.is_some() && depth >= state.max_depth {
                v_debug!("   ✂️ Depth bound reached at item {} - treating as base", item_id);
            }

            state.records.insert(
                item_id,
                NodeRecord {
                    total: needed,
                    depth,
                    is_base,
                    recipe: recipe.clone(),
                    owned_children: Vec::new(),
                },
            );

            let recipe = match (is_base, recipe) {
                (false, Some(recipe)) => recipe,
                _ => return Ok(()),
            };

            let crafts = recipe.crafts_for(needed);
            let ingredients = merged_ingredients(&recipe);

            // One recipe lookup per fan-out level, not one per ingredient
            let unknown: Vec<u32> = ingredients
                .iter()
                .map(|&(id, _)| id)
                .filter(|id| !state.recipe_cache.contains_key(id))
                .collect();

            if !unknown.is_empty() {
                match self.recipes.recipes_for_outputs(&unknown).await {
                    Ok(lookup) => {
                        for &id in &unknown {
                            if lookup.failed_ids.contains(&id) {
                                state.unresolved.push(id);
                                state.recipe_cache.insert(id, None);
                            } else {
                                state.recipe_cache.insert(id, lookup.found.get(&id).cloned());
                            }
                        }
                    }
                    Err(e) => {
                        // Whole fan-out failed: degrade every child to base
                        v_info!("   ⚠️ Recipe lookup failed for {} ingredients: {}", unknown.len(), e);
                        for &id in &unknown {
                            state.unresolved.push(id);
                            state.recipe_cache.insert(id, None);
                        }
                    }
                }
            }

            for (child_id, count) in ingredients {
                let need = crafts * count;

                if state.records.contains_key(&child_id) {
                    // Aggregation: one node per item id, quantities summed
                    let prior = state.edge_contrib.get(&(item_id, child_id)).copied().unwrap_or(0);
                    state.edge_contrib.insert((item_id, child_id), need);
                    let max_depth = state.max_depth;
                    accumulate(state, child_id, need - prior, max_depth);
                } else {
                    state.edge_contrib.insert((item_id, child_id), need);
                    if let Some(record) = state.records.get_mut(&item_id) {
                        record.owned_children.push(child_id);
                    }
                    self.expand(state, child_id, need, depth + 1).await?;
                }
            }

            Ok(())
        })
    }
}

/// Ingredient list with duplicate item ids folded together.
pub(crate) fn merged_ingredients(recipe: &Recipe) -> Vec<(u32, i64)> {
    let mut merged: Vec<(u32, i64)> = Vec::with_capacity(recipe.ingredients.len());
    for ingredient in &recipe.ingredients {
        match merged.iter_mut().find(|(id, _)| *id == ingredient.item_id) {
            Some((_, count)) => *count += ingredient.count as i64,
            None => merged.push((ingredient.item_id, ingredient.count as i64)),
        }
    }
    merged
}

/// Add quantity to an existing node and push the exact craft-count delta
/// down its children. `guard` bounds propagation so cyclic recipe graphs
/// terminate.
fn accumulate(state: &mut BuildState, item_id: u32, added: i64, guard: u32) {
    if added <= 0 {
        return;
    }

    let (recipe, total, is_base) = match state.records.get_mut(&item_id) {
        Some(record) => {
            record.total += added;
            (record.recipe.clone(), record.total, record.is_base)
        }
        None => return,
    };

    if is_base || guard == 0 {
        return;
    }

    let recipe = match recipe {
        Some(recipe) => recipe,
        None => return,
    };

    let crafts = recipe.crafts_for(total);
    for (child_id, count) in merged_ingredients(&recipe) {
        let need = crafts * count;
        let prior = state.edge_contrib.get(&(item_id, child_id)).copied().unwrap_or(0);
        if need > prior {
            state.edge_contrib.insert((item_id, child_id), need);
            accumulate(state, child_id, need - prior, guard - 1);
        }
    }
}

fn materialize(state: &BuildState, item_id: u32) -> CraftingTreeNode {
    let record = &state.records[&item_id];
    CraftingTreeNode {
        item_id,
        total_quantity: record.total,
        is_base: record.is_base,
        recipe: record.recipe.clone(),
        depth: record.depth,
        children: record
            .owned_children
            .iter()
            .map(|&child| materialize(state, child))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipeIngredient;

    fn recipe_with(ingredients: Vec<RecipeIngredient>) -> Recipe {
        Recipe {
            id: 1,
            output_item_id: 100,
            output_item_count: 1,
            ingredients,
            disciplines: vec![],
            min_rating: None,
        }
    }

    #[test]
    fn merged_ingredients_folds_duplicates() {
        let recipe = recipe_with(vec![
            RecipeIngredient { item_id: 5, count: 2 },
            RecipeIngredient { item_id: 7, count: 1 },
            RecipeIngredient { item_id: 5, count: 3 },
        ]);

        let merged = merged_ingredients(&recipe);
        assert_eq!(merged, vec![(5, 5), (7, 1)]);
    }
}

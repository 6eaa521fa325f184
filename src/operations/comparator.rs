// Buy-vs-craft comparator - memoized recursive cost resolution
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::models::{BuyVsCraftComparison, CheaperOption, IngredientCost, PricePoint, Recipe};
use crate::operations::market_gateway::PriceSource;
use crate::operations::recipe_gateway::RecipeSource;
use crate::operations::tree_builder::merged_ingredients;
use crate::{v_debug, v_info};

/// Decides, for a target item, whether buying it outright or crafting it
/// from ingredients is cheaper.
///
/// Every ingredient resolves to its own cheapest unit cost - direct market
/// price vs its recursive craft cost - memoized per item id for the
/// duration of one `compare` call so shared sub-ingredients are costed
/// once. All caches die with the call; nothing leaks across requests.
pub struct BuyVsCraftComparator<'a> {
    recipes: &'a dyn RecipeSource,
    market: &'a dyn PriceSource,
    max_depth: u32,
}

impl<'a> BuyVsCraftComparator<'a> {
    pub fn new(recipes: &'a dyn RecipeSource, market: &'a dyn PriceSource) -> Self {
        Self { recipes, market, max_depth: crate::DEFAULT_MAX_DEPTH }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Returns `Ok(None)` only when the item can neither be bought nor
    /// crafted - a truly unresolvable target.
    pub async fn compare(
        &self,
        item_id: u32,
        quantity: i64,
        owned: Option<&HashMap<u32, i64>>,
    ) -> Result<Option<BuyVsCraftComparison>, Box<dyn std::error::Error>> {
        let quantity = quantity.max(1);

        let mut resolver = CostResolver {
            recipes: self.recipes,
            market: self.market,
            memo: HashMap::new(),
            price_cache: HashMap::new(),
            recipe_cache: HashMap::new(),
            unresolved: Vec::new(),
            max_depth: self.max_depth,
        };

        resolver.prime_prices(&[item_id]).await;
        let buy_total = resolver.sell_price(item_id).map(|unit| unit * quantity);

        let recipe = resolver.recipe_for(item_id).await;

        let mut ingredients_out: Vec<IngredientCost> = Vec::new();
        let mut offset_applied = false;

        let craft_total = match &recipe {
            None => None,
            Some(recipe) => {
                let crafts = recipe.crafts_for(quantity);
                let ingredients = merged_ingredients(recipe);

                // One price batch for the whole immediate fan-out
                let ingredient_ids: Vec<u32> = ingredients.iter().map(|&(id, _)| id).collect();
                resolver.prime_prices(&ingredient_ids).await;

                let mut total: Option<i64> = Some(0);

                for (ingredient_id, count) in ingredients {
                    let required = crafts * count;

                    // Owned inventory offsets craft requirements only, and
                    // never drives a requirement negative
                    let owned_offset = owned
                        .and_then(|inventory| inventory.get(&ingredient_id).copied())
                        .unwrap_or(0)
                        .clamp(0, required);
                    if owned_offset > 0 {
                        offset_applied = true;
                    }
                    let net_required = required - owned_offset;

                    let unit_buy = resolver.sell_price(ingredient_id);
                    let unit_craft = resolver.craft_unit_cost(ingredient_id, 1).await?;
                    let chosen = match (unit_buy, unit_craft) {
                        (Some(b), Some(c)) => Some(b.min(c)),
                        (Some(b), None) => Some(b),
                        (None, Some(c)) => Some(c),
                        (None, None) => None,
                    };

                    let line_cost = if net_required == 0 {
                        Some(0)
                    } else {
                        chosen.map(|unit| unit * net_required)
                    };

                    total = match (total, line_cost) {
                        (Some(sum), Some(line)) => Some(sum + line),
                        _ => None,
                    };

                    ingredients_out.push(IngredientCost {
                        item_id: ingredient_id,
                        quantity: required,
                        owned_offset,
                        unit_buy_cost: unit_buy,
                        unit_craft_cost: unit_craft,
                        chosen_unit_cost: chosen,
                        line_cost,
                    });
                }

                total
            }
        };

        if buy_total.is_none() && craft_total.is_none() {
            v_info!("🚫 Item {} has no market listing and no resolvable recipe", item_id);
            return Ok(None);
        }

        let (cheaper_option, savings) = BuyVsCraftComparison::pick_cheaper(buy_total, craft_total);

        let mut unresolved_items = resolver.unresolved;
        unresolved_items.sort_unstable();
        unresolved_items.dedup();

        v_debug!(
            "💰 Item {} x{}: buy={:?} craft={:?} -> {:?}",
            item_id, quantity, buy_total, craft_total, cheaper_option
        );

        Ok(Some(BuyVsCraftComparison {
            item_id,
            quantity,
            buy_total_cost: buy_total,
            craft_total_cost: craft_total,
            cheaper_option,
            savings,
            ingredients: ingredients_out,
            owned_offset_applied: offset_applied,
            unresolved_items,
        }))
    }
}

/// Per-call resolution state. Owned by one top-level `compare` invocation
/// and dropped at its end.
struct CostResolver<'a> {
    recipes: &'a dyn RecipeSource,
    market: &'a dyn PriceSource,
    /// Cheapest known unit cost per item; `None` means unresolvable.
    memo: HashMap<u32, Option<i64>>,
    price_cache: HashMap<u32, Option<PricePoint>>,
    recipe_cache: HashMap<u32, Option<Recipe>>,
    unresolved: Vec<u32>,
    max_depth: u32,
}

impl<'a> CostResolver<'a> {
    /// Fetch prices for any uncached ids in one batch. Gateway failure
    /// degrades the affected ids to "no price" rather than aborting.
    async fn prime_prices(&mut self, ids: &[u32]) {
        let missing: Vec<u32> = ids.iter().copied().filter(|id| !self.price_cache.contains_key(id)).collect();
        if missing.is_empty() {
            return;
        }

        match self.market.prices_by_ids(&missing).await {
            Ok(price_map) => {
                for id in missing {
                    self.price_cache.insert(id, price_map.by_id.get(&id).copied());
                }
                self.unresolved.extend(price_map.failed_ids);
            }
            Err(e) => {
                v_debug!("   ⚠️ Price lookup failed for {} ids: {}", missing.len(), e);
                for id in missing {
                    self.price_cache.insert(id, None);
                    self.unresolved.push(id);
                }
            }
        }
    }

    fn sell_price(&self, item_id: u32) -> Option<i64> {
        self.price_cache
            .get(&item_id)
            .copied()
            .flatten()
            .and_then(|price| price.purchase_price())
    }

    /// Cached recipe lookup; a failed lookup degrades to "no recipe" and is
    /// recorded in `unresolved`.
    async fn recipe_for(&mut self, item_id: u32) -> Option<Recipe> {
        if let Some(cached) = self.recipe_cache.get(&item_id) {
            return cached.clone();
        }

        let recipe = match self.recipes.recipe_for_output(item_id).await {
            Ok(recipe) => recipe,
            Err(e) => {
                v_debug!("   ⚠️ Recipe lookup failed for item {}: {}", item_id, e);
                self.unresolved.push(item_id);
                None
            }
        };

        self.recipe_cache.insert(item_id, recipe.clone());
        recipe
    }

    /// Cost of crafting a single unit from sub-components, ignoring the
    /// item's own market price. One craft yields a full output batch; a
    /// single unit still pays for the whole batch (no fractional crafts).
    async fn craft_unit_cost(&mut self, item_id: u32, depth: u32) -> Result<Option<i64>, Box<dyn std::error::Error>> {
        if depth >= self.max_depth {
            v_debug!("   ✂️ Cost recursion bound hit at item {} - branch unavailable", item_id);
            return Ok(None);
        }

        let recipe = match self.recipe_for(item_id).await {
            Some(recipe) => recipe,
            None => return Ok(None),
        };

        let ingredients = merged_ingredients(&recipe);
        let ingredient_ids: Vec<u32> = ingredients.iter().map(|&(id, _)| id).collect();
        self.prime_prices(&ingredient_ids).await;

        let mut total = 0i64;
        for (ingredient_id, count) in ingredients {
            match self.cheapest_unit_cost(ingredient_id, depth + 1).await? {
                Some(unit) => total += unit * count,
                None => return Ok(None),
            }
        }

        Ok(Some(total))
    }

    /// `min(direct market price, recursive craft cost)`, memoized per item
    /// id within one top-level comparison.
    fn cheapest_unit_cost<'s>(
        &'s mut self,
        item_id: u32,
        depth: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Option<i64>, Box<dyn std::error::Error>>> + 's>> {
        Box::pin(async move {
            if let Some(&memoized) = self.memo.get(&item_id) {
                return Ok(memoized);
            }

            self.prime_prices(&[item_id]).await;
            let buy = self.sell_price(item_id);

            let craft = self.craft_unit_cost(item_id, depth).await?;

            let cheapest = match (buy, craft) {
                (Some(b), Some(c)) => Some(b.min(c)),
                (Some(b), None) => Some(b),
                (None, Some(c)) => Some(c),
                (None, None) => None,
            };

            self.memo.insert(item_id, cheapest);
            Ok(cheapest)
        })
    }
}

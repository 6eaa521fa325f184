// Tree enrichment - display names and market prices in one batched pass
use std::collections::HashMap;

use crate::models::{CraftingTree, CraftingTreeNode, EnrichedCraftingTree, EnrichedTreeNode, Item, PricePoint};
use crate::operations::item_gateway::ItemSource;
use crate::operations::market_gateway::PriceSource;
use crate::v_info;

/// Annotates every node of a built tree with name, icon, rarity and
/// current prices.
///
/// The whole tree is decorated from exactly one item-detail batch call and
/// exactly one price batch call, never one request per node. Items missing
/// from either response degrade to a fallback name and zero prices instead
/// of failing the enrichment.
pub struct TreeEnricher<'a> {
    items: &'a dyn ItemSource,
    market: &'a dyn PriceSource,
}

impl<'a> TreeEnricher<'a> {
    pub fn new(items: &'a dyn ItemSource, market: &'a dyn PriceSource) -> Self {
        Self { items, market }
    }

    pub async fn enrich(&self, tree: &CraftingTree) -> Result<EnrichedCraftingTree, Box<dyn std::error::Error>> {
        let ids = tree.item_ids();
        v_info!("🎨 Enriching tree: {} distinct items, 2 batch calls", ids.len());

        let mut details: HashMap<u32, Item> = HashMap::new();
        match self.items.items_by_ids(&ids).await {
            Ok(batch) => {
                for item in batch.resolved {
                    details.insert(item.id, item);
                }
            }
            Err(e) => {
                v_info!("   ⚠️ Item detail batch failed, using fallback names: {}", e);
            }
        }

        let mut prices: HashMap<u32, PricePoint> = HashMap::new();
        match self.market.prices_by_ids(&ids).await {
            Ok(price_map) => {
                prices = price_map.by_id;
            }
            Err(e) => {
                v_info!("   ⚠️ Price batch failed, using zero prices: {}", e);
            }
        }

        let missing_details: Vec<u32> = ids.iter().copied().filter(|id| !details.contains_key(id)).collect();
        let missing_prices: Vec<u32> = ids.iter().copied().filter(|id| !prices.contains_key(id)).collect();

        Ok(EnrichedCraftingTree {
            root: decorate(&tree.root, &details, &prices),
            total_materials: tree.total_materials.clone(),
            base_materials: tree.base_materials.clone(),
            craftable_intermediates: tree.craftable_intermediates.clone(),
            unresolved_items: tree.unresolved_items.clone(),
            missing_details,
            missing_prices,
        })
    }
}

fn decorate(
    node: &CraftingTreeNode,
    details: &HashMap<u32, Item>,
    prices: &HashMap<u32, PricePoint>,
) -> EnrichedTreeNode {
    let item = details
        .get(&node.item_id)
        .cloned()
        .unwrap_or_else(|| Item::fallback(node.item_id));
    let price = prices.get(&node.item_id);

    EnrichedTreeNode {
        item_id: node.item_id,
        total_quantity: node.total_quantity,
        is_base: node.is_base,
        recipe: node.recipe.clone(),
        depth: node.depth,
        name: item.name,
        icon: item.icon,
        rarity: item.rarity,
        buy_price: price.map(|p| p.buy_unit_price).unwrap_or(0),
        sell_price: price.map(|p| p.sell_unit_price).unwrap_or(0),
        children: node
            .children
            .iter()
            .map(|child| decorate(child, details, prices))
            .collect(),
    }
}

use serde::Serialize;

use crate::models::recipe::Recipe;

/// One item's contribution to a target craft.
///
/// A given item id appears exactly once in the whole tree: when several
/// branches require the same material, their quantities are summed into a
/// single node (attached under the first branch that needed it) instead of
/// duplicating the subtree. Cost and material totals depend on that.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CraftingTreeNode {
    pub item_id: u32,
    /// Aggregated across every parent path that requires this item.
    pub total_quantity: i64,
    /// True when the item has no recipe, its lookup failed, or the depth
    /// bound cut expansion off.
    pub is_base: bool,
    pub recipe: Option<Recipe>,
    /// Distance from the root at first visit (root = 0).
    pub depth: u32,
    pub children: Vec<CraftingTreeNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaterialRequirement {
    pub item_id: u32,
    pub quantity: i64,
}

/// Fully expanded crafting tree for one target item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CraftingTree {
    pub root: CraftingTreeNode,
    /// Every material below the root, de-duplicated, sorted by item id.
    pub total_materials: Vec<MaterialRequirement>,
    /// Subset of `total_materials` that cannot (or will not) be expanded.
    pub base_materials: Vec<MaterialRequirement>,
    /// Subset with a recipe of their own, excluding the root itself.
    pub craftable_intermediates: Vec<MaterialRequirement>,
    /// Items whose recipe lookup failed outright; they were conservatively
    /// treated as base materials.
    pub unresolved_items: Vec<u32>,
}

impl CraftingTree {
    /// Distinct item ids present anywhere in the tree, root included.
    pub fn item_ids(&self) -> Vec<u32> {
        let mut ids = Vec::new();
        collect_ids(&self.root, &mut ids);
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

fn collect_ids(node: &CraftingTreeNode, out: &mut Vec<u32>) {
    out.push(node.item_id);
    for child in &node.children {
        collect_ids(child, out);
    }
}

/// Tree node annotated with display and market data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTreeNode {
    pub item_id: u32,
    pub total_quantity: i64,
    pub is_base: bool,
    pub recipe: Option<Recipe>,
    pub depth: u32,
    pub name: String,
    pub icon: Option<String>,
    pub rarity: String,
    /// Highest standing buy order, 0 when no listing exists.
    pub buy_price: i64,
    /// Lowest standing sell listing, 0 when no listing exists.
    pub sell_price: i64,
    pub children: Vec<EnrichedTreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedCraftingTree {
    pub root: EnrichedTreeNode,
    pub total_materials: Vec<MaterialRequirement>,
    pub base_materials: Vec<MaterialRequirement>,
    pub craftable_intermediates: Vec<MaterialRequirement>,
    pub unresolved_items: Vec<u32>,
    /// Ids the item-detail lookup could not resolve; their nodes carry the
    /// fallback display name.
    pub missing_details: Vec<u32>,
    /// Ids with no active trading post listing; their nodes carry zero prices.
    pub missing_prices: Vec<u32>,
}

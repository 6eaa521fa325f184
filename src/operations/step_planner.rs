// Crafting step planner - depth-grouped material aggregation
use std::collections::BTreeMap;

use crate::models::{EnrichedCraftingTree, EnrichedTreeNode};

/// One material requirement at a given tree depth.
#[derive(Debug, Clone, PartialEq)]
pub struct CraftingStep {
    pub item_id: u32,
    pub name: String,
    pub quantity: i64,
    pub is_base: bool,
}

/// Groups the tree's materials by depth (root = 0), keys ascending.
///
/// Materials at the same depth with the same item id merge by summing
/// quantity. The planner only aggregates: the human crafting order is
/// deepest-first, and reversing for display is the caller's job.
pub fn calculate_steps(tree: &EnrichedCraftingTree) -> BTreeMap<u32, Vec<CraftingStep>> {
    let mut steps: BTreeMap<u32, Vec<CraftingStep>> = BTreeMap::new();
    walk(&tree.root, 0, &mut steps);

    for level in steps.values_mut() {
        level.sort_unstable_by_key(|step| step.item_id);
    }

    steps
}

fn walk(node: &EnrichedTreeNode, depth: u32, steps: &mut BTreeMap<u32, Vec<CraftingStep>>) {
    let level = steps.entry(depth).or_default();

    match level.iter_mut().find(|step| step.item_id == node.item_id) {
        Some(step) => step.quantity += node.total_quantity,
        None => level.push(CraftingStep {
            item_id: node.item_id,
            name: node.name.clone(),
            quantity: node.total_quantity,
            is_base: node.is_base,
        }),
    }

    for child in &node.children {
        walk(child, depth + 1, steps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnrichedCraftingTree;

    fn leaf(item_id: u32, quantity: i64) -> EnrichedTreeNode {
        EnrichedTreeNode {
            item_id,
            total_quantity: quantity,
            is_base: true,
            recipe: None,
            depth: 1,
            name: format!("Item {}", item_id),
            icon: None,
            rarity: "Basic".to_string(),
            buy_price: 0,
            sell_price: 0,
            children: vec![],
        }
    }

    #[test]
    fn groups_by_depth_with_ascending_keys() {
        let mut intermediate = leaf(20, 4);
        intermediate.is_base = false;
        intermediate.children = vec![leaf(30, 8)];

        let root = EnrichedTreeNode {
            item_id: 10,
            total_quantity: 1,
            is_base: false,
            recipe: None,
            depth: 0,
            name: "Target".to_string(),
            icon: None,
            rarity: "Exotic".to_string(),
            buy_price: 0,
            sell_price: 0,
            children: vec![intermediate, leaf(40, 2)],
        };

        let tree = EnrichedCraftingTree {
            root,
            total_materials: vec![],
            base_materials: vec![],
            craftable_intermediates: vec![],
            unresolved_items: vec![],
            missing_details: vec![],
            missing_prices: vec![],
        };

        let steps = calculate_steps(&tree);
        let depths: Vec<u32> = steps.keys().copied().collect();
        assert_eq!(depths, vec![0, 1, 2]);

        assert_eq!(steps[&0].len(), 1);
        assert_eq!(steps[&1].len(), 2);
        assert_eq!(steps[&1][0].item_id, 20);
        assert_eq!(steps[&1][1].item_id, 40);
        assert_eq!(steps[&2][0].quantity, 8);
    }
}

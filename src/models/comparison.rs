use serde::Serialize;

/// Which acquisition path is cheaper for an item.
///
/// An exact tie resolves to Buy: immediate acquisition at the same price
/// beats queueing up crafts. This is a policy choice, not a domain rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheaperOption {
    Buy,
    Craft,
}

/// Per-ingredient line of a buy-vs-craft breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientCost {
    pub item_id: u32,
    /// Quantity the recipe requires before any owned offset.
    pub quantity: i64,
    /// Portion covered by owned inventory (never exceeds `quantity`).
    pub owned_offset: i64,
    /// Direct market unit price, `None` when nothing is listed.
    pub unit_buy_cost: Option<i64>,
    /// Recursive craft unit cost, `None` when uncraftable or unresolvable.
    pub unit_craft_cost: Option<i64>,
    /// The cheaper of the two unit costs.
    pub chosen_unit_cost: Option<i64>,
    /// `chosen_unit_cost * (quantity - owned_offset)`, 0 when fully offset.
    pub line_cost: Option<i64>,
}

/// Result of comparing buying an item outright against crafting it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyVsCraftComparison {
    pub item_id: u32,
    pub quantity: i64,
    /// `None` when the item has no active sell listing.
    pub buy_total_cost: Option<i64>,
    /// `None` when the item has no recipe or no ingredient could be costed.
    pub craft_total_cost: Option<i64>,
    pub cheaper_option: CheaperOption,
    /// Absolute difference between the two totals; 0 when either side is
    /// unavailable.
    pub savings: i64,
    pub ingredients: Vec<IngredientCost>,
    /// True when an owned-materials map was supplied and reduced craft cost.
    pub owned_offset_applied: bool,
    /// Ids whose price or recipe lookups failed; their costs degraded to
    /// unavailable rather than failing the comparison.
    pub unresolved_items: Vec<u32>,
}

impl BuyVsCraftComparison {
    /// Applies the tie-to-Buy policy to a pair of optional totals.
    pub fn pick_cheaper(buy: Option<i64>, craft: Option<i64>) -> (CheaperOption, i64) {
        match (buy, craft) {
            (Some(b), Some(c)) if c < b => (CheaperOption::Craft, b - c),
            (Some(b), Some(c)) => (CheaperOption::Buy, c - b),
            (Some(_), None) => (CheaperOption::Buy, 0),
            (None, Some(_)) => (CheaperOption::Craft, 0),
            (None, None) => (CheaperOption::Buy, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_resolves_to_buy() {
        let (option, savings) = BuyVsCraftComparison::pick_cheaper(Some(100), Some(100));
        assert_eq!(option, CheaperOption::Buy);
        assert_eq!(savings, 0);
    }

    #[test]
    fn unavailable_buy_prefers_craft() {
        let (option, savings) = BuyVsCraftComparison::pick_cheaper(None, Some(999_999));
        assert_eq!(option, CheaperOption::Craft);
        assert_eq!(savings, 0);
    }
}

use serde::{Deserialize, Serialize};

/// Crafting recipe as returned by `GET /recipes?ids=...`
///
/// An item with no recipe is a base material. `output_item_count` is the
/// yield of a single craft and commonly exceeds 1, which is why all
/// quantity math rounds crafts up rather than scaling fractionally.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Recipe {
    pub id: u32,
    pub output_item_id: u32,
    #[serde(default = "default_output_count")]
    pub output_item_count: u32,
    pub ingredients: Vec<RecipeIngredient>,
    // Discipline metadata is informational only, never load-bearing for cost
    #[serde(default)]
    pub disciplines: Vec<String>,
    pub min_rating: Option<u32>,
}

fn default_output_count() -> u32 {
    1
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RecipeIngredient {
    pub item_id: u32,
    pub count: u32,
}

impl Recipe {
    /// Number of crafts needed to yield at least `needed` units.
    /// A partial craft still consumes a full batch, so this always rounds up.
    pub fn crafts_for(&self, needed: i64) -> i64 {
        let per_craft = self.output_item_count.max(1) as i64;
        (needed + per_craft - 1) / per_craft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafts_round_up_not_down() {
        let recipe = Recipe {
            id: 1,
            output_item_id: 10,
            output_item_count: 5,
            ingredients: vec![],
            disciplines: vec![],
            min_rating: None,
        };

        assert_eq!(recipe.crafts_for(1), 1);
        assert_eq!(recipe.crafts_for(5), 1);
        assert_eq!(recipe.crafts_for(6), 2);
        assert_eq!(recipe.crafts_for(10), 2);
        assert_eq!(recipe.crafts_for(11), 3);
    }
}

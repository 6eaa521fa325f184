// Recipe gateway - lookup of crafting recipes by id, output, and ingredient
use async_trait::async_trait;
use std::collections::HashMap;

use crate::client::{FetchBatch, GameApiClient};
use crate::models::Recipe;
use crate::v_debug;

/// Result of a batched recipe-by-output lookup. An item absent from both
/// `found` and `failed_ids` has no recipe at all (base material).
#[derive(Debug, Clone, Default)]
pub struct RecipeLookup {
    pub found: HashMap<u32, Recipe>,
    pub failed_ids: Vec<u32>,
}

/// Capability interface over the recipe source. Any transport (HTTP,
/// fixture, mock) can satisfy it, which keeps the tree builder and
/// comparator testable without network access.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn recipes_by_ids(&self, ids: &[u32]) -> Result<FetchBatch<Recipe>, Box<dyn std::error::Error>>;

    /// Recipes producing each of the given items, batched per fan-out level.
    async fn recipes_for_outputs(&self, item_ids: &[u32]) -> Result<RecipeLookup, Box<dyn std::error::Error>>;

    /// Recipes that consume the given item as an ingredient.
    async fn recipes_with_ingredient(&self, item_id: u32) -> Result<Vec<Recipe>, Box<dyn std::error::Error>>;

    /// The recipe producing a single item, if one exists.
    async fn recipe_for_output(&self, item_id: u32) -> Result<Option<Recipe>, Box<dyn std::error::Error>> {
        let mut lookup = self.recipes_for_outputs(&[item_id]).await?;
        if lookup.failed_ids.contains(&item_id) {
            return Err(format!("Recipe lookup failed for item {}", item_id).into());
        }
        Ok(lookup.found.remove(&item_id))
    }
}

/// HTTP-backed recipe gateway over the live game API.
pub struct ApiRecipeGateway {
    client: GameApiClient,
}

impl ApiRecipeGateway {
    pub fn new(client: GameApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecipeSource for ApiRecipeGateway {
    async fn recipes_by_ids(&self, ids: &[u32]) -> Result<FetchBatch<Recipe>, Box<dyn std::error::Error>> {
        self.client.get_recipes(ids).await
    }

    async fn recipes_for_outputs(&self, item_ids: &[u32]) -> Result<RecipeLookup, Box<dyn std::error::Error>> {
        let mut lookup = RecipeLookup::default();

        // The search endpoint is one call per item; the recipe bodies for
        // the whole fan-out level are then fetched in a single batch.
        let mut wanted_recipe_ids: Vec<u32> = Vec::new();
        let mut recipe_to_item: HashMap<u32, u32> = HashMap::new();

        for &item_id in item_ids {
            match self.client.search_recipes_by_output(item_id).await {
                Ok(recipe_ids) => {
                    // An item can have several recipes; the first listed one
                    // is used, matching the single-recipe lookup contract.
                    if let Some(&recipe_id) = recipe_ids.first() {
                        wanted_recipe_ids.push(recipe_id);
                        recipe_to_item.insert(recipe_id, item_id);
                    }
                }
                Err(e) => {
                    v_debug!("   ⚠️ Recipe search failed for item {}: {}", item_id, e);
                    lookup.failed_ids.push(item_id);
                }
            }
        }

        if wanted_recipe_ids.is_empty() {
            return Ok(lookup);
        }

        let batch = self.client.get_recipes(&wanted_recipe_ids).await?;

        for failed_recipe_id in &batch.failed_ids {
            if let Some(&item_id) = recipe_to_item.get(failed_recipe_id) {
                lookup.failed_ids.push(item_id);
            }
        }

        for recipe in batch.resolved {
            lookup.found.insert(recipe.output_item_id, recipe);
        }

        Ok(lookup)
    }

    async fn recipes_with_ingredient(&self, item_id: u32) -> Result<Vec<Recipe>, Box<dyn std::error::Error>> {
        let recipe_ids = self.client.search_recipes_by_input(item_id).await?;
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        let batch = self.client.get_recipes(&recipe_ids).await?;
        Ok(batch.resolved)
    }
}

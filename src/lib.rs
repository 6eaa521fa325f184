// Guild Wars 2 crafting cost engine library
// Buy-vs-craft resolution over the live trading post API

pub mod models;
pub mod client;
pub mod operations;
pub mod config;
pub mod verbosity;

// Re-export commonly used types
pub use models::{
    item::Item,
    recipe::{Recipe, RecipeIngredient},
    market::PricePoint,
    tree::{CraftingTree, CraftingTreeNode, EnrichedCraftingTree, EnrichedTreeNode, MaterialRequirement},
    comparison::{BuyVsCraftComparison, CheaperOption, IngredientCost},
};

pub use client::GameApiClient;
pub use config::CraftConfig;
pub use operations::{
    recipe_gateway::{RecipeSource, ApiRecipeGateway, RecipeLookup},
    market_gateway::{PriceSource, ApiMarketGateway},
    item_gateway::{ItemSource, ApiItemGateway},
    tree_builder::CraftingTreeBuilder,
    enrichment::TreeEnricher,
    step_planner::{calculate_steps, CraftingStep},
    comparator::BuyVsCraftComparator,
};

// Constants
pub const API_BASE_URL: &str = "https://api.guildwars2.com/v2";
pub const MAX_IDS_PER_REQUEST: usize = 200;
pub const DEFAULT_MAX_DEPTH: u32 = 10;

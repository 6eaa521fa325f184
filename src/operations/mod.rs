// Operations module - gateways and the crafting cost engine
pub mod recipe_gateway;
pub mod market_gateway;
pub mod item_gateway;
pub mod tree_builder;
pub mod enrichment;
pub mod step_planner;
pub mod comparator;

pub use recipe_gateway::{RecipeSource, ApiRecipeGateway, RecipeLookup};
pub use market_gateway::{PriceSource, ApiMarketGateway, PriceMap};
pub use item_gateway::{ItemSource, ApiItemGateway};
pub use tree_builder::CraftingTreeBuilder;
pub use enrichment::TreeEnricher;
pub use step_planner::{calculate_steps, CraftingStep};
pub use comparator::BuyVsCraftComparator;

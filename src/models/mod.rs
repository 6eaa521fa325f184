// Models module - wire and domain types for the crafting engine
pub mod item;
pub mod recipe;
pub mod market;
pub mod tree;
pub mod comparison;

pub use item::Item;
pub use recipe::{Recipe, RecipeIngredient};
pub use market::{ItemPrice, PriceOrders, PricePoint};
pub use tree::{CraftingTree, CraftingTreeNode, EnrichedCraftingTree, EnrichedTreeNode, MaterialRequirement};
pub use comparison::{BuyVsCraftComparison, CheaperOption, IngredientCost};

// gw2craft - buy-vs-craft cost engine for the trading post
use clap::{ArgAction, Parser, Subcommand};
use std::collections::HashMap;

use gw2craft_cc::{
    calculate_steps, verbosity, ApiItemGateway, ApiMarketGateway, ApiRecipeGateway,
    BuyVsCraftComparator, CheaperOption, CraftConfig, CraftingTreeBuilder, EnrichedTreeNode,
    GameApiClient, RecipeSource, TreeEnricher,
};
use gw2craft_cc::{v_error, v_summary};

#[derive(Parser)]
#[command(name = "gw2craft", about = "Crafting tree and buy-vs-craft cost resolution over the live trading post")]
struct Cli {
    /// Increase output detail (-v progress, -vv full trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(long, default_value = "config/gw2craft.toml", global = true)]
    config: String,

    /// Append API request traces to api_debug.log
    #[arg(long, global = true)]
    api_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Expand an item into its full crafting tree with prices
    Tree {
        item_id: u32,
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
        #[arg(long)]
        max_depth: Option<u32>,
    },
    /// Show the crafting plan, deepest materials first
    Steps {
        item_id: u32,
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Compare buying an item outright against crafting it
    Compare {
        item_id: u32,
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
        /// Owned materials as id=quantity, repeatable
        #[arg(long = "owned", value_parser = parse_owned)]
        owned: Vec<(u32, i64)>,
    },
    /// List recipes that consume an item as an ingredient
    Uses { item_id: u32 },
}

fn parse_owned(raw: &str) -> Result<(u32, i64), String> {
    let (id, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected id=quantity, got '{}'", raw))?;
    let id = id.trim().parse().map_err(|_| format!("invalid item id '{}'", id))?;
    let quantity = quantity.trim().parse().map_err(|_| format!("invalid quantity '{}'", quantity))?;
    Ok((id, quantity))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    verbosity::set_verbosity_level(cli.verbose);

    let config = CraftConfig::load_or_create(&cli.config)?;
    if let Err(e) = config.validate() {
        v_error!("❌ Invalid configuration: {}", e);
        return Err(e.into());
    }
    config.print_summary();

    let mut client = GameApiClient::from_config(&config.api);
    client.set_api_logging(cli.api_log);

    let recipes = ApiRecipeGateway::new(client.clone());
    let market = ApiMarketGateway::new(client.clone());
    let items = ApiItemGateway::new(client);

    match cli.command {
        Command::Tree { item_id, quantity, max_depth } => {
            let max_depth = max_depth.unwrap_or(config.crafting.default_max_depth);
            let builder = CraftingTreeBuilder::new(&recipes);

            match builder.build(item_id, quantity, max_depth).await? {
                None => v_summary!("🚫 Item {} is not craftable", item_id),
                Some(tree) => {
                    let enricher = TreeEnricher::new(&items, &market);
                    let enriched = enricher.enrich(&tree).await?;

                    v_summary!("\n🌳 Crafting tree for {} x{}:", enriched.root.name, quantity);
                    print_node(&enriched.root, 0);

                    v_summary!("\n📦 Base materials:");
                    let names = collect_names(&enriched.root);
                    for material in &enriched.base_materials {
                        let name = names.get(&material.item_id).cloned().unwrap_or_else(|| format!("Item {}", material.item_id));
                        v_summary!("   {} x{}", name, material.quantity);
                    }

                    if !enriched.unresolved_items.is_empty() {
                        v_summary!("⚠️ Unresolved items (treated as base): {:?}", enriched.unresolved_items);
                    }
                }
            }
        }

        Command::Steps { item_id, quantity } => {
            let builder = CraftingTreeBuilder::new(&recipes);

            match builder.build(item_id, quantity, config.crafting.default_max_depth).await? {
                None => v_summary!("🚫 Item {} is not craftable", item_id),
                Some(tree) => {
                    let enricher = TreeEnricher::new(&items, &market);
                    let enriched = enricher.enrich(&tree).await?;
                    let steps = calculate_steps(&enriched);

                    v_summary!("\n🛠️ Crafting plan for {} x{} (gather first, craft upward):", enriched.root.name, quantity);

                    // Planner keys ascend from the root; humans craft
                    // deepest materials first, so display reversed
                    for (step_number, (depth, materials)) in steps.iter().rev().enumerate() {
                        v_summary!("   Step {} (depth {}):", step_number + 1, depth);
                        for material in materials {
                            let action = if material.is_base { "gather" } else { "craft" };
                            v_summary!("      {} {} x{}", action, material.name, material.quantity);
                        }
                    }
                }
            }
        }

        Command::Compare { item_id, quantity, owned } => {
            let owned_map: HashMap<u32, i64> = owned.into_iter().collect();
            let owned_ref = if owned_map.is_empty() { None } else { Some(&owned_map) };

            let comparator = BuyVsCraftComparator::new(&recipes, &market)
                .with_max_depth(config.crafting.max_cost_depth);

            match comparator.compare(item_id, quantity, owned_ref).await? {
                None => v_summary!("🚫 Item {} has no market listing and no recipe - nothing to compare", item_id),
                Some(comparison) => {
                    v_summary!("\n💰 Buy vs craft for item {} x{}:", item_id, quantity);
                    v_summary!("   Buy:   {}", format_cost(comparison.buy_total_cost));
                    v_summary!("   Craft: {}", format_cost(comparison.craft_total_cost));

                    match comparison.cheaper_option {
                        CheaperOption::Buy => v_summary!("   ✅ BUY is cheaper (saves {})", format_coins(comparison.savings)),
                        CheaperOption::Craft => v_summary!("   ✅ CRAFT is cheaper (saves {})", format_coins(comparison.savings)),
                    }

                    if !comparison.ingredients.is_empty() {
                        v_summary!("\n   Ingredient breakdown:");
                        for line in &comparison.ingredients {
                            let offset = if line.owned_offset > 0 {
                                format!(" (-{} owned)", line.owned_offset)
                            } else {
                                String::new()
                            };
                            v_summary!(
                                "      item {} x{}{}: buy {} / craft {} -> {}",
                                line.item_id,
                                line.quantity,
                                offset,
                                format_cost(line.unit_buy_cost),
                                format_cost(line.unit_craft_cost),
                                format_cost(line.line_cost)
                            );
                        }
                    }

                    if !comparison.unresolved_items.is_empty() {
                        v_summary!("   ⚠️ Data unavailable for items: {:?}", comparison.unresolved_items);
                    }
                }
            }
        }

        Command::Uses { item_id } => {
            let using = recipes.recipes_with_ingredient(item_id).await?;
            if using.is_empty() {
                v_summary!("🚫 No recipes use item {} as an ingredient", item_id);
            } else {
                v_summary!("🔍 {} recipes use item {}:", using.len(), item_id);
                for recipe in using {
                    v_summary!(
                        "   recipe {} -> item {} x{} ({})",
                        recipe.id,
                        recipe.output_item_id,
                        recipe.output_item_count,
                        recipe.disciplines.join(", ")
                    );
                }
            }
        }
    }

    Ok(())
}

fn print_node(node: &EnrichedTreeNode, indent: usize) {
    let marker = if node.is_base { "•" } else { "└" };
    v_summary!(
        "{}{} {} x{} ({}) sell {}",
        "  ".repeat(indent),
        marker,
        node.name,
        node.total_quantity,
        node.rarity,
        format_coins(node.sell_price)
    );
    for child in &node.children {
        print_node(child, indent + 1);
    }
}

fn collect_names(node: &EnrichedTreeNode) -> HashMap<u32, String> {
    let mut names = HashMap::new();
    fill_names(node, &mut names);
    names
}

fn fill_names(node: &EnrichedTreeNode, names: &mut HashMap<u32, String>) {
    names.insert(node.item_id, node.name.clone());
    for child in &node.children {
        fill_names(child, names);
    }
}

fn format_cost(cost: Option<i64>) -> String {
    match cost {
        Some(value) => format_coins(value),
        None => "unavailable".to_string(),
    }
}

/// Renders copper subunits as gold/silver/copper.
fn format_coins(copper: i64) -> String {
    let gold = copper / 10_000;
    let silver = (copper % 10_000) / 100;
    let copper = copper % 100;
    if gold > 0 {
        format!("{}g {}s {}c", gold, silver, copper)
    } else if silver > 0 {
        format!("{}s {}c", silver, copper)
    } else {
        format!("{}c", copper)
    }
}

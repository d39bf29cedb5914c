pub mod recipes;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::inventory::Inventory;
use crate::items::{ItemId, ItemRegistry};

pub use recipes::RecipeBook;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: BTreeMap<ItemId, u32>,
    pub output: ItemId,
    #[serde(default = "default_output_count")]
    pub output_count: u32,
}

fn default_output_count() -> u32 {
    1
}

/// How ingredient counts are compared against the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The inventory holds at least the required quantity of each ingredient.
    #[default]
    AtLeast,
    /// The inventory holds exactly the required quantity of each ingredient.
    Exact,
}

/// One unmet ingredient requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub item_id: ItemId,
    pub have: u32,
    pub need: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftOutcome {
    pub recipe_id: String,
    pub item_id: ItemId,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CraftError {
    UnknownRecipe(String),
    UnknownItem(ItemId),
    MissingMaterials(Vec<Shortfall>),
    /// The output did not fit; consumed inputs were restored.
    InventoryFull { item_id: ItemId },
}

impl std::fmt::Display for CraftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CraftError::UnknownRecipe(id) => write!(f, "Unknown recipe: {}", id),
            CraftError::UnknownItem(id) => write!(f, "Unknown item: {}", id),
            CraftError::MissingMaterials(missing) => {
                let parts: Vec<String> = missing
                    .iter()
                    .map(|s| format!("{} (have {}/{})", s.item_id, s.have, s.need))
                    .collect();
                write!(f, "Materials insufficient: {}", parts.join(", "))
            }
            CraftError::InventoryFull { item_id } => {
                write!(f, "Inventory full, cannot hold {}", item_id)
            }
        }
    }
}

impl std::error::Error for CraftError {}

/// Ingredients whose inventory count does not satisfy `mode`.
pub fn missing(inventory: &Inventory, recipe: &Recipe, mode: MatchMode) -> Vec<Shortfall> {
    recipe
        .ingredients
        .iter()
        .filter_map(|(item_id, &need)| {
            let have = inventory.count_of(item_id);
            let ok = match mode {
                MatchMode::AtLeast => have >= need,
                MatchMode::Exact => have == need,
            };
            (!ok).then(|| Shortfall {
                item_id: item_id.clone(),
                have,
                need,
            })
        })
        .collect()
}

pub fn can_craft(inventory: &Inventory, recipe: &Recipe, mode: MatchMode) -> bool {
    missing(inventory, recipe, mode).is_empty()
}

/// Consume the recipe's inputs and add its output as one transaction.
///
/// Either every ingredient drops by exactly its quantity and the output
/// rises by `output_count`, or the inventory is left untouched.
pub fn craft(
    inventory: &mut Inventory,
    items: &ItemRegistry,
    recipe: &Recipe,
    mode: MatchMode,
) -> Result<CraftOutcome, CraftError> {
    let shortfall = missing(inventory, recipe, mode);
    if !shortfall.is_empty() {
        debug!(recipe = %recipe.id, missing = shortfall.len(), "Craft rejected");
        return Err(CraftError::MissingMaterials(shortfall));
    }
    let output = items
        .stack(&recipe.output, recipe.output_count)
        .ok_or_else(|| CraftError::UnknownItem(recipe.output.clone()))?;

    let snapshot = inventory.clone();
    for (item_id, &qty) in &recipe.ingredients {
        inventory.remove_by_id(item_id, qty);
    }

    let remainder = inventory.add_item(output);
    if remainder > 0 {
        *inventory = snapshot;
        debug!(recipe = %recipe.id, "Craft rolled back, no room for output");
        return Err(CraftError::InventoryFull {
            item_id: recipe.output.clone(),
        });
    }

    info!(recipe = %recipe.id, output = %recipe.output, count = recipe.output_count, "Crafted");
    Ok(CraftOutcome {
        recipe_id: recipe.id.clone(),
        item_id: recipe.output.clone(),
        count: recipe.output_count,
    })
}

/// Look up a recipe by id and craft it.
pub fn craft_by_id(
    inventory: &mut Inventory,
    items: &ItemRegistry,
    book: &RecipeBook,
    recipe_id: &str,
    mode: MatchMode,
) -> Result<CraftOutcome, CraftError> {
    let recipe = book
        .get(recipe_id)
        .ok_or_else(|| CraftError::UnknownRecipe(recipe_id.to_string()))?;
    craft(inventory, items, recipe, mode)
}

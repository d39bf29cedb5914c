use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::crafting::Recipe;
use crate::items::ItemRegistry;

#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    recipes: BTreeMap<String, Recipe>,
}

#[derive(Deserialize)]
struct RecipeFile {
    #[serde(default)]
    recipes: Vec<Recipe>,
}

impl RecipeBook {
    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    pub fn insert(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.id.clone(), recipe);
    }

    /// Recipes sorted by id.
    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        self.extend_from_toml_str(&content)
            .map_err(|e| format!("{}: {}", path.display(), e))
    }

    /// Add or replace recipes from TOML `[[recipes]]` tables.
    pub fn extend_from_toml_str(&mut self, content: &str) -> Result<usize, String> {
        let file: RecipeFile = toml::from_str(content).map_err(|e| e.to_string())?;
        // Check the whole file before touching the book.
        if let Some(bad) = file
            .recipes
            .iter()
            .find(|r| r.ingredients.values().any(|&q| q == 0) || r.output_count == 0)
        {
            return Err(format!("recipe {} has a zero quantity", bad.id));
        }
        let n = file.recipes.len();
        for recipe in file.recipes {
            self.insert(recipe);
        }
        Ok(n)
    }

    /// Check every recipe refers to known items. Returns one message per problem.
    pub fn validate(&self, items: &ItemRegistry) -> Result<(), String> {
        let mut errors = Vec::new();
        for recipe in self.recipes.values() {
            if items.get(&recipe.output).is_none() {
                errors.push(format!("recipe {}: unknown output {}", recipe.id, recipe.output));
            }
            for item_id in recipe.ingredients.keys() {
                if items.get(item_id).is_none() {
                    errors.push(format!("recipe {}: unknown ingredient {}", recipe.id, item_id));
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }

    pub fn builtin() -> Self {
        let mut book = Self::default();
        let table: [(&str, &str, &[(&str, u32)], u32); 10] = [
            ("stone_axe", "Stone Axe", &[("wood", 2), ("stone", 3)], 1),
            ("stone_pickaxe", "Stone Pickaxe", &[("wood", 2), ("stone", 3), ("fiber", 1)], 1),
            ("spear", "Spear", &[("wood", 3), ("flint", 1), ("fiber", 2)], 1),
            ("rope", "Rope", &[("fiber", 3)], 1),
            ("torch", "Torch", &[("wood", 1), ("coal", 1)], 2),
            ("campfire", "Campfire", &[("wood", 5), ("stone", 4)], 1),
            ("cooked_fish", "Cooked Fish", &[("raw_fish", 1), ("coal", 1)], 1),
            ("berry_juice", "Berry Juice", &[("berries", 4)], 1),
            ("mushroom_stew", "Mushroom Stew", &[("mushroom", 3), ("berries", 1)], 1),
            ("fiber_tunic", "Fiber Tunic", &[("fiber", 8), ("rope", 2)], 1),
        ];
        for (id, name, ingredients, output_count) in table {
            book.insert(Recipe {
                id: id.to_string(),
                name: name.to_string(),
                ingredients: ingredients
                    .iter()
                    .map(|&(item, qty)| (item.to_string(), qty))
                    .collect(),
                output: id.to_string(),
                output_count,
            });
        }
        book
    }
}

//! Item definitions and the catalog of known items.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub type ItemId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Tool,
    Weapon,
    Clothing,
    Food,
    Drink,
    Resource,
    Misc,
}

impl ItemCategory {
    /// Default per-slot cap for items of this category.
    pub fn default_max_stack(self) -> u32 {
        match self {
            ItemCategory::Tool | ItemCategory::Weapon | ItemCategory::Clothing => 1,
            ItemCategory::Food => 20,
            ItemCategory::Resource => 50,
            ItemCategory::Drink | ItemCategory::Misc => 99,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ItemCategory,
    /// Overrides the category's default cap when set.
    #[serde(default)]
    pub max_stack: Option<u32>,
    #[serde(default)]
    pub durability: Option<u32>,
    #[serde(default)]
    pub nutrition: Option<f32>,
    #[serde(default)]
    pub hydration: Option<f32>,
    #[serde(default)]
    pub damage: Option<f32>,
    #[serde(default)]
    pub armor: Option<f32>,
}

impl ItemDef {
    fn new(id: &str, name: &str, category: ItemCategory) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            category,
            max_stack: None,
            durability: None,
            nutrition: None,
            hydration: None,
            damage: None,
            armor: None,
        }
    }

    fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn max_stack(&self) -> u32 {
        if self.durability.is_some() {
            return 1;
        }
        self.max_stack
            .unwrap_or_else(|| self.category.default_max_stack())
            .max(1)
    }

    pub fn stackable(&self) -> bool {
        self.max_stack() > 1
    }

    pub fn is_consumable(&self) -> bool {
        self.nutrition.is_some() || self.hydration.is_some()
    }
}

/// Remaining and maximum uses of a tool, weapon or garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durability {
    pub current: u32,
    pub max: u32,
}

/// The contents of one inventory slot.
///
/// Carries its own cap so the inventory can enforce `count <= max_stack`
/// without consulting the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id: ItemId,
    pub count: u32,
    pub max_stack: u32,
    pub stackable: bool,
    #[serde(default)]
    pub durability: Option<Durability>,
}

impl ItemStack {
    /// A fresh stack of `count` units, durability at max.
    pub fn new(def: &ItemDef, count: u32) -> Self {
        Self {
            item_id: def.id.clone(),
            count,
            max_stack: def.max_stack(),
            stackable: def.stackable(),
            durability: def.durability.map(|max| Durability { current: max, max }),
        }
    }

    /// Whether `other` can merge into this stack.
    pub fn is_compatible(&self, other: &ItemStack) -> bool {
        self.stackable && other.stackable && self.item_id == other.item_id
    }

    pub fn space(&self) -> u32 {
        self.max_stack.saturating_sub(self.count)
    }

    /// Same item, `count` units.
    pub fn with_count(&self, count: u32) -> Self {
        Self {
            count,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    items: BTreeMap<ItemId, ItemDef>,
}

#[derive(Deserialize)]
struct ItemFile {
    #[serde(default)]
    items: Vec<ItemDef>,
}

impl ItemRegistry {
    pub fn get(&self, id: &str) -> Option<&ItemDef> {
        self.items.get(id)
    }

    pub fn insert(&mut self, def: ItemDef) {
        self.items.insert(def.id.clone(), def);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemDef> {
        self.items.values()
    }

    /// A stack of `count` units of `id`, or `None` for unknown items.
    pub fn stack(&self, id: &str, count: u32) -> Option<ItemStack> {
        self.get(id).map(|def| ItemStack::new(def, count))
    }

    /// Add or replace definitions from a TOML file of `[[items]]` tables.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        self.extend_from_toml_str(&content)
            .map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn extend_from_toml_str(&mut self, content: &str) -> Result<usize, String> {
        let file: ItemFile = toml::from_str(content).map_err(|e| e.to_string())?;
        // Check the whole file before touching the registry.
        if file.items.iter().any(|def| def.id.is_empty()) {
            return Err("item id must not be empty".to_string());
        }
        let n = file.items.len();
        for def in file.items {
            self.insert(def);
        }
        Ok(n)
    }

    /// The built-in catalog: every harvestable resource plus craftable goods.
    pub fn builtin() -> Self {
        use ItemCategory::*;

        let mut registry = Self::default();
        for (id, name) in [
            ("wood", "Wood"),
            ("stone", "Stone"),
            ("fiber", "Plant Fiber"),
            ("sand", "Sand"),
            ("clay", "Clay"),
            ("coal", "Coal"),
            ("iron_ore", "Iron Ore"),
            ("flint", "Flint"),
        ] {
            registry.insert(ItemDef::new(id, name, Resource));
        }

        let mut berries = ItemDef::new("berries", "Berries", Food).describe("Tart wild berries.");
        berries.nutrition = Some(8.0);
        berries.hydration = Some(3.0);
        registry.insert(berries);

        let mut mushroom = ItemDef::new("mushroom", "Mushroom", Food);
        mushroom.nutrition = Some(6.0);
        registry.insert(mushroom);

        let mut raw_fish = ItemDef::new("raw_fish", "Raw Fish", Food);
        raw_fish.nutrition = Some(5.0);
        registry.insert(raw_fish);

        let mut cooked_fish = ItemDef::new("cooked_fish", "Cooked Fish", Food)
            .describe("Flaky and filling.");
        cooked_fish.nutrition = Some(25.0);
        registry.insert(cooked_fish);

        let mut stew = ItemDef::new("mushroom_stew", "Mushroom Stew", Food);
        stew.nutrition = Some(30.0);
        stew.hydration = Some(10.0);
        registry.insert(stew);

        let mut juice = ItemDef::new("berry_juice", "Berry Juice", Drink);
        juice.hydration = Some(30.0);
        juice.nutrition = Some(5.0);
        registry.insert(juice);

        let mut axe = ItemDef::new("stone_axe", "Stone Axe", Tool).describe("Chops wood faster.");
        axe.durability = Some(50);
        axe.damage = Some(4.0);
        registry.insert(axe);

        let mut pickaxe = ItemDef::new("stone_pickaxe", "Stone Pickaxe", Tool);
        pickaxe.durability = Some(50);
        pickaxe.damage = Some(3.0);
        registry.insert(pickaxe);

        let mut spear = ItemDef::new("spear", "Spear", Weapon);
        spear.durability = Some(40);
        spear.damage = Some(8.0);
        registry.insert(spear);

        let mut tunic = ItemDef::new("fiber_tunic", "Fiber Tunic", Clothing);
        tunic.durability = Some(100);
        tunic.armor = Some(2.0);
        registry.insert(tunic);

        registry.insert(ItemDef::new("rope", "Rope", Misc));
        registry.insert(ItemDef::new("torch", "Torch", Misc).describe("Lights the night."));
        registry.insert(ItemDef::new("campfire", "Campfire", Misc));

        registry
    }
}

use serde::{Deserialize, Serialize};

// === Enums ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerrainType {
    Grass,
    Water,
    Sand,
    Forest,
    Mountain,
    Cave,
    MushroomPatch,
}

impl TerrainType {
    pub const ALL: [TerrainType; 7] = [
        TerrainType::Grass,
        TerrainType::Water,
        TerrainType::Sand,
        TerrainType::Forest,
        TerrainType::Mountain,
        TerrainType::Cave,
        TerrainType::MushroomPatch,
    ];

    pub fn is_walkable(self) -> bool {
        !matches!(self, TerrainType::Water | TerrainType::Mountain)
    }

    /// Resource types that can be found on this terrain.
    pub fn resources(self) -> &'static [ResourceType] {
        match self {
            TerrainType::Grass => &[ResourceType::Fiber, ResourceType::Berries, ResourceType::Stone],
            TerrainType::Water => &[ResourceType::Fish],
            TerrainType::Sand => &[ResourceType::Sand, ResourceType::Clay, ResourceType::Flint],
            TerrainType::Forest => &[ResourceType::Wood, ResourceType::Berries, ResourceType::Fiber],
            TerrainType::Mountain => &[
                ResourceType::Stone,
                ResourceType::IronOre,
                ResourceType::Coal,
            ],
            TerrainType::Cave => &[ResourceType::Coal, ResourceType::IronOre, ResourceType::Stone],
            TerrainType::MushroomPatch => &[ResourceType::Mushroom, ResourceType::Fiber],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TerrainType::Grass => "Grass",
            TerrainType::Water => "Water",
            TerrainType::Sand => "Sand",
            TerrainType::Forest => "Forest",
            TerrainType::Mountain => "Mountain",
            TerrainType::Cave => "Cave",
            TerrainType::MushroomPatch => "Mushroom Patch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    Wood,
    Stone,
    Fiber,
    Berries,
    Mushroom,
    Fish,
    Sand,
    Clay,
    Coal,
    IronOre,
    Flint,
}

impl ResourceType {
    /// Item id granted when this resource is harvested.
    pub fn item_id(self) -> &'static str {
        match self {
            ResourceType::Wood => "wood",
            ResourceType::Stone => "stone",
            ResourceType::Fiber => "fiber",
            ResourceType::Berries => "berries",
            ResourceType::Mushroom => "mushroom",
            ResourceType::Fish => "raw_fish",
            ResourceType::Sand => "sand",
            ResourceType::Clay => "clay",
            ResourceType::Coal => "coal",
            ResourceType::IronOre => "iron_ore",
            ResourceType::Flint => "flint",
        }
    }
}

// === Coordinates ===

/// Integer tile index. Ordered row-major so node maps iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance between two tiles.
    pub fn distance(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl Ord for TileCoord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for TileCoord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// === Tile ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: TerrainType,
    pub walkable: bool,
    pub resources: Vec<ResourceType>,
    pub elevation: f32,
    pub moisture: f32,
}

impl Tile {
    pub fn new(terrain: TerrainType, elevation: f32, moisture: f32) -> Self {
        Self {
            terrain,
            walkable: terrain.is_walkable(),
            resources: terrain.resources().to_vec(),
            elevation,
            moisture,
        }
    }

    pub fn yields(&self, resource: ResourceType) -> bool {
        self.resources.contains(&resource)
    }
}

/// A depletable source of one resource type on one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub coord: TileCoord,
    pub resource: ResourceType,
    pub amount: u32,
}

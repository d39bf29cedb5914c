pub mod generation;
pub mod regeneration;
pub mod tile;

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::generation::WorldGenParams;
pub use regeneration::{RegenEvent, RegenPolicy, RegenQueue};
pub use tile::{ResourceNode, ResourceType, TerrainType, Tile, TileCoord};

/// Radius (in tiles) searched when a regeneration event fires.
pub const REGEN_SEARCH_RADIUS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub id: Uuid,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub tile_size: f32,
    /// Seconds of simulated time since generation.
    pub time: f64,
    pub generation_params: WorldGenParams,
    pub tiles: Vec<Tile>,
    #[serde(with = "node_list")]
    pub resources: BTreeMap<TileCoord, ResourceNode>,
    pub regeneration: RegenQueue,
    #[serde(skip)]
    pub regen_policy: RegenPolicy,
}

/// A node created by regeneration or the periodic spawner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnedResource {
    pub coord: TileCoord,
    pub resource: ResourceType,
    pub amount: u32,
}

impl World {
    pub fn seed(&self) -> u64 {
        self.generation_params.seed
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        if coord.x >= self.width || coord.y >= self.height {
            return None;
        }
        self.tiles.get((coord.y * self.width + coord.x) as usize)
    }

    pub fn node(&self, coord: TileCoord) -> Option<&ResourceNode> {
        self.resources.get(&coord)
    }

    pub fn node_count(&self) -> usize {
        self.resources.len()
    }

    pub fn pending_regeneration(&self) -> usize {
        self.regeneration.len()
    }

    /// Size of the world in world units.
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    /// Convert continuous world coordinates into a tile index, if in bounds.
    pub fn tile_coord(&self, world_x: f32, world_y: f32) -> Option<TileCoord> {
        if !world_x.is_finite() || !world_y.is_finite() || world_x < 0.0 || world_y < 0.0 {
            return None;
        }
        let x = (world_x / self.tile_size).floor() as u32;
        let y = (world_y / self.tile_size).floor() as u32;
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(TileCoord::new(x, y))
    }

    /// Centre of a tile in world coordinates.
    pub fn tile_center(&self, coord: TileCoord) -> Vec2 {
        Vec2::new(
            (coord.x as f32 + 0.5) * self.tile_size,
            (coord.y as f32 + 0.5) * self.tile_size,
        )
    }

    pub fn is_walkable(&self, world_x: f32, world_y: f32) -> bool {
        self.tile_coord(world_x, world_y)
            .and_then(|c| self.tile(c))
            .is_some_and(|t| t.walkable)
    }

    /// Harvest one unit from the node under the given world position.
    pub fn harvest(
        &mut self,
        world_x: f32,
        world_y: f32,
        rng: &mut impl Rng,
    ) -> Option<ResourceType> {
        let coord = self.tile_coord(world_x, world_y)?;
        self.harvest_tile(coord, rng)
    }

    /// Decrement the node at `coord`, removing it at zero.
    ///
    /// A removed node schedules a delayed regeneration attempt with
    /// probability `regen_policy.chance`.
    pub fn harvest_tile(&mut self, coord: TileCoord, rng: &mut impl Rng) -> Option<ResourceType> {
        let node = self.resources.get_mut(&coord)?;
        let resource = node.resource;
        node.amount = node.amount.saturating_sub(1);

        if node.amount == 0 {
            self.resources.remove(&coord);
            let policy = self.regen_policy;
            if rng.r#gen::<f32>() < policy.chance {
                let delay = if policy.delay_max_secs > policy.delay_min_secs {
                    rng.gen_range(policy.delay_min_secs..policy.delay_max_secs)
                } else {
                    policy.delay_min_secs
                };
                let due_at = self.time + delay as f64;
                debug!(x = coord.x, y = coord.y, ?resource, due_at, "Regeneration scheduled");
                self.regeneration.schedule(RegenEvent {
                    due_at,
                    origin: coord,
                    resource,
                });
            }
        }

        Some(resource)
    }

    /// Seed a node on one uniformly random tile.
    ///
    /// Returns `None` without retrying if the chosen tile is unwalkable or
    /// already holds a node.
    pub fn spawn_random_resource(&mut self, rng: &mut impl Rng) -> Option<SpawnedResource> {
        let coord = TileCoord::new(rng.gen_range(0..self.width), rng.gen_range(0..self.height));
        let tile = self.tile(coord)?;
        if !tile.walkable || self.resources.contains_key(&coord) {
            return None;
        }
        let resource = *tile.resources.choose(rng)?;
        let amount = self.roll_amount(rng);
        self.place_node(coord, resource, amount);
        Some(SpawnedResource {
            coord,
            resource,
            amount,
        })
    }

    /// Advance world time and fire due regeneration events.
    pub fn update(&mut self, dt: f32, rng: &mut impl Rng) -> Vec<SpawnedResource> {
        self.time += dt as f64;
        let due = self.regeneration.pop_due(self.time);
        let mut spawned = Vec::new();
        for event in due {
            match self.regenerate_near(event.origin, event.resource, rng) {
                Some(s) => spawned.push(s),
                None => debug!(
                    x = event.origin.x,
                    y = event.origin.y,
                    resource = ?event.resource,
                    "No tile available for regeneration"
                ),
            }
        }
        spawned
    }

    /// Drop every pending regeneration event.
    pub fn cancel_regeneration(&mut self) -> usize {
        self.regeneration.cancel_all()
    }

    /// Remove every node and every pending regeneration.
    pub fn clear_resources(&mut self) {
        self.resources.clear();
        self.regeneration.cancel_all();
    }

    /// Walkable tile centre closest to the middle of the map.
    pub fn find_spawn_point(&self) -> Option<Vec2> {
        let center = TileCoord::new(self.width / 2, self.height / 2);
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| TileCoord::new(x, y)))
            .filter(|&c| self.tile(c).is_some_and(|t| t.walkable))
            .min_by_key(|&c| {
                let dx = c.x.abs_diff(center.x) as u64;
                let dy = c.y.abs_diff(center.y) as u64;
                (dx * dx + dy * dy, c)
            })
            .map(|c| self.tile_center(c))
    }

    pub fn terrain_counts(&self) -> HashMap<TerrainType, u32> {
        let mut counts = HashMap::new();
        for tile in &self.tiles {
            *counts.entry(tile.terrain).or_insert(0) += 1;
        }
        counts
    }

    fn regenerate_near(
        &mut self,
        origin: TileCoord,
        resource: ResourceType,
        rng: &mut impl Rng,
    ) -> Option<SpawnedResource> {
        let r = REGEN_SEARCH_RADIUS;
        let min_x = origin.x.saturating_sub(r);
        let min_y = origin.y.saturating_sub(r);
        let max_x = (origin.x + r).min(self.width.saturating_sub(1));
        let max_y = (origin.y + r).min(self.height.saturating_sub(1));

        let candidates: Vec<TileCoord> = (min_y..=max_y)
            .flat_map(|y| (min_x..=max_x).map(move |x| TileCoord::new(x, y)))
            .filter(|c| !self.resources.contains_key(c))
            .filter(|&c| {
                self.tile(c)
                    .is_some_and(|t| t.walkable && t.yields(resource))
            })
            .collect();

        let nearest = candidates.iter().map(|c| c.distance(origin)).min()?;
        let closest: Vec<TileCoord> = candidates
            .into_iter()
            .filter(|c| c.distance(origin) == nearest)
            .collect();
        let coord = *closest.choose(rng)?;
        let amount = self.roll_amount(rng);
        self.place_node(coord, resource, amount);
        debug!(x = coord.x, y = coord.y, ?resource, amount, "Resource regenerated");
        Some(SpawnedResource {
            coord,
            resource,
            amount,
        })
    }

    fn roll_amount(&self, rng: &mut impl Rng) -> u32 {
        let min = self.generation_params.min_initial_amount.max(1);
        let max = self.generation_params.max_initial_amount.max(min);
        rng.gen_range(min..=max)
    }

    fn place_node(&mut self, coord: TileCoord, resource: ResourceType, amount: u32) {
        self.resources.insert(
            coord,
            ResourceNode {
                coord,
                resource,
                amount,
            },
        );
    }
}

/// Serializes the node map as a plain list of nodes; each node carries its own coordinate.
mod node_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::{ResourceNode, TileCoord};

    pub fn serialize<S>(map: &BTreeMap<TileCoord, ResourceNode>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_seq(map.values())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<BTreeMap<TileCoord, ResourceNode>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nodes = Vec::<ResourceNode>::deserialize(d)?;
        Ok(nodes.into_iter().map(|n| (n.coord, n)).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    /// A world where every tile is `terrain`, with no nodes.
    pub(crate) fn uniform_world(width: u32, height: u32, terrain: TerrainType) -> World {
        World {
            id: Uuid::nil(),
            name: "test".to_string(),
            width,
            height,
            tile_size: 10.0,
            time: 0.0,
            generation_params: WorldGenParams::new(1, width.max(8), height.max(8)),
            tiles: (0..width * height).map(|_| Tile::new(terrain, 0.0, 0.0)).collect(),
            resources: BTreeMap::new(),
            regeneration: RegenQueue::default(),
            regen_policy: RegenPolicy::default(),
        }
    }

    fn set_terrain(world: &mut World, coord: TileCoord, terrain: TerrainType) {
        let idx = (coord.y * world.width + coord.x) as usize;
        world.tiles[idx] = Tile::new(terrain, 0.0, 0.0);
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn tile_coord_floors_and_bounds() {
        let world = uniform_world(4, 3, TerrainType::Grass);
        assert_eq!(world.tile_coord(0.0, 0.0), Some(TileCoord::new(0, 0)));
        assert_eq!(world.tile_coord(19.9, 29.9), Some(TileCoord::new(1, 2)));
        assert_eq!(world.tile_coord(40.0, 0.0), None);
        assert_eq!(world.tile_coord(-0.1, 5.0), None);
        assert_eq!(world.tile_coord(f32::NAN, 5.0), None);
    }

    #[test]
    fn walkability_respects_terrain_and_bounds() {
        let mut world = uniform_world(4, 4, TerrainType::Grass);
        set_terrain(&mut world, TileCoord::new(1, 1), TerrainType::Water);
        assert!(world.is_walkable(5.0, 5.0));
        assert!(!world.is_walkable(15.0, 15.0));
        assert!(!world.is_walkable(-1.0, 5.0));
        assert!(!world.is_walkable(5.0, 45.0));
    }

    #[test]
    fn harvest_decrements_by_one_and_removes_at_zero() {
        let mut world = uniform_world(4, 4, TerrainType::Forest);
        world.regen_policy.chance = 0.0;
        let coord = TileCoord::new(2, 2);
        world.place_node(coord, ResourceType::Wood, 3);
        let mut rng = rng();

        assert_eq!(world.harvest(25.0, 25.0, &mut rng), Some(ResourceType::Wood));
        assert_eq!(world.node(coord).map(|n| n.amount), Some(2));
        assert_eq!(world.harvest(25.0, 25.0, &mut rng), Some(ResourceType::Wood));
        assert_eq!(world.harvest(25.0, 25.0, &mut rng), Some(ResourceType::Wood));
        assert!(world.node(coord).is_none());
        assert_eq!(world.harvest(25.0, 25.0, &mut rng), None);
        assert_eq!(world.harvest(25.0, 25.0, &mut rng), None);
    }

    #[test]
    fn harvest_empty_or_out_of_bounds_returns_none() {
        let mut world = uniform_world(4, 4, TerrainType::Grass);
        let mut rng = rng();
        assert_eq!(world.harvest(5.0, 5.0, &mut rng), None);
        assert_eq!(world.harvest(500.0, 5.0, &mut rng), None);
    }

    #[test]
    fn depletion_schedules_regeneration_within_delay_window() {
        let mut world = uniform_world(8, 8, TerrainType::Forest);
        world.regen_policy.chance = 1.0;
        let coord = TileCoord::new(4, 4);
        world.place_node(coord, ResourceType::Wood, 1);
        let mut rng = rng();

        world.harvest_tile(coord, &mut rng);
        assert_eq!(world.pending_regeneration(), 1);
        let due = world.regeneration.next_due().unwrap();
        assert!((10.0..40.0).contains(&due), "due at {}", due);
    }

    #[test]
    fn regeneration_fires_after_delay_near_origin() {
        let mut world = uniform_world(8, 8, TerrainType::Forest);
        world.regen_policy.chance = 1.0;
        let coord = TileCoord::new(4, 4);
        world.place_node(coord, ResourceType::Wood, 1);
        let mut rng = rng();
        world.harvest_tile(coord, &mut rng);

        assert!(world.update(5.0, &mut rng).is_empty());
        let spawned = world.update(40.0, &mut rng);
        assert_eq!(spawned.len(), 1);
        let s = spawned[0];
        assert_eq!(s.resource, ResourceType::Wood);
        // The origin itself is empty and nearest.
        assert_eq!(s.coord, coord);
        assert!((1..=5).contains(&s.amount));
        assert_eq!(world.pending_regeneration(), 0);
    }

    #[test]
    fn regeneration_skips_tiles_that_cannot_yield_resource() {
        let mut world = uniform_world(3, 3, TerrainType::Sand);
        world.regen_policy.chance = 1.0;
        let coord = TileCoord::new(1, 1);
        world.place_node(coord, ResourceType::Wood, 1);
        let mut rng = rng();
        world.harvest_tile(coord, &mut rng);

        let spawned = world.update(100.0, &mut rng);
        assert!(spawned.is_empty());
        assert_eq!(world.node_count(), 0);
    }

    #[test]
    fn cancelled_regeneration_never_fires() {
        let mut world = uniform_world(8, 8, TerrainType::Forest);
        world.regen_policy.chance = 1.0;
        let coord = TileCoord::new(4, 4);
        world.place_node(coord, ResourceType::Wood, 1);
        let mut rng = rng();
        world.harvest_tile(coord, &mut rng);

        world.clear_resources();
        assert!(world.update(100.0, &mut rng).is_empty());
        assert_eq!(world.node_count(), 0);
    }

    #[test]
    fn spawn_random_resource_on_occupied_or_blocked_tile_returns_none() {
        let mut world = uniform_world(1, 1, TerrainType::Grass);
        world.place_node(TileCoord::new(0, 0), ResourceType::Stone, 2);
        let mut rng = rng();
        assert!(world.spawn_random_resource(&mut rng).is_none());

        let mut water = uniform_world(2, 2, TerrainType::Water);
        for _ in 0..10 {
            assert!(water.spawn_random_resource(&mut rng).is_none());
        }
    }

    #[test]
    fn spawn_random_resource_uses_terrain_list() {
        let mut world = uniform_world(1, 1, TerrainType::MushroomPatch);
        let mut rng = rng();
        let spawned = world.spawn_random_resource(&mut rng).unwrap();
        assert!(TerrainType::MushroomPatch.resources().contains(&spawned.resource));
        assert_eq!(world.node(spawned.coord).unwrap().amount, spawned.amount);
    }

    #[test]
    fn spawn_point_is_walkable_and_nearest_center() {
        let mut world = uniform_world(5, 5, TerrainType::Water);
        set_terrain(&mut world, TileCoord::new(0, 0), TerrainType::Grass);
        set_terrain(&mut world, TileCoord::new(3, 2), TerrainType::Grass);
        let spawn = world.find_spawn_point().unwrap();
        assert_eq!(world.tile_coord(spawn.x, spawn.y), Some(TileCoord::new(3, 2)));

        let all_water = uniform_world(3, 3, TerrainType::Water);
        assert!(all_water.find_spawn_point().is_none());
    }

    #[test]
    fn node_map_serializes_as_list() {
        let mut world = uniform_world(2, 2, TerrainType::Grass);
        world.place_node(TileCoord::new(1, 0), ResourceType::Fiber, 4);
        let json = serde_json::to_value(&world).unwrap();
        let nodes = json["resources"].as_array().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0]["amount"], 4);

        let restored: World = serde_json::from_value(json).unwrap();
        assert_eq!(restored.resources, world.resources);
    }
}

use std::collections::BTreeMap;

use noise::{NoiseFn, Perlin};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::info;
use uuid::Uuid;

use crate::config::generation::WorldGenParams;
use crate::world::tile::*;
use crate::world::{RegenPolicy, RegenQueue, World};

/// Elevation below which a tile is water.
pub const WATER_LEVEL: f32 = -0.3;
/// Elevation below which a tile is sand.
pub const SAND_LEVEL: f32 = -0.1;
/// Elevation above which a tile is mountain.
pub const MOUNTAIN_LEVEL: f32 = 0.3;
/// Moisture above which lowland is forest.
pub const FOREST_MOISTURE: f32 = 0.2;
/// Moisture above which a mountain tile opens into a cave.
pub const CAVE_MOISTURE: f32 = 0.45;
/// Moisture above which a forest tile grows mushrooms.
pub const MUSHROOM_MOISTURE: f32 = 0.55;

/// Generate a new world from the given parameters.
///
/// If `params.seed` is 0, a random seed is chosen. The actual seed used
/// is stored in the returned World's `generation_params` for reproducibility.
pub fn generate_world(params: &WorldGenParams) -> World {
    let seed = if params.seed == 0 {
        rand::thread_rng().r#gen::<u64>().max(1)
    } else {
        params.seed
    };
    let resolved_params = WorldGenParams {
        seed,
        ..params.clone()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let tiles = generate_tiles(&resolved_params);
    let resources = scatter_resources(&tiles, &resolved_params, &mut rng);
    let id = Uuid::from_bytes(rng.r#gen());

    info!(
        seed,
        width = params.width,
        height = params.height,
        nodes = resources.len(),
        "World generated"
    );

    World {
        id,
        name: format!("World-{}", seed),
        width: params.width,
        height: params.height,
        tile_size: params.tile_size,
        time: 0.0,
        generation_params: resolved_params,
        tiles,
        resources,
        regeneration: RegenQueue::default(),
        regen_policy: RegenPolicy::default(),
    }
}

/// Map an (elevation, moisture) sample to a terrain type.
pub fn classify(elevation: f32, moisture: f32) -> TerrainType {
    if elevation < WATER_LEVEL {
        TerrainType::Water
    } else if elevation < SAND_LEVEL {
        TerrainType::Sand
    } else if elevation > MOUNTAIN_LEVEL {
        if moisture > CAVE_MOISTURE {
            TerrainType::Cave
        } else {
            TerrainType::Mountain
        }
    } else if moisture > FOREST_MOISTURE {
        if moisture > MUSHROOM_MOISTURE {
            TerrainType::MushroomPatch
        } else {
            TerrainType::Forest
        }
    } else {
        TerrainType::Grass
    }
}

/// Print a summary of the generated world.
pub fn print_world_summary(world: &World) {
    println!("=== World Summary ===");
    println!("Name: {}", world.name);
    println!("Size: {}x{} (tile size {})", world.width, world.height, world.tile_size);
    println!("Seed: {}", world.seed());

    let total = world.tiles.len().max(1) as f32;
    let mut terrain_sorted: Vec<_> = world.terrain_counts().into_iter().collect();
    terrain_sorted.sort_by_key(|&(terrain, _)| terrain.name());
    println!("\nTerrain:");
    for (terrain, count) in &terrain_sorted {
        let pct = *count as f32 / total * 100.0;
        println!("  {:<16} {:>6} ({:.1}%)", terrain.name(), count, pct);
    }

    let mut resource_totals: BTreeMap<ResourceType, (u32, u32)> = BTreeMap::new();
    for node in world.resources.values() {
        let entry = resource_totals.entry(node.resource).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += node.amount;
    }
    if !resource_totals.is_empty() {
        println!("\nResources:");
        for (resource, (count, total)) in &resource_totals {
            println!(
                "  {:<12} {:>5} nodes, {} total",
                format!("{:?}", resource),
                count,
                total
            );
        }
    }
}

// --- Internal generation functions ---

/// Perlin takes a 32-bit seed; fold the high half in so every bit of the seed counts.
fn noise_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

fn generate_tiles(params: &WorldGenParams) -> Vec<Tile> {
    let elevation_noise = Perlin::new(noise_seed(params.seed));
    let moisture_noise = Perlin::new(noise_seed(params.seed.wrapping_add(1)));
    let width = params.width;

    // Noise is pure, so tiles can be sampled in any order.
    (0..params.width * params.height)
        .into_par_iter()
        .map(|i| {
            // Sample at tile centres: Perlin is zero on integer lattice points.
            let x = (i % width) as f64 + 0.5;
            let y = (i / width) as f64 + 0.5;
            let elevation = sample(&elevation_noise, x, y, params.elevation_scale);
            let moisture = sample(&moisture_noise, x, y, params.moisture_scale);
            Tile::new(classify(elevation, moisture), elevation, moisture)
        })
        .collect()
}

fn sample(noise: &Perlin, x: f64, y: f64, scale: f64) -> f32 {
    (noise.get([x * scale, y * scale]) as f32).clamp(-1.0, 1.0)
}

fn scatter_resources(
    tiles: &[Tile],
    params: &WorldGenParams,
    rng: &mut impl Rng,
) -> BTreeMap<TileCoord, ResourceNode> {
    let mut nodes = BTreeMap::new();
    for (i, tile) in tiles.iter().enumerate() {
        // Roll for every tile so the RNG stream does not depend on terrain.
        let roll = rng.r#gen::<f32>();
        if roll >= params.resource_chance {
            continue;
        }
        let Some(&resource) = tile.resources.choose(rng) else {
            continue;
        };
        let amount = rng.gen_range(params.min_initial_amount..=params.max_initial_amount);
        let coord = TileCoord::new(i as u32 % params.width, i as u32 / params.width);
        nodes.insert(
            coord,
            ResourceNode {
                coord,
                resource,
                amount,
            },
        );
    }
    nodes
}

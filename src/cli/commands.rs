use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::generation::WorldGenParams;
use crate::config::simulation::SimulationConfig;
use crate::crafting::{self, RecipeBook};
use crate::items::ItemRegistry;
use crate::persistence::{self, SaveError, SaveFile};
use crate::simulation::{Game, GameEvent, parse_action};
use crate::world::generation::print_world_summary;
use crate::world::{TileCoord, World};

/// Steps between milestone log lines.
const MILESTONE_TICKS: u64 = 1800;

/// Item and recipe catalogs: the built-in set plus optional TOML extensions.
pub fn load_catalog(
    items_path: Option<&str>,
    recipes_path: Option<&str>,
) -> Result<(ItemRegistry, RecipeBook), String> {
    let mut items = ItemRegistry::builtin();
    if let Some(path) = items_path {
        let n = items.extend_from_file(Path::new(path))?;
        eprintln!("Loaded {} item(s) from {}", n, path);
    }
    let mut recipes = RecipeBook::builtin();
    if let Some(path) = recipes_path {
        let n = recipes.extend_from_file(Path::new(path))?;
        eprintln!("Loaded {} recipe(s) from {}", n, path);
    }
    recipes.validate(&items)?;
    Ok((items, recipes))
}

/// Generate a world, place the player and write the first save.
pub fn generate(
    config: &SimulationConfig,
    params: &WorldGenParams,
    items: ItemRegistry,
    recipes: RecipeBook,
    output: &Path,
) -> Result<PathBuf, String> {
    let game = Game::new_game(params, config.clone(), items, recipes).map_err(|e| e.to_string())?;
    print_world_summary(&game.world);
    persistence::save_game(&game, output, config.format())
        .map_err(|e| format!("Cannot save game: {}", e))
}

/// Load the requested save, or the newest readable one in the save directory.
fn load_game_save(config: &SimulationConfig, save_path: Option<&str>) -> Result<SaveFile, String> {
    match save_path {
        Some(path) => {
            eprintln!("Loading save from {}", path);
            persistence::load_save(Path::new(path)).map_err(|e| format!("Failed to load save: {}", e))
        }
        None => {
            eprintln!("Loading latest save from {}", config.save_directory);
            persistence::load_latest_valid_save(Path::new(&config.save_directory))
                .map_err(|e| format!("Failed to load save: {}", e))
        }
    }
}

fn autosave(game: &Game, config: &SimulationConfig) -> Result<PathBuf, SaveError> {
    let dir = Path::new(&config.save_directory);
    let path = persistence::save_game(game, dir, config.format())?;
    let deleted = persistence::prune_saves(dir, config.max_saves as usize)?;
    if !deleted.is_empty() {
        info!(count = deleted.len(), "Pruned old saves");
    }
    Ok(path)
}

fn print_events(events: &[GameEvent]) {
    for event in events {
        println!("{}", event.describe());
    }
}

/// Run the game in real time: fixed-rate stepping, stdin input, periodic autosave.
///
/// Stops on ctrl-c, on `quit`, at end of input, or after `max_ticks` steps, and
/// writes a final save.
pub async fn run_simulation(
    config: &SimulationConfig,
    save_path: Option<&str>,
    max_ticks: Option<u64>,
    items: ItemRegistry,
    recipes: RecipeBook,
) -> Result<(), String> {
    // 1. Load game
    let save = load_game_save(config, save_path)?;
    let mut game = save.into_game(items, recipes, config.clone());
    eprintln!(
        "Game loaded: {}x{} world, tick {}, day {}, {:?}",
        game.world.width,
        game.world.height,
        game.tick,
        game.clock.day(),
        game.clock.time_of_day()
    );

    // 2. Read input lines on a separate task
    let (tx, mut rx) = mpsc::channel::<String>(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    let mut input_open = true;

    // 3. Set up shutdown signal
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // 4. Run frame loop
    let frame = Duration::from_secs_f32(config.step_secs());
    let mut interval = tokio::time::interval(frame);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let start_tick = game.tick;
    let mut last_frame = Instant::now();
    let mut died_announced = game.player.is_dead();

    eprintln!(
        "Simulation running ({}Hz, autosave every {}s). Type keys and press enter; 'quit' to stop.",
        config.tick_rate_hz, config.autosave_interval_secs
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                eprintln!("\nShutdown signal received");
                break;
            }
            line = rx.recv(), if input_open => {
                let Some(line) = line else {
                    input_open = false;
                    continue;
                };
                if !handle_line(&mut game, config, line.trim()) {
                    break;
                }
            }
            _ = interval.tick() => {
                let now = Instant::now();
                let frame_dt = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                let result = game.advance(frame_dt);
                print_events(&result.events);

                if result.autosave_due {
                    if let Err(e) = autosave(&game, config) {
                        warn!(error = %e, "Autosave failed");
                    }
                }

                if result.steps > 0 && game.tick / MILESTONE_TICKS != (game.tick - result.steps as u64) / MILESTONE_TICKS {
                    let stats = game.statistics();
                    info!(
                        tick = stats.tick,
                        day = stats.day,
                        time_of_day = ?stats.time_of_day,
                        weather = stats.weather.name(),
                        nodes = stats.node_count,
                        pending_regen = stats.pending_regenerations,
                        health = stats.health,
                        hunger = stats.hunger,
                        thirst = stats.thirst,
                        "Milestone"
                    );
                }

                if game.player.is_dead() && !died_announced {
                    died_announced = true;
                    println!("Game over. Type 'reset' to start again or 'quit' to stop.");
                }
                if !game.player.is_dead() {
                    died_announced = false;
                }

                if max_ticks.is_some_and(|n| game.tick - start_tick >= n) {
                    eprintln!("Reached {} ticks", game.tick - start_tick);
                    break;
                }
            }
        }
    }

    // Graceful shutdown: save final state
    eprintln!("Saving game...");
    match autosave(&game, config) {
        Ok(path) => eprintln!("Game saved: {}", path.display()),
        Err(e) => eprintln!("Warning: final save failed: {}", e),
    }

    eprintln!("Simulation stopped at tick {}", game.tick);
    Ok(())
}

/// Handle one input line. Returns false when the loop should stop.
fn handle_line(game: &mut Game, config: &SimulationConfig, line: &str) -> bool {
    match line {
        "" => {}
        "quit" | "exit" => return false,
        "save" => match autosave(game, config) {
            Ok(path) => println!("Saved to {}", path.display()),
            Err(e) => println!("Save failed: {}", e),
        },
        "status" => print_player(game),
        "inv" => print_inventory(game),
        "reset" => match game.restart() {
            Ok(cancelled) => println!("New world generated ({} pending regrowths dropped)", cancelled),
            Err(e) => println!("{}", e),
        },
        _ => match parse_action(line).and_then(|action| game.apply(action)) {
            Ok(events) => print_events(&events),
            Err(e) => {
                // The same failure is queued as an event for the next frame.
                game.drain_events();
                println!("{}", e);
            }
        },
    }
    true
}

/// Inspect the newest save: a tile, the world summary, the player or the inventory.
pub fn inspect(
    config: &SimulationConfig,
    tile: Option<TileCoord>,
    show_world: bool,
    show_player: bool,
    show_inventory: bool,
    items: ItemRegistry,
    recipes: RecipeBook,
) -> Result<(), String> {
    let save = persistence::load_latest_valid_save(Path::new(&config.save_directory))
        .map_err(|e| format!("Failed to load save: {}", e))?;
    let game = save.into_game(items, recipes, config.clone());

    if tile.is_none() && !show_world && !show_player && !show_inventory {
        return Err("Specify --tile X,Y, --world, --player or --inventory".to_string());
    }
    if let Some(coord) = tile {
        inspect_tile(&game.world, coord)?;
    }
    if show_world {
        inspect_world(&game);
    }
    if show_player {
        print_player(&game);
    }
    if show_inventory {
        print_inventory(&game);
    }
    Ok(())
}

/// Parse `X,Y` into a tile coordinate.
pub fn parse_tile_coord(s: &str) -> Result<TileCoord, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("Expected X,Y but got '{}'", s))?;
    let x = x.trim().parse::<u32>().map_err(|e| format!("Bad X '{}': {}", x, e))?;
    let y = y.trim().parse::<u32>().map_err(|e| format!("Bad Y '{}': {}", y, e))?;
    Ok(TileCoord::new(x, y))
}

fn inspect_tile(world: &World, coord: TileCoord) -> Result<(), String> {
    let tile = world.tile(coord).ok_or_else(|| {
        format!(
            "Tile ({}, {}) not found (world is {}x{})",
            coord.x, coord.y, world.width, world.height
        )
    })?;

    println!("=== Tile ({}, {}) ===", coord.x, coord.y);
    println!("  Terrain: {}", tile.terrain.name());
    println!("  Walkable: {}", tile.walkable);
    println!("  Elevation: {:.3}", tile.elevation);
    println!("  Moisture: {:.3}", tile.moisture);
    println!("  Yields: {:?}", tile.resources);
    match world.node(coord) {
        Some(node) => println!("  Node: {:?} x{}", node.resource, node.amount),
        None => println!("  Node: (none)"),
    }
    let pending: Vec<_> = world
        .regeneration
        .iter()
        .filter(|e| e.origin == coord)
        .collect();
    for event in pending {
        println!("  Regrowth of {:?} due at {:.1}s", event.resource, event.due_at);
    }
    Ok(())
}

fn inspect_world(game: &Game) {
    let world = &game.world;
    let stats = game.statistics();
    println!("=== World: {} ===", world.name);
    println!("ID: {}", world.id);
    println!("Seed: {}", world.seed());
    println!("Size: {}x{} tiles ({} units each)", world.width, world.height, world.tile_size);
    println!("Tick: {}", stats.tick);
    println!("Day {}, {:?}, {}", stats.day, stats.time_of_day, stats.weather.name());
    println!("Resource nodes: {}", stats.node_count);
    println!("Pending regrowth: {}", stats.pending_regenerations);
    println!("Terrain diversity: {:.3}", stats.terrain_diversity);
    println!();

    println!("--- Terrain Distribution ---");
    let n = world.tiles.len().max(1) as f64;
    let mut sorted: Vec<_> = world.terrain_counts().into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    for (terrain, count) in &sorted {
        println!("  {}: {} ({:.1}%)", terrain.name(), count, *count as f64 / n * 100.0);
    }
}

fn print_player(game: &Game) {
    let p = &game.player;
    println!("=== Player ===");
    println!("  Position: ({:.1}, {:.1})", p.position.x, p.position.y);
    println!("  Health: {:.1}", p.vitals.health);
    println!("  Hunger: {:.1}", p.vitals.hunger);
    println!("  Thirst: {:.1}", p.vitals.thirst);
    println!("  Effects: {:?}", p.effects);
    println!(
        "  Resist: hunger {}, thirst {}",
        p.skills.hunger_resist, p.skills.thirst_resist
    );
}

fn print_inventory(game: &Game) {
    let inv = &game.inventory;
    println!(
        "=== Inventory ({}/{} slots) ===",
        inv.used_slots(),
        inv.capacity()
    );
    for (i, slot) in inv.slots().iter().enumerate() {
        let Some(stack) = slot else { continue };
        let marker = if i == inv.selected_index() { ">" } else { " " };
        match &stack.durability {
            Some(d) => println!("{} {:>2}: {} ({}/{})", marker, i + 1, stack.item_id, d.current, d.max),
            None => println!("{} {:>2}: {} x{}", marker, i + 1, stack.item_id, stack.count),
        }
    }
}

/// Print every recipe, marking those the newest save's inventory can craft.
pub fn list_recipes(config: &SimulationConfig, items: &ItemRegistry, recipes: &RecipeBook) {
    let inventory = persistence::load_latest_valid_save(Path::new(&config.save_directory))
        .ok()
        .map(|save| save.inventory);
    let mode = config.match_mode();

    for recipe in recipes.iter() {
        let ingredients: Vec<String> = recipe
            .ingredients
            .iter()
            .map(|(id, qty)| {
                let name = items.get(id).map_or(id.as_str(), |d| d.name.as_str());
                format!("{} x{}", name, qty)
            })
            .collect();
        let craftable = match &inventory {
            Some(inv) if crafting::can_craft(inv, recipe, mode) => "*",
            _ => " ",
        };
        println!(
            "{} {:<16} {} x{} <- {}",
            craftable,
            recipe.id,
            recipe.name,
            recipe.output_count,
            ingredients.join(", ")
        );
    }
    println!("\n{} recipe(s)", recipes.len());
}

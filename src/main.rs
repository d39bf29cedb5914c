use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use survivalsim::cli::commands;
use survivalsim::config::generation::WorldGenParams;
use survivalsim::config::simulation::SimulationConfig;
use survivalsim::persistence;
use survivalsim::world::generation::print_world_summary;

#[derive(Parser)]
#[command(name = "survivalsim")]
#[command(about = "A tile-based survival simulation with gathering, crafting and a day/night cycle")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Extra item definitions (TOML)
    #[arg(long)]
    items: Option<String>,

    /// Extra recipes (TOML)
    #[arg(long)]
    recipes: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new world and write the initial save
    Generate {
        /// Path to world generation config file
        #[arg(short, long, default_value = "worldgen.toml")]
        worldgen: String,

        /// Output save directory (defaults to the configured save directory)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run the game loop, reading actions from stdin
    Run {
        /// Path to a specific save to load
        #[arg(short, long)]
        save: Option<String>,

        /// Stop after this many simulation steps
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Inspect the latest save
    Inspect {
        /// Tile to inspect, as X,Y
        #[arg(short, long, value_parser = commands::parse_tile_coord)]
        tile: Option<survivalsim::world::TileCoord>,

        /// Show world-level summary statistics
        #[arg(long)]
        world: bool,

        /// Show player vitals and effects
        #[arg(long)]
        player: bool,

        /// Show inventory contents
        #[arg(long)]
        inventory: bool,
    },

    /// Manage save files
    Saves {
        #[command(subcommand)]
        action: SaveAction,
    },

    /// List known recipes
    Recipes,
}

#[derive(Subcommand)]
enum SaveAction {
    /// List available saves
    List {
        /// Save directory (defaults to the configured save directory)
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Load and summarize a save file
    Restore {
        /// Path to the save file
        file: String,
    },
}

/// Load the config file, or fall back to defaults when it does not exist.
fn load_config(path: &str) -> SimulationConfig {
    let path = Path::new(path);
    if !path.exists() {
        return SimulationConfig::default();
    }
    match SimulationConfig::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(config: &SimulationConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(&cli.config);
    init_tracing(&config);

    let (items, recipes) = match commands::load_catalog(cli.items.as_deref(), cli.recipes.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Generate { worldgen, output } => {
            let params = match WorldGenParams::from_file(Path::new(&worldgen)) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error loading generation config: {}", e);
                    std::process::exit(1);
                }
            };
            println!("Generating world from {}...", worldgen);
            let save_dir = output.unwrap_or_else(|| config.save_directory.clone());
            match commands::generate(&config, &params, items, recipes, Path::new(&save_dir)) {
                Ok(path) => println!("\nGame saved to {}", path.display()),
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Run { save, ticks } => {
            if let Err(e) =
                commands::run_simulation(&config, save.as_deref(), ticks, items, recipes).await
            {
                eprintln!("Simulation error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Inspect {
            tile,
            world,
            player,
            inventory,
        } => {
            if let Err(e) =
                commands::inspect(&config, tile, world, player, inventory, items, recipes)
            {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Saves { action } => match action {
            SaveAction::List { dir } => {
                let dir = dir.unwrap_or_else(|| config.save_directory.clone());
                let save_dir = Path::new(&dir);
                match persistence::list_saves(save_dir) {
                    Ok(saves) => {
                        if saves.is_empty() {
                            println!("No saves found in {}", save_dir.display());
                        } else {
                            println!("{:<44} {:>8} {:>8} {:>12}", "File", "Format", "Tick", "Size");
                            println!("{}", "-".repeat(75));
                            for s in &saves {
                                let name = s
                                    .path
                                    .file_name()
                                    .and_then(|n| n.to_str())
                                    .unwrap_or("?");
                                let size_kb = s.file_size / 1024;
                                println!(
                                    "{:<44} {:>8} {:>8} {:>9} KB",
                                    name,
                                    s.format.extension(),
                                    s.tick,
                                    size_kb
                                );
                            }
                            println!("\n{} save(s) in {}", saves.len(), save_dir.display());
                        }
                    }
                    Err(e) => {
                        eprintln!("Error listing saves: {}", e);
                        std::process::exit(1);
                    }
                }
            }
            SaveAction::Restore { file } => {
                let path = Path::new(&file);
                match persistence::load_save(path) {
                    Ok(save) => {
                        println!("Restored save from {}", path.display());
                        println!(
                            "Tick {}, game time {:.1}s, weather {}",
                            save.tick,
                            save.game_time,
                            save.weather.name()
                        );
                        println!(
                            "Player at ({:.1}, {:.1}), health {:.1}, {} item slot(s) used",
                            save.player.position.x,
                            save.player.position.y,
                            save.player.vitals.health,
                            save.inventory.used_slots()
                        );
                        print_world_summary(&save.world);
                    }
                    Err(e) => {
                        eprintln!("Error restoring save: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        },

        Commands::Recipes => commands::list_recipes(&config, &items, &recipes),
    }
}

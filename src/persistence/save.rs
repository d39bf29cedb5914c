use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::generation::WORLD_SIZE_RANGE;
use crate::config::simulation::SimulationConfig;
use crate::crafting::RecipeBook;
use crate::inventory::Inventory;
use crate::items::ItemRegistry;
use crate::player::PlayerState;
use crate::simulation::{Game, Weather};
use crate::world::World;

/// Current save layout. Bump when a field changes meaning or shape.
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Json,
    /// Compact bincode encoding.
    Binary,
}

impl SaveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Json => "json",
            SaveFormat::Binary => "bin",
        }
    }

    fn from_extension(ext: &str) -> Option<SaveFormat> {
        match ext {
            "json" => Some(SaveFormat::Json),
            "bin" => Some(SaveFormat::Binary),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<SaveFormat> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(SaveFormat::from_extension)
    }
}

/// Everything needed to resume a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    pub id: Uuid,
    /// Unix seconds.
    pub saved_at: u64,
    pub seed: u64,
    pub tick: u64,
    /// In-game seconds since day 0 midnight.
    pub game_time: f64,
    /// Seconds into the current day.
    pub day_time: f64,
    pub weather: Weather,
    pub player: PlayerState,
    pub inventory: Inventory,
    pub world: World,
}

/// Leading field of every save, read before committing to a full decode.
#[derive(Deserialize)]
struct SaveHeader {
    version: u32,
}

impl SaveFile {
    pub fn from_game(game: &Game) -> Self {
        Self {
            version: SAVE_VERSION,
            id: game.world.id,
            saved_at: unix_timestamp_now(),
            seed: game.seed(),
            tick: game.tick,
            game_time: game.clock.elapsed,
            day_time: game.clock.day_time(),
            weather: game.weather,
            player: game.player.clone(),
            inventory: game.inventory.clone(),
            world: game.world.clone(),
        }
    }

    /// Rebuild a running game. The RNG is reseeded from the seed and tick.
    pub fn into_game(
        self,
        items: ItemRegistry,
        recipes: RecipeBook,
        config: SimulationConfig,
    ) -> Game {
        let mut game = Game::new(
            self.world,
            self.player,
            self.inventory,
            items,
            recipes,
            config,
            self.seed,
        );
        game.resume_at(self.tick, self.game_time, self.weather);
        game
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        let w = &self.world;
        if !WORLD_SIZE_RANGE.contains(&w.width) || !WORLD_SIZE_RANGE.contains(&w.height) {
            return Err(format!(
                "world size {}x{} outside {}-{}",
                w.width,
                w.height,
                WORLD_SIZE_RANGE.start(),
                WORLD_SIZE_RANGE.end()
            ));
        }
        if !(w.tile_size.is_finite() && w.tile_size > 0.0) {
            return Err(format!("tile_size must be finite and > 0, got {}", w.tile_size));
        }
        if w.tiles.len() as u64 != w.width as u64 * w.height as u64 {
            return Err(format!(
                "world has {} tiles, expected {}x{}",
                w.tiles.len(),
                w.width,
                w.height
            ));
        }
        if let Some(node) = w.resources.values().find(|n| w.tile(n.coord).is_none()) {
            return Err(format!(
                "resource node at ({}, {}) outside the world",
                node.coord.x, node.coord.y
            ));
        }
        if let Some(event) = w
            .regeneration
            .iter()
            .find(|e| w.tile(e.origin).is_none() || !e.due_at.is_finite())
        {
            return Err(format!(
                "regeneration event at ({}, {}) due {} is invalid",
                event.origin.x, event.origin.y, event.due_at
            ));
        }
        if !self.game_time.is_finite() || !w.time.is_finite() {
            return Err("non-finite game time".to_string());
        }
        self.inventory.validate()
    }
}

/// Metadata about a save file on disk.
#[derive(Debug, Clone)]
pub struct SaveMetadata {
    pub path: PathBuf,
    pub tick: u64,
    pub timestamp: u64,
    pub file_size: u64,
    pub format: SaveFormat,
}

#[derive(Debug)]
pub enum SaveError {
    Io(io::Error),
    Serialize(String),
    Deserialize(String),
    UnknownFormat(PathBuf),
    Unversioned(PathBuf),
    UnsupportedVersion { found: u64, supported: u32 },
    Corrupt { path: PathBuf, reason: String },
    NoValidSaves,
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {}", e),
            SaveError::Serialize(e) => write!(f, "Serialization error: {}", e),
            SaveError::Deserialize(e) => write!(f, "Deserialization error: {}", e),
            SaveError::UnknownFormat(path) => {
                write!(f, "Unknown save format (expected .json or .bin): {}", path.display())
            }
            SaveError::Unversioned(path) => {
                write!(f, "Save has no version field: {}", path.display())
            }
            SaveError::UnsupportedVersion { found, supported } => write!(
                f,
                "Save version {} is not supported (expected {})",
                found, supported
            ),
            SaveError::Corrupt { path, reason } => {
                write!(f, "Corrupt save {}: {}", path.display(), reason)
            }
            SaveError::NoValidSaves => {
                write!(
                    f,
                    "No valid saves found. Start a new game with: survivalsim generate"
                )
            }
        }
    }
}

impl std::error::Error for SaveError {}

impl From<io::Error> for SaveError {
    fn from(e: io::Error) -> Self {
        SaveError::Io(e)
    }
}

/// Build a save filename from tick, timestamp and format.
fn save_filename(tick: u64, timestamp: u64, format: SaveFormat) -> String {
    format!("save-tick{}-{}.{}", tick, timestamp, format.extension())
}

/// Parse tick, timestamp and format from `save-tick{N}-{timestamp}.{json|bin}`.
fn parse_save_filename(filename: &str) -> Option<(u64, u64, SaveFormat)> {
    let (stem, ext) = filename.rsplit_once('.')?;
    let format = SaveFormat::from_extension(ext)?;
    let rest = stem.strip_prefix("save-tick")?;
    let (tick_str, ts_str) = rest.split_once('-')?;
    let tick = tick_str.parse::<u64>().ok()?;
    let ts = ts_str.parse::<u64>().ok()?;
    Some((tick, ts, format))
}

fn unix_timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Save the game into `save_dir`.
pub fn save_game(game: &Game, save_dir: &Path, format: SaveFormat) -> Result<PathBuf, SaveError> {
    write_save(&SaveFile::from_game(game), save_dir, format)
}

/// Write a save file using atomic write.
///
/// Writes to a temporary file first, then renames over the final path, so a
/// partial write never corrupts an existing save.
pub fn write_save(save: &SaveFile, save_dir: &Path, format: SaveFormat) -> Result<PathBuf, SaveError> {
    fs::create_dir_all(save_dir)?;

    let filename = save_filename(save.tick, save.saved_at, format);
    let target = save_dir.join(&filename);
    let tmp = save_dir.join(format!(".{}.tmp", filename));

    let encoded = match format {
        SaveFormat::Json => {
            serde_json::to_vec_pretty(save).map_err(|e| SaveError::Serialize(e.to_string()))?
        }
        SaveFormat::Binary => {
            bincode::serialize(save).map_err(|e| SaveError::Serialize(e.to_string()))?
        }
    };

    if let Err(e) = fs::write(&tmp, &encoded) {
        let _ = fs::remove_file(&tmp);
        return Err(SaveError::Io(e));
    }
    if let Err(e) = fs::rename(&tmp, &target) {
        let _ = fs::remove_file(&tmp);
        return Err(SaveError::Io(e));
    }

    info!(path = %target.display(), tick = save.tick, bytes = encoded.len(), "Game saved");
    Ok(target)
}

/// Load and check a save file. The format is chosen by extension.
pub fn load_save(path: &Path) -> Result<SaveFile, SaveError> {
    let format = SaveFormat::from_path(path).ok_or_else(|| SaveError::UnknownFormat(path.to_path_buf()))?;
    let data = fs::read(path)?;

    let save = match format {
        SaveFormat::Json => {
            let value: serde_json::Value =
                serde_json::from_slice(&data).map_err(|e| SaveError::Deserialize(e.to_string()))?;
            let version = value
                .get("version")
                .and_then(|v| v.as_u64())
                .ok_or_else(|| SaveError::Unversioned(path.to_path_buf()))?;
            check_version(version)?;
            serde_json::from_value::<SaveFile>(value)
                .map_err(|e| SaveError::Deserialize(e.to_string()))?
        }
        SaveFormat::Binary => {
            let header: SaveHeader =
                bincode::deserialize(&data).map_err(|e| SaveError::Deserialize(e.to_string()))?;
            check_version(u64::from(header.version))?;
            bincode::deserialize::<SaveFile>(&data)
                .map_err(|e| SaveError::Deserialize(e.to_string()))?
        }
    };

    save.validate().map_err(|reason| SaveError::Corrupt {
        path: path.to_path_buf(),
        reason,
    })?;
    debug!(path = %path.display(), tick = save.tick, "Save loaded");
    Ok(save)
}

/// Only the current layout decodes. A future layout change adds a migration
/// step here for each retired version.
fn check_version(version: u64) -> Result<(), SaveError> {
    if u32::try_from(version).ok() != Some(SAVE_VERSION) {
        return Err(SaveError::UnsupportedVersion {
            found: version,
            supported: SAVE_VERSION,
        });
    }
    Ok(())
}

/// List all saves in a directory, newest first.
pub fn list_saves(save_dir: &Path) -> Result<Vec<SaveMetadata>, SaveError> {
    if !save_dir.exists() {
        return Ok(Vec::new());
    }

    let mut saves = Vec::new();

    for entry in fs::read_dir(save_dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };

        // Skip temp files
        if filename.starts_with('.') {
            continue;
        }

        if let Some((tick, timestamp, format)) = parse_save_filename(&filename) {
            let file_size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            saves.push(SaveMetadata {
                path: path.clone(),
                tick,
                timestamp,
                file_size,
                format,
            });
        }
    }

    saves.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.tick.cmp(&a.tick)));

    Ok(saves)
}

/// Delete all but the `max_saves` most recent saves. Returns the deleted paths.
pub fn prune_saves(save_dir: &Path, max_saves: usize) -> Result<Vec<PathBuf>, SaveError> {
    let saves = list_saves(save_dir)?;

    let mut deleted = Vec::new();
    if saves.len() > max_saves {
        for save in &saves[max_saves..] {
            fs::remove_file(&save.path)?;
            deleted.push(save.path.clone());
        }
    }

    Ok(deleted)
}

/// Load the most recent valid save, falling back to older ones if newer files are corrupt.
pub fn load_latest_valid_save(save_dir: &Path) -> Result<SaveFile, SaveError> {
    let saves = list_saves(save_dir)?;

    for save in &saves {
        match load_save(&save.path) {
            Ok(loaded) => return Ok(loaded),
            Err(e) => {
                warn!(
                    path = %save.path.display(),
                    error = %e,
                    "Unreadable save, trying next"
                );
            }
        }
    }

    Err(SaveError::NoValidSaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::generation::WorldGenParams;
    use tempfile::TempDir;

    fn make_test_game() -> Game {
        let mut game = Game::new_game(
            &WorldGenParams::new(42, 24, 16),
            SimulationConfig::default(),
            ItemRegistry::builtin(),
            RecipeBook::builtin(),
        )
        .unwrap();
        let wood = game.items.stack("wood", 7).unwrap();
        game.inventory.add_item(wood);
        let axe = game.items.stack("stone_axe", 1).unwrap();
        game.inventory.add_item(axe);
        for _ in 0..90 {
            game.advance(game.config.step_secs());
        }
        game
    }

    fn encoded(game: &Game, format: SaveFormat) -> Vec<u8> {
        let save = SaveFile::from_game(game);
        match format {
            SaveFormat::Json => serde_json::to_vec(&save).unwrap(),
            SaveFormat::Binary => bincode::serialize(&save).unwrap(),
        }
    }

    #[test]
    fn json_round_trip_identical() {
        let dir = TempDir::new().unwrap();
        let game = make_test_game();

        let path = save_game(&game, dir.path(), SaveFormat::Json).unwrap();
        let restored = load_save(&path).unwrap();

        assert_eq!(restored.world, game.world);
        assert_eq!(restored.player, game.player);
        assert_eq!(restored.inventory, game.inventory);
        assert_eq!(restored.tick, game.tick);
        assert_eq!(restored.version, SAVE_VERSION);
    }

    #[test]
    fn binary_round_trip_identical() {
        let dir = TempDir::new().unwrap();
        let game = make_test_game();

        let path = save_game(&game, dir.path(), SaveFormat::Binary).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("bin"));
        let restored = load_save(&path).unwrap();
        assert_eq!(restored, SaveFile { saved_at: restored.saved_at, ..SaveFile::from_game(&game) });
    }

    #[test]
    fn restored_game_resumes_state() {
        let game = make_test_game();
        let save = SaveFile::from_game(&game);
        let resumed = save.into_game(
            ItemRegistry::builtin(),
            RecipeBook::builtin(),
            SimulationConfig::default(),
        );
        assert_eq!(resumed.tick, game.tick);
        assert_eq!(resumed.clock.elapsed, game.clock.elapsed);
        assert_eq!(resumed.weather, game.weather);
        assert_eq!(resumed.inventory.count_of("wood"), 7);
        assert_eq!(resumed.world.pending_regeneration(), game.world.pending_regeneration());
    }

    #[test]
    fn save_filename_parse_round_trip() {
        let filename = save_filename(500, 1708300000, SaveFormat::Json);
        assert_eq!(filename, "save-tick500-1708300000.json");

        let (tick, ts, format) = parse_save_filename(&filename).unwrap();
        assert_eq!(tick, 500);
        assert_eq!(ts, 1708300000);
        assert_eq!(format, SaveFormat::Json);
    }

    #[test]
    fn parse_invalid_filename_returns_none() {
        assert!(parse_save_filename("random.json").is_none());
        assert!(parse_save_filename("save-tick.json").is_none());
        assert!(parse_save_filename("save-tickabc-123.bin").is_none());
        assert!(parse_save_filename("save-tick100-abc.json").is_none());
        assert!(parse_save_filename("save-tick1-2.txt").is_none());
    }

    #[test]
    fn list_saves_returns_sorted_newest_first() {
        let dir = TempDir::new().unwrap();
        let data = encoded(&make_test_game(), SaveFormat::Json);

        fs::write(dir.path().join("save-tick10-1000.json"), &data).unwrap();
        fs::write(dir.path().join("save-tick20-2000.json"), &data).unwrap();
        fs::write(dir.path().join("save-tick30-3000.json"), &data).unwrap();

        let saves = list_saves(dir.path()).unwrap();
        assert_eq!(saves.len(), 3);
        assert_eq!(saves[0].tick, 30);
        assert_eq!(saves[1].tick, 20);
        assert_eq!(saves[2].tick, 10);
    }

    #[test]
    fn list_saves_skips_other_files() {
        let dir = TempDir::new().unwrap();
        let data = encoded(&make_test_game(), SaveFormat::Binary);

        fs::write(dir.path().join("save-tick10-1000.bin"), &data).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a save").unwrap();
        fs::write(dir.path().join(".save-tick99-9999.bin.tmp"), "temp file").unwrap();

        let saves = list_saves(dir.path()).unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].format, SaveFormat::Binary);
    }

    #[test]
    fn list_saves_nonexistent_dir() {
        let dir = TempDir::new().unwrap();
        let saves = list_saves(&dir.path().join("missing")).unwrap();
        assert!(saves.is_empty());
    }

    #[test]
    fn prune_keeps_max_saves() {
        let dir = TempDir::new().unwrap();
        for i in 0..6u64 {
            fs::write(
                dir.path().join(format!("save-tick{}-{}.json", i * 10, 1000 + i)),
                b"{}",
            )
            .unwrap();
        }

        let deleted = prune_saves(dir.path(), 3).unwrap();
        assert_eq!(deleted.len(), 3);

        let remaining = list_saves(dir.path()).unwrap();
        assert_eq!(remaining.len(), 3);
        assert_eq!(remaining[0].timestamp, 1005);
        assert_eq!(remaining[2].timestamp, 1003);
    }

    #[test]
    fn load_corrupt_and_truncated_saves_fail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("save-tick0-1000.json");
        fs::write(&path, b"this is not json").unwrap();
        assert!(load_save(&path).is_err());

        let data = encoded(&make_test_game(), SaveFormat::Binary);
        let path = dir.path().join("save-tick0-1001.bin");
        fs::write(&path, &data[..data.len() / 2]).unwrap();
        assert!(load_save(&path).is_err());
    }

    #[test]
    fn unversioned_save_rejected() {
        let dir = TempDir::new().unwrap();
        let mut value = serde_json::to_value(SaveFile::from_game(&make_test_game())).unwrap();
        value.as_object_mut().unwrap().remove("version");
        let path = dir.path().join("save-tick1-1000.json");
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(load_save(&path), Err(SaveError::Unversioned(_))));
    }

    #[test]
    fn newer_version_rejected() {
        let dir = TempDir::new().unwrap();
        let mut save = SaveFile::from_game(&make_test_game());
        save.version = SAVE_VERSION + 1;
        let path = write_save(&save, dir.path(), SaveFormat::Json).unwrap();

        assert!(matches!(
            load_save(&path),
            Err(SaveError::UnsupportedVersion { found, .. }) if found == u64::from(SAVE_VERSION) + 1
        ));
    }

    #[test]
    fn inconsistent_world_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let mut save = SaveFile::from_game(&make_test_game());
        save.world.tiles.pop();
        let path = write_save(&save, dir.path(), SaveFormat::Binary).unwrap();

        assert!(matches!(load_save(&path), Err(SaveError::Corrupt { .. })));
    }

    fn assert_corrupt(save: &SaveFile) {
        let dir = TempDir::new().unwrap();
        let path = write_save(save, dir.path(), SaveFormat::Json).unwrap();
        assert!(matches!(load_save(&path), Err(SaveError::Corrupt { .. })));
    }

    #[test]
    fn empty_world_is_corrupt() {
        let mut save = SaveFile::from_game(&make_test_game());
        save.world.width = 0;
        save.world.height = 0;
        save.world.tiles.clear();
        save.world.resources.clear();
        save.world.regeneration.cancel_all();
        assert_corrupt(&save);
    }

    #[test]
    fn bad_tile_size_is_corrupt() {
        for tile_size in [-32.0, 0.0, f32::NAN, f32::INFINITY] {
            let mut save = SaveFile::from_game(&make_test_game());
            save.world.tile_size = tile_size;
            let dir = TempDir::new().unwrap();
            // JSON cannot carry NaN or infinity, so use the binary encoding.
            let path = write_save(&save, dir.path(), SaveFormat::Binary).unwrap();
            assert!(matches!(load_save(&path), Err(SaveError::Corrupt { .. })));
        }
    }

    #[test]
    fn regeneration_outside_world_is_corrupt() {
        use crate::world::{RegenEvent, ResourceType, TileCoord};

        let mut save = SaveFile::from_game(&make_test_game());
        save.world.regeneration.schedule(RegenEvent {
            due_at: 5.0,
            origin: TileCoord::new(save.world.width, 0),
            resource: ResourceType::Wood,
        });
        assert_corrupt(&save);

        let mut save = SaveFile::from_game(&make_test_game());
        save.world.regeneration.schedule(RegenEvent {
            due_at: f64::INFINITY,
            origin: TileCoord::new(1, 1),
            resource: ResourceType::Wood,
        });
        let dir = TempDir::new().unwrap();
        let path = write_save(&save, dir.path(), SaveFormat::Binary).unwrap();
        assert!(matches!(load_save(&path), Err(SaveError::Corrupt { .. })));
    }

    #[test]
    fn oversized_version_is_not_truncated() {
        let dir = TempDir::new().unwrap();
        let mut value = serde_json::to_value(SaveFile::from_game(&make_test_game())).unwrap();
        let huge = (1u64 << 32) + u64::from(SAVE_VERSION);
        value["version"] = serde_json::json!(huge);
        let path = dir.path().join("save-tick1-1000.json");
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(
            load_save(&path),
            Err(SaveError::UnsupportedVersion { found, .. }) if found == huge
        ));
    }

    #[test]
    fn load_latest_valid_falls_back_on_corrupt() {
        let dir = TempDir::new().unwrap();
        let game = make_test_game();

        fs::write(
            dir.path().join("save-tick10-1000.json"),
            encoded(&game, SaveFormat::Json),
        )
        .unwrap();
        fs::write(dir.path().join("save-tick20-2000.json"), b"corrupt data here").unwrap();

        let restored = load_latest_valid_save(dir.path()).unwrap();
        assert_eq!(restored.tick, game.tick);
    }

    #[test]
    fn load_latest_valid_all_corrupt_returns_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("save-tick10-1000.bin"), b"corrupt1").unwrap();
        fs::write(dir.path().join("save-tick20-2000.json"), b"corrupt2").unwrap();

        assert!(matches!(
            load_latest_valid_save(dir.path()),
            Err(SaveError::NoValidSaves)
        ));
    }

    #[test]
    fn atomic_write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        save_game(&make_test_game(), dir.path(), SaveFormat::Json).unwrap();

        let temp_files = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().is_some_and(|n| n.starts_with('.')))
            .count();
        assert_eq!(temp_files, 0);
    }

    #[test]
    fn save_creates_directory_if_missing() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("nested").join("saves");
        let path = save_game(&make_test_game(), &nested, SaveFormat::Binary).unwrap();
        assert!(path.exists());
    }
}

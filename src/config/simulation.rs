use serde::Deserialize;
use std::path::Path;

use crate::crafting::MatchMode;
use crate::persistence::SaveFormat;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f32,
    #[serde(default = "default_max_steps_per_frame")]
    pub max_steps_per_frame: u32,
    #[serde(default = "default_day_length")]
    pub day_length_secs: f32,
    #[serde(default = "default_start_day_fraction")]
    pub start_day_fraction: f32,
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: f32,
    #[serde(default = "default_max_saves")]
    pub max_saves: u32,
    #[serde(default = "default_save_directory")]
    pub save_directory: String,
    #[serde(default = "default_save_format")]
    pub save_format: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_inventory_capacity")]
    pub inventory_capacity: usize,
    #[serde(default = "default_player_speed")]
    pub player_speed: f32,
    #[serde(default = "default_hunger_decay")]
    pub hunger_decay_per_sec: f32,
    #[serde(default = "default_thirst_decay")]
    pub thirst_decay_per_sec: f32,
    #[serde(default = "default_starvation_damage")]
    pub starvation_damage_per_sec: f32,
    #[serde(default = "default_weather_change_chance")]
    pub weather_change_chance_per_sec: f32,
    #[serde(default = "default_resource_spawn_interval")]
    pub resource_spawn_interval_secs: f32,
    #[serde(default = "default_spawn_attempts")]
    pub spawn_attempts: u32,
    #[serde(default = "default_regen_chance")]
    pub regen_chance: f32,
    #[serde(default = "default_regen_delay_min")]
    pub regen_delay_min_secs: f32,
    #[serde(default = "default_regen_delay_max")]
    pub regen_delay_max_secs: f32,
    #[serde(default = "default_craft_match")]
    pub craft_match: String,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f32,
}

fn default_tick_rate() -> f32 {
    30.0
}
fn default_max_steps_per_frame() -> u32 {
    5
}
fn default_day_length() -> f32 {
    600.0
}
fn default_start_day_fraction() -> f32 {
    0.3
}
fn default_autosave_interval() -> f32 {
    60.0
}
fn default_max_saves() -> u32 {
    5
}
fn default_save_directory() -> String {
    "./saves".to_string()
}
fn default_save_format() -> String {
    "json".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_inventory_capacity() -> usize {
    36
}
fn default_player_speed() -> f32 {
    96.0
}
fn default_hunger_decay() -> f32 {
    0.1
}
fn default_thirst_decay() -> f32 {
    0.15
}
fn default_starvation_damage() -> f32 {
    1.0
}
fn default_weather_change_chance() -> f32 {
    0.01
}
fn default_resource_spawn_interval() -> f32 {
    30.0
}
fn default_spawn_attempts() -> u32 {
    3
}
fn default_regen_chance() -> f32 {
    0.3
}
fn default_regen_delay_min() -> f32 {
    10.0
}
fn default_regen_delay_max() -> f32 {
    40.0
}
fn default_craft_match() -> String {
    "at_least".to_string()
}
fn default_viewport_width() -> f32 {
    800.0
}
fn default_viewport_height() -> f32 {
    600.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate(),
            max_steps_per_frame: default_max_steps_per_frame(),
            day_length_secs: default_day_length(),
            start_day_fraction: default_start_day_fraction(),
            autosave_interval_secs: default_autosave_interval(),
            max_saves: default_max_saves(),
            save_directory: default_save_directory(),
            save_format: default_save_format(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            inventory_capacity: default_inventory_capacity(),
            player_speed: default_player_speed(),
            hunger_decay_per_sec: default_hunger_decay(),
            thirst_decay_per_sec: default_thirst_decay(),
            starvation_damage_per_sec: default_starvation_damage(),
            weather_change_chance_per_sec: default_weather_change_chance(),
            resource_spawn_interval_secs: default_resource_spawn_interval(),
            spawn_attempts: default_spawn_attempts(),
            regen_chance: default_regen_chance(),
            regen_delay_min_secs: default_regen_delay_min(),
            regen_delay_max_secs: default_regen_delay_max(),
            craft_match: default_craft_match(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Length of one fixed simulation step in seconds.
    pub fn step_secs(&self) -> f32 {
        1.0 / self.tick_rate_hz
    }

    pub fn match_mode(&self) -> MatchMode {
        match self.craft_match.as_str() {
            "exact" => MatchMode::Exact,
            _ => MatchMode::AtLeast,
        }
    }

    pub fn format(&self) -> SaveFormat {
        match self.save_format.as_str() {
            "bincode" => SaveFormat::Binary,
            _ => SaveFormat::Json,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if !(self.tick_rate_hz > 0.0 && self.tick_rate_hz.is_finite()) {
            errors.push(format!(
                "tick_rate_hz must be > 0.0, got {}. Example: tick_rate_hz = 30.0",
                self.tick_rate_hz
            ));
        }

        if self.max_steps_per_frame == 0 {
            errors.push(format!(
                "max_steps_per_frame must be > 0, got {}. Example: max_steps_per_frame = 5",
                self.max_steps_per_frame
            ));
        }

        if !(self.day_length_secs > 0.0 && self.day_length_secs.is_finite()) {
            errors.push(format!(
                "day_length_secs must be > 0.0, got {}. Example: day_length_secs = 600.0",
                self.day_length_secs
            ));
        }

        if !(0.0..1.0).contains(&self.start_day_fraction) {
            errors.push(format!(
                "start_day_fraction must be in [0.0, 1.0), got {}. Example: start_day_fraction = 0.3",
                self.start_day_fraction
            ));
        }

        if !(self.autosave_interval_secs >= 0.0 && self.autosave_interval_secs.is_finite()) {
            errors.push(format!(
                "autosave_interval_secs must be >= 0.0 (0 disables autosave), got {}. Example: autosave_interval_secs = 60.0",
                self.autosave_interval_secs
            ));
        }

        if self.max_saves == 0 {
            errors.push(format!(
                "max_saves must be > 0, got {}. Example: max_saves = 5",
                self.max_saves
            ));
        }

        if self.save_format != "json" && self.save_format != "bincode" {
            errors.push(format!(
                "save_format must be 'json' or 'bincode', got '{}'. Example: save_format = \"json\"",
                self.save_format
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if self.log_format != "pretty" && self.log_format != "json" {
            errors.push(format!(
                "log_format must be 'pretty' or 'json', got '{}'. Example: log_format = \"pretty\"",
                self.log_format
            ));
        }

        if !(9..=256).contains(&self.inventory_capacity) {
            errors.push(format!(
                "inventory_capacity must be 9-256, got {}. Example: inventory_capacity = 36",
                self.inventory_capacity
            ));
        }

        if !(self.player_speed > 0.0) {
            errors.push(format!(
                "player_speed must be > 0.0, got {}. Example: player_speed = 96.0",
                self.player_speed
            ));
        }

        for (name, value) in [
            ("hunger_decay_per_sec", self.hunger_decay_per_sec),
            ("thirst_decay_per_sec", self.thirst_decay_per_sec),
            ("starvation_damage_per_sec", self.starvation_damage_per_sec),
        ] {
            if !(value >= 0.0) {
                errors.push(format!("{} must be >= 0.0, got {}", name, value));
            }
        }

        if !(0.0..=1.0).contains(&self.weather_change_chance_per_sec) {
            errors.push(format!(
                "weather_change_chance_per_sec must be 0.0-1.0, got {}. Example: weather_change_chance_per_sec = 0.01",
                self.weather_change_chance_per_sec
            ));
        }

        if !(self.resource_spawn_interval_secs >= 0.0 && self.resource_spawn_interval_secs.is_finite()) {
            errors.push(format!(
                "resource_spawn_interval_secs must be >= 0.0 (0 disables spawning), got {}. Example: resource_spawn_interval_secs = 30.0",
                self.resource_spawn_interval_secs
            ));
        }

        if !(0.0..=1.0).contains(&self.regen_chance) {
            errors.push(format!(
                "regen_chance must be 0.0-1.0, got {}. Example: regen_chance = 0.3",
                self.regen_chance
            ));
        }

        if !(self.regen_delay_min_secs >= 0.0 && self.regen_delay_max_secs > self.regen_delay_min_secs)
        {
            errors.push(format!(
                "regen delay range must satisfy 0 <= min < max, got {}..{}. Example: regen_delay_min_secs = 10.0, regen_delay_max_secs = 40.0",
                self.regen_delay_min_secs, self.regen_delay_max_secs
            ));
        }

        if self.craft_match != "at_least" && self.craft_match != "exact" {
            errors.push(format!(
                "craft_match must be 'at_least' or 'exact', got '{}'. Example: craft_match = \"at_least\"",
                self.craft_match
            ));
        }

        if !(self.viewport_width > 0.0 && self.viewport_height > 0.0) {
            errors.push(format!(
                "viewport must be positive, got {}x{}",
                self.viewport_width, self.viewport_height
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn test_path() -> PathBuf {
        PathBuf::from("test-config.toml")
    }

    #[test]
    fn valid_config_loads_fields() {
        let toml = r#"
            tick_rate_hz = 60.0
            day_length_secs = 120.0
            autosave_interval_secs = 30.0
            max_saves = 3
            save_directory = "./data/saves"
            save_format = "bincode"
            log_level = "debug"
            log_format = "json"
            inventory_capacity = 27
            craft_match = "exact"
        "#;
        let config = SimulationConfig::from_toml_str(toml, &test_path()).unwrap();
        assert_eq!(config.tick_rate_hz, 60.0);
        assert_eq!(config.day_length_secs, 120.0);
        assert_eq!(config.autosave_interval_secs, 30.0);
        assert_eq!(config.max_saves, 3);
        assert_eq!(config.save_directory, "./data/saves");
        assert_eq!(config.format(), SaveFormat::Binary);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, "json");
        assert_eq!(config.inventory_capacity, 27);
        assert_eq!(config.match_mode(), MatchMode::Exact);
    }

    #[test]
    fn defaults_applied_for_empty_config() {
        let config = SimulationConfig::from_toml_str("", &test_path()).unwrap();
        assert_eq!(config.tick_rate_hz, 30.0);
        assert_eq!(config.day_length_secs, 600.0);
        assert_eq!(config.max_saves, 5);
        assert_eq!(config.save_directory, "./saves");
        assert_eq!(config.format(), SaveFormat::Json);
        assert_eq!(config.inventory_capacity, 36);
        assert_eq!(config.regen_chance, 0.3);
        assert_eq!(config.regen_delay_min_secs, 10.0);
        assert_eq!(config.regen_delay_max_secs, 40.0);
        assert_eq!(config.match_mode(), MatchMode::AtLeast);
    }

    #[test]
    fn invalid_tick_rate_rejected() {
        let err = SimulationConfig::from_toml_str("tick_rate_hz = -1.0", &test_path()).unwrap_err();
        assert!(err.contains("tick_rate_hz"));
        assert!(err.contains("> 0.0"));
    }

    #[test]
    fn nan_rates_rejected() {
        let err = SimulationConfig::from_toml_str("tick_rate_hz = nan", &test_path()).unwrap_err();
        assert!(err.contains("tick_rate_hz"));
        let err = SimulationConfig::from_toml_str("hunger_decay_per_sec = nan", &test_path())
            .unwrap_err();
        assert!(err.contains("hunger_decay_per_sec"));
    }

    #[test]
    fn zero_intervals_disable_timers() {
        let toml = "autosave_interval_secs = 0.0\nresource_spawn_interval_secs = 0.0";
        let config = SimulationConfig::from_toml_str(toml, &test_path()).unwrap();
        assert_eq!(config.autosave_interval_secs, 0.0);
        assert_eq!(config.resource_spawn_interval_secs, 0.0);

        let err = SimulationConfig::from_toml_str("autosave_interval_secs = -5.0", &test_path())
            .unwrap_err();
        assert!(err.contains("autosave_interval_secs"));
    }

    #[test]
    fn invalid_save_format_rejected() {
        let err = SimulationConfig::from_toml_str(r#"save_format = "xml""#, &test_path())
            .unwrap_err();
        assert!(err.contains("save_format"));
    }

    #[test]
    fn invalid_craft_match_rejected() {
        let err = SimulationConfig::from_toml_str(r#"craft_match = "fuzzy""#, &test_path())
            .unwrap_err();
        assert!(err.contains("craft_match"));
    }

    #[test]
    fn inverted_regen_delay_rejected() {
        let toml = "regen_delay_min_secs = 50.0\nregen_delay_max_secs = 20.0";
        let err = SimulationConfig::from_toml_str(toml, &test_path()).unwrap_err();
        assert!(err.contains("regen delay"));
    }

    #[test]
    fn multiple_errors_reported_together() {
        let toml = "tick_rate_hz = 0.0\nmax_saves = 0\ninventory_capacity = 2";
        let err = SimulationConfig::from_toml_str(toml, &test_path()).unwrap_err();
        assert!(err.contains("tick_rate_hz"));
        assert!(err.contains("max_saves"));
        assert!(err.contains("inventory_capacity"));
    }

    #[test]
    fn malformed_toml_includes_source_path() {
        let err =
            SimulationConfig::from_toml_str("tick_rate_hz = [invalid", &test_path()).unwrap_err();
        assert!(err.contains("test-config.toml"));
    }

    #[test]
    fn from_file_loads_valid_config() {
        let mut tmp = NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(tmp, "tick_rate_hz = 20.0").unwrap();
        let config = SimulationConfig::from_file(tmp.path()).unwrap();
        assert_eq!(config.tick_rate_hz, 20.0);
        assert!((config.step_secs() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn from_file_missing_file_error() {
        let err = SimulationConfig::from_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(err.contains("Cannot read"));
    }

    #[test]
    fn default_matches_empty_toml() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_rate_hz, 30.0);
    }
}

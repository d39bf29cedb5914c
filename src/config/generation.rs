use serde::{Deserialize, Serialize};
use std::path::Path;

/// Allowed world width and height, in tiles.
pub const WORLD_SIZE_RANGE: std::ops::RangeInclusive<u32> = 8..=4096;

/// Parameters used to procedurally generate a world.
/// Stored with the world for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldGenParams {
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    #[serde(default = "default_resource_chance")]
    pub resource_chance: f32,
    #[serde(default = "default_min_initial_amount")]
    pub min_initial_amount: u32,
    #[serde(default = "default_max_initial_amount")]
    pub max_initial_amount: u32,
    #[serde(default = "default_elevation_scale")]
    pub elevation_scale: f64,
    #[serde(default = "default_moisture_scale")]
    pub moisture_scale: f64,
}

fn default_tile_size() -> f32 {
    32.0
}
fn default_resource_chance() -> f32 {
    0.3
}
fn default_min_initial_amount() -> u32 {
    1
}
fn default_max_initial_amount() -> u32 {
    5
}
fn default_elevation_scale() -> f64 {
    0.08
}
fn default_moisture_scale() -> f64 {
    0.12
}

impl WorldGenParams {
    /// Parameters with every tunable at its default.
    pub fn new(seed: u64, width: u32, height: u32) -> Self {
        Self {
            seed,
            width,
            height,
            tile_size: default_tile_size(),
            resource_chance: default_resource_chance(),
            min_initial_amount: default_min_initial_amount(),
            max_initial_amount: default_max_initial_amount(),
            elevation_scale: default_elevation_scale(),
            moisture_scale: default_moisture_scale(),
        }
    }

    /// Load generation parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        let params: Self = toml::from_str(&content)
            .map_err(|e| format!("Invalid TOML in {}: {}", path.display(), e))?;
        params.validate()?;
        Ok(params)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !WORLD_SIZE_RANGE.contains(&self.width) {
            return Err(format!("width must be 8-4096, got {}", self.width));
        }
        if !WORLD_SIZE_RANGE.contains(&self.height) {
            return Err(format!("height must be 8-4096, got {}", self.height));
        }
        if self.tile_size <= 0.0 {
            return Err(format!("tile_size must be > 0.0, got {}", self.tile_size));
        }
        if !(0.0..=1.0).contains(&self.resource_chance) {
            return Err(format!(
                "resource_chance must be 0.0-1.0, got {}",
                self.resource_chance
            ));
        }
        if self.min_initial_amount == 0 {
            return Err("min_initial_amount must be >= 1, got 0".to_string());
        }
        if self.max_initial_amount < self.min_initial_amount {
            return Err(format!(
                "max_initial_amount ({}) must be >= min_initial_amount ({})",
                self.max_initial_amount, self.min_initial_amount
            ));
        }
        if self.elevation_scale <= 0.0 || self.moisture_scale <= 0.0 {
            return Err(format!(
                "elevation_scale and moisture_scale must be > 0.0, got {} and {}",
                self.elevation_scale, self.moisture_scale
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn valid_params() {
        assert!(WorldGenParams::new(42, 64, 64).validate().is_ok());
    }

    #[test]
    fn invalid_width() {
        let params = WorldGenParams::new(42, 4, 64);
        let err = params.validate().unwrap_err();
        assert!(err.contains("width"), "Error should mention width: {}", err);
    }

    #[test]
    fn invalid_resource_chance() {
        let mut params = WorldGenParams::new(42, 64, 64);
        params.resource_chance = 1.5;
        let err = params.validate().unwrap_err();
        assert!(err.contains("resource_chance"), "Error: {}", err);
    }

    #[test]
    fn inverted_amount_range_rejected() {
        let mut params = WorldGenParams::new(42, 64, 64);
        params.min_initial_amount = 6;
        params.max_initial_amount = 2;
        let err = params.validate().unwrap_err();
        assert!(err.contains("max_initial_amount"), "Error: {}", err);
    }

    #[test]
    fn from_toml_string_applies_defaults() {
        let toml_str = r#"
seed = 42
width = 100
height = 80
"#;
        let params: WorldGenParams = toml::from_str(toml_str).unwrap();
        assert_eq!(params.seed, 42);
        assert_eq!(params.width, 100);
        assert_eq!(params.tile_size, 32.0);
        assert_eq!(params.resource_chance, 0.3);
        assert_eq!(params.min_initial_amount, 1);
        assert_eq!(params.max_initial_amount, 5);
        params.validate().unwrap();
    }

    #[test]
    fn from_file_valid() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmpfile,
            r#"
seed = 7
width = 48
height = 32
tile_size = 16.0
resource_chance = 0.5
"#
        )
        .unwrap();

        let params = WorldGenParams::from_file(tmpfile.path()).unwrap();
        assert_eq!(params.width, 48);
        assert_eq!(params.tile_size, 16.0);
        assert_eq!(params.resource_chance, 0.5);
    }

    #[test]
    fn from_file_missing() {
        let err = WorldGenParams::from_file(Path::new("/nonexistent/file.toml")).unwrap_err();
        assert!(err.contains("Cannot read"), "Error: {}", err);
    }

    #[test]
    fn from_file_invalid_toml() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "this is not valid toml {{{{").unwrap();

        let err = WorldGenParams::from_file(tmpfile.path()).unwrap_err();
        assert!(err.contains("Invalid TOML"), "Error: {}", err);
    }

    #[test]
    fn from_file_out_of_range() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmpfile,
            r#"
seed = 1
width = 2
height = 64
"#
        )
        .unwrap();

        let err = WorldGenParams::from_file(tmpfile.path()).unwrap_err();
        assert!(err.contains("width"), "Error: {}", err);
    }
}

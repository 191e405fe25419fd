//! # Terrain Configuration
//!
//! World parameters loaded once at level start, usually from TOML:
//!
//! ```toml
//! grid_size_x = 4
//! grid_size_y = 4
//! chunk_size = 8
//! tile_size = 32.0
//! seed = 12345
//!
//! [mode]
//! kind = "checkerboard"
//!
//! [[materials.entries]]
//! material = "water"
//! rule = { range = [0.0, 0.3] }
//! ```
//!
//! Every field is optional; missing values fall back to the documented
//! defaults rather than failing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};
use crate::generator::{GenerationMode, PatternPalette, TerrainGenerator};
use crate::material::MaterialTable;
use crate::noise::WorldSeed;

/// Upper bound on the tiles a chunked terrain or dense snapshot may hold.
pub const MAX_TILES: usize = 1 << 24;

/// Parameters for a [`ChunkedTerrain`](crate::chunked::ChunkedTerrain).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Chunks along X.
    pub grid_size_x: usize,
    /// Chunks along Y.
    pub grid_size_y: usize,
    /// Chunk edge length in tiles.
    pub chunk_size: usize,
    /// Tile edge length in pixels.
    pub tile_size: f64,
    /// World seed.
    pub seed: u64,
    /// Noise frequency in cycles per tile.
    pub noise_scale: f64,
    /// Noise octaves.
    pub noise_octaves: u32,
    /// Canvas width in pixels.
    pub canvas_width: f64,
    /// Canvas height in pixels.
    pub canvas_height: f64,
    /// Material assignment algorithm.
    pub mode: GenerationMode,
    /// Procedural material rules.
    pub materials: MaterialTable,
    /// Materials for the pattern modes.
    pub pattern: PatternPalette,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            grid_size_x: 4,
            grid_size_y: 4,
            chunk_size: crate::chunk::DEFAULT_CHUNK_SIZE,
            tile_size: 32.0,
            seed: WorldSeed::default().value(),
            mode: GenerationMode::Procedural,
            noise_scale: TerrainGenerator::DEFAULT_SCALE,
            noise_octaves: TerrainGenerator::DEFAULT_OCTAVES,
            materials: MaterialTable::default(),
            pattern: PatternPalette::default(),
            canvas_width: 800.0,
            canvas_height: 600.0,
        }
    }
}

impl TerrainConfig {
    /// Config for a `grid_size_x` x `grid_size_y` chunk world with the given
    /// chunk size and seed; everything else default.
    #[must_use]
    pub fn new(grid_size_x: usize, grid_size_y: usize, chunk_size: usize, seed: u64) -> Self {
        Self {
            grid_size_x,
            grid_size_y,
            chunk_size,
            seed,
            ..Self::default()
        }
    }

    /// Sets the generation mode.
    #[must_use]
    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the tile size.
    #[must_use]
    pub fn with_tile_size(mut self, tile_size: f64) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Parses TOML.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] on syntax errors or values
    /// that fail [`validate`](Self::validate).
    pub fn from_toml_str(source: &str) -> TerrainResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| TerrainError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> TerrainResult<Self> {
        let source = std::fs::read_to_string(path.as_ref()).map_err(|e| TerrainError::Io(e.to_string()))?;
        Self::from_toml_str(&source)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> TerrainResult<String> {
        toml::to_string(self).map_err(|e| TerrainError::InvalidConfig(e.to_string()))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> TerrainResult<()> {
        if self.grid_size_x == 0 || self.grid_size_y == 0 {
            return Err(TerrainError::InvalidConfig(format!(
                "grid size must be non-zero, got {}x{}",
                self.grid_size_x, self.grid_size_y
            )));
        }
        if self.chunk_size == 0 {
            return Err(TerrainError::InvalidConfig("chunk_size must be non-zero".into()));
        }
        let extent = self
            .grid_size_x
            .checked_mul(self.chunk_size)
            .zip(self.grid_size_y.checked_mul(self.chunk_size))
            .filter(|&(x, y)| i32::try_from(x).is_ok() && i32::try_from(y).is_ok());
        let Some((tiles_x, tiles_y)) = extent else {
            return Err(TerrainError::InvalidConfig(format!(
                "{}x{} chunks of {} tiles exceed i32 coordinates",
                self.grid_size_x, self.grid_size_y, self.chunk_size
            )));
        };
        if tiles_x.saturating_mul(tiles_y) > MAX_TILES {
            return Err(TerrainError::InvalidConfig(format!(
                "{tiles_x}x{tiles_y} tiles exceed the limit of {MAX_TILES}"
            )));
        }
        if self.tile_size.is_nan() || self.tile_size <= 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "tile_size must be positive, got {}",
                self.tile_size
            )));
        }
        if self.noise_scale.is_nan() || self.noise_scale <= 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "noise_scale must be positive, got {}",
                self.noise_scale
            )));
        }
        if let GenerationMode::Columns { period: 0 } = self.mode {
            return Err(TerrainError::InvalidConfig("column period must be at least 1".into()));
        }
        self.materials.validate()
    }

    /// Builds the generator described by this config.
    #[must_use]
    pub fn generator(&self) -> TerrainGenerator {
        TerrainGenerator::new(WorldSeed::new(self.seed))
            .with_mode(self.mode)
            .with_table(self.materials.clone())
            .with_palette(self.pattern)
            .with_scale(self.noise_scale)
            .with_octaves(self.noise_octaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{MaterialId, MaterialRule};

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = TerrainConfig::from_toml_str("").unwrap();
        assert_eq!(config, TerrainConfig::default());
        assert_eq!(config.chunk_size, 8);
        assert_eq!(config.tile_size, 32.0);
    }

    #[test]
    fn test_partial_toml() {
        let config = TerrainConfig::from_toml_str(
            r#"
            grid_size_x = 2
            seed = 99

            [mode]
            kind = "columns"
            period = 4

            [materials]
            fallback = "dirt"

            [[materials.entries]]
            material = "water"
            rule = { range = [0.0, 0.3] }

            [[materials.entries]]
            material = "stone"
            rule = { threshold = 0.05 }
            "#,
        )
        .unwrap();

        assert_eq!(config.grid_size_x, 2);
        assert_eq!(config.grid_size_y, 4);
        assert_eq!(config.seed, 99);
        assert_eq!(config.mode, GenerationMode::Columns { period: 4 });
        assert_eq!(config.materials.fallback, MaterialId::Dirt);
        assert_eq!(config.materials.entries[0].rule, MaterialRule::Range(0.0, 0.3));
        assert_eq!(config.materials.entries[1].rule, MaterialRule::Threshold(0.05));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(TerrainConfig::from_toml_str("chunk_size = 0").is_err());
        assert!(TerrainConfig::from_toml_str("grid_size_y = 0").is_err());
        assert!(TerrainConfig::from_toml_str("tile_size = -1.0").is_err());
        assert!(TerrainConfig::from_toml_str("[mode]\nkind = \"columns\"\nperiod = 0").is_err());
        assert!(TerrainConfig::from_toml_str("grid_size_x = \"big\"").is_err());
    }

    #[test]
    fn test_oversized_extent_rejected() {
        let overflow = TerrainConfig::new(usize::MAX / 2, 1, usize::MAX / 2, 0);
        assert!(matches!(overflow.validate(), Err(TerrainError::InvalidConfig(_))));

        let past_i32 = TerrainConfig::new(1, 1, 1 << 31, 0);
        assert!(past_i32.validate().is_err());

        let too_many = TerrainConfig::new(46_341, 46_341, 1, 0);
        assert!(too_many.validate().is_err());

        let at_limit = TerrainConfig::new(512, 512, 8, 0);
        assert_eq!(512 * 8 * 512 * 8, MAX_TILES);
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = TerrainConfig::new(3, 2, 16, 7).with_mode(GenerationMode::Checkerboard);
        let text = config.to_toml_string().unwrap();
        assert_eq!(TerrainConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TerrainConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, TerrainError::Io(_)));
    }
}

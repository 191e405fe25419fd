//! # Terrain Generator
//!
//! Maps a world tile position to a [`MaterialId`].
//!
//! ## Modes
//!
//! - **Procedural**: octaved simplex noise at `(x * scale, y * scale)` run
//!   through a [`MaterialTable`]. Threshold rules draw from a per-tile
//!   `ChaCha8` stream seeded by `(seed, x, y)`, so the result never depends
//!   on which tiles were classified first.
//! - **Columns** / **Checkerboard**: parity patterns for tutorial and test
//!   levels. No noise involved.
//! - **Flat**: one material everywhere.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::material::{MaterialId, MaterialTable};
use crate::noise::{SimplexNoise, WorldSeed};

/// Seed purpose for the material noise channel.
const NOISE_CHANNEL: u64 = 1;
/// Seed purpose for per-tile threshold rolls.
const ROLL_CHANNEL: u64 = 2;

/// Two materials used by the pattern modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternPalette {
    /// Material on "even" cells.
    pub primary: MaterialId,
    /// Material on "odd" cells.
    pub secondary: MaterialId,
}

impl Default for PatternPalette {
    fn default() -> Self {
        Self {
            primary: MaterialId::Stone,
            secondary: MaterialId::Moss,
        }
    }
}

/// Algorithm used to assign materials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GenerationMode {
    /// Noise-driven classification.
    #[default]
    Procedural,
    /// `primary` where `x % period == 0`, `secondary` elsewhere.
    Columns {
        /// Column period, at least 1.
        period: u32,
    },
    /// `primary` where `(x + y)` is even.
    Checkerboard,
    /// Single material everywhere.
    Flat {
        /// The material.
        material: MaterialId,
    },
}

impl GenerationMode {
    /// Short name for logs and snapshot metadata.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Procedural => "procedural",
            Self::Columns { .. } => "columns",
            Self::Checkerboard => "checkerboard",
            Self::Flat { .. } => "flat",
        }
    }
}

/// Material classifier bound to a seed and mode.
pub struct TerrainGenerator {
    seed: WorldSeed,
    mode: GenerationMode,
    table: MaterialTable,
    palette: PatternPalette,
    noise: SimplexNoise,
    scale: f64,
    octaves: u32,
}

impl TerrainGenerator {
    /// Default noise frequency in cycles per tile.
    pub const DEFAULT_SCALE: f64 = 0.08;
    /// Default octave count.
    pub const DEFAULT_OCTAVES: u32 = 3;

    /// Creates a procedural generator with the default material table.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            seed,
            mode: GenerationMode::Procedural,
            table: MaterialTable::default(),
            palette: PatternPalette::default(),
            noise: SimplexNoise::new(seed.derive(NOISE_CHANNEL)),
            scale: Self::DEFAULT_SCALE,
            octaves: Self::DEFAULT_OCTAVES,
        }
    }

    /// Sets the generation mode.
    #[must_use]
    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replaces the material table.
    #[must_use]
    pub fn with_table(mut self, table: MaterialTable) -> Self {
        self.table = table;
        self
    }

    /// Replaces the pattern palette.
    #[must_use]
    pub const fn with_palette(mut self, palette: PatternPalette) -> Self {
        self.palette = palette;
        self
    }

    /// Sets the noise scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the octave count.
    #[must_use]
    pub const fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    /// The seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// The generation mode.
    #[must_use]
    pub const fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// The material table.
    #[must_use]
    pub const fn table(&self) -> &MaterialTable {
        &self.table
    }

    /// Noise value in `[0, 1)` at a tile.
    #[must_use]
    pub fn noise_at(&self, world_x: i32, world_y: i32) -> f64 {
        self.noise.fbm01(
            f64::from(world_x) * self.scale,
            f64::from(world_y) * self.scale,
            self.octaves,
        )
    }

    /// Classifies the material at a world tile position.
    ///
    /// Pure: the same generator always returns the same material for the
    /// same position.
    #[must_use]
    pub fn classify_material(&self, world_x: i32, world_y: i32) -> MaterialId {
        match self.mode {
            GenerationMode::Procedural => {
                let noise = self.noise_at(world_x, world_y);
                if self.table.threshold_count() == 0 {
                    return self.table.resolve(noise, || 1.0);
                }
                let mut rng = ChaCha8Rng::seed_from_u64(
                    self.seed
                        .derive(ROLL_CHANNEL)
                        .for_tile(i64::from(world_x), i64::from(world_y)),
                );
                self.table.resolve(noise, || rng.gen::<f64>())
            }
            GenerationMode::Columns { period } => {
                if world_x.rem_euclid(period.max(1) as i32) == 0 {
                    self.palette.primary
                } else {
                    self.palette.secondary
                }
            }
            GenerationMode::Checkerboard => {
                if (world_x + world_y).rem_euclid(2) == 0 {
                    self.palette.primary
                } else {
                    self.palette.secondary
                }
            }
            GenerationMode::Flat { material } => material,
        }
    }
}

/// One-shot classification with the default procedural table.
///
/// Builds a generator per call; hold a [`TerrainGenerator`] instead when
/// classifying many tiles.
#[must_use]
pub fn classify_material(world_x: i32, world_y: i32, seed: WorldSeed) -> MaterialId {
    TerrainGenerator::new(seed).classify_material(world_x, world_y)
}

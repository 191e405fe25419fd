//! # Tessera Terrain
//!
//! Deterministic 2D tile terrain for top-down games.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same tiles
//! 2. **Chunked**: Procedural worlds are generated one chunk at a time, on first touch
//! 3. **Sparse**: Hand-authored levels only store what was painted
//! 4. **Portable**: Any terrain round-trips through the JSON snapshot format
//!
//! ## Core Components
//!
//! - `ChunkedTerrain`: Lazily generated procedural world
//! - `SparseTerrain`: Hash-map storage for custom levels
//! - `TerrainGenerator`: Noise and pattern driven material classification
//! - `CoordinateSystem`: Grid, world and screen space conversions
//! - `TerrainExporter` / `TerrainSnapshot`: Export, validation and import
//! - `MapManager`: Registry of loaded levels and the active map
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_terrain::{ChunkedTerrain, MaterialId};
//!
//! let mut terrain = ChunkedTerrain::with_seed(2, 2, 8, 12345)?;
//!
//! // First touch generates the chunk
//! let tile = terrain.get_tile(3, 4).unwrap();
//! assert_eq!(tile.position(), (3, 4));
//!
//! terrain.set_tile(3, 4, MaterialId::Water);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod chunk;
pub mod chunked;
pub mod config;
pub mod coords;
pub mod error;
pub mod export;
pub mod generator;
pub mod grid;
pub mod import;
pub mod map;
pub mod material;
pub mod noise;
pub mod render;
pub mod sparse;
pub mod tile;

pub use chunk::{Chunk, ChunkCoord, ChunkState, DEFAULT_CHUNK_SIZE};
pub use chunked::ChunkedTerrain;
pub use config::{TerrainConfig, MAX_TILES};
pub use coords::{floor_div, CoordinateSystem, GridPos, PixelPos};
pub use error::{TerrainError, TerrainResult, ValidationIssue};
pub use export::{
    rle_decode, rle_decoded_len, rle_encode, validate_export_data, ExportMetadata, ExportOptions, MaterialRun, TerrainExporter,
    TerrainSnapshot, TileData, TileEncoding, TileRecord, ValidationReport,
};
pub use generator::{classify_material, GenerationMode, PatternPalette, TerrainGenerator};
pub use grid::Grid;
pub use import::import_into_chunked;
pub use map::{MapManager, MapTerrain};
pub use material::{MaterialEntry, MaterialId, MaterialRule, MaterialTable};
pub use noise::{SimplexNoise, WorldSeed};
pub use render::TileRenderer;
pub use sparse::SparseTerrain;
pub use tile::{Tile, TileBounds, WorldBounds};

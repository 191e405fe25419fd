//! # Chunked Terrain
//!
//! The procedural world: a fixed `grid_size_x` x `grid_size_y` grid of
//! chunks, each generated the first time one of its tiles is touched.
//!
//! ## Bounds
//!
//! Tile coordinates are valid in `[0, grid_size_x * chunk_size)` x
//! `[0, grid_size_y * chunk_size)`. Anything outside resolves to `None` /
//! `false`; entities probing the world edge are routine, not errors.
//!
//! ## Memory
//!
//! Generated chunks are kept for the terrain's lifetime. The world is
//! bounded by its chunk grid, so memory is bounded too.

use tracing::debug;

use crate::chunk::{Chunk, ChunkCoord};
use crate::config::TerrainConfig;
use crate::coords::{CoordinateSystem, GridPos};
use crate::error::TerrainResult;
use crate::generator::{GenerationMode, TerrainGenerator};
use crate::grid::Grid;
use crate::material::MaterialId;
use crate::noise::WorldSeed;
use crate::render::TileRenderer;
use crate::tile::{Tile, TileBounds, WorldBounds};

/// Lazily generated, chunk-paged terrain.
pub struct ChunkedTerrain {
    grid_size_x: usize,
    grid_size_y: usize,
    chunk_size: usize,
    tile_size: f64,
    generator: TerrainGenerator,
    chunks: Grid<Chunk>,
    coord_sys: CoordinateSystem,
}

impl ChunkedTerrain {
    /// Builds a terrain from a validated config. No chunk is generated yet.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`](crate::error::TerrainError::InvalidConfig)
    /// if the config fails validation.
    pub fn new(config: &TerrainConfig) -> TerrainResult<Self> {
        config.validate()?;

        let chunk_size = config.chunk_size;
        let chunks = Grid::from_fn(config.grid_size_x, config.grid_size_y, |cx, cy| {
            Chunk::new(ChunkCoord::new(cx as i32, cy as i32), chunk_size)
        });

        let mut coord_sys = CoordinateSystem::new(config.tile_size, config.canvas_width, config.canvas_height);
        let width = (config.grid_size_x * chunk_size) as f64 * config.tile_size;
        let height = (config.grid_size_y * chunk_size) as f64 * config.tile_size;
        coord_sys.align_to_terrain(width, height);

        debug!(
            chunks_x = config.grid_size_x,
            chunks_y = config.grid_size_y,
            chunk_size,
            seed = config.seed,
            mode = config.mode.name(),
            "chunked terrain created"
        );

        Ok(Self {
            grid_size_x: config.grid_size_x,
            grid_size_y: config.grid_size_y,
            chunk_size,
            tile_size: config.tile_size,
            generator: config.generator(),
            chunks,
            coord_sys,
        })
    }

    /// Shorthand for a procedural terrain with default tile and canvas size.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn with_seed(grid_size_x: usize, grid_size_y: usize, chunk_size: usize, seed: u64) -> TerrainResult<Self> {
        Self::new(&TerrainConfig::new(grid_size_x, grid_size_y, chunk_size, seed))
    }

    /// Chunks along X.
    #[must_use]
    pub const fn grid_size_x(&self) -> usize {
        self.grid_size_x
    }

    /// Chunks along Y.
    #[must_use]
    pub const fn grid_size_y(&self) -> usize {
        self.grid_size_y
    }

    /// Chunk edge length in tiles.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Tile edge length in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// World seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.generator.seed()
    }

    /// Generation mode.
    #[must_use]
    pub const fn mode(&self) -> GenerationMode {
        self.generator.mode()
    }

    /// The classifier used for pending chunks.
    #[must_use]
    pub const fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    /// Coordinate system aligned to this terrain.
    #[must_use]
    pub const fn coord_sys(&self) -> &CoordinateSystem {
        &self.coord_sys
    }

    /// Mutable coordinate system, for camera updates.
    pub fn coord_sys_mut(&mut self) -> &mut CoordinateSystem {
        &mut self.coord_sys
    }

    /// Total chunk count, `grid_size_x * grid_size_y`.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks generated so far.
    #[must_use]
    pub fn generated_chunk_count(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_generated()).count()
    }

    /// Width in tiles.
    #[must_use]
    pub const fn tile_width(&self) -> usize {
        self.grid_size_x * self.chunk_size
    }

    /// Height in tiles.
    #[must_use]
    pub const fn tile_height(&self) -> usize {
        self.grid_size_y * self.chunk_size
    }

    /// Returns true if the tile lies inside the terrain.
    #[must_use]
    pub fn in_bounds(&self, grid_x: i32, grid_y: i32) -> bool {
        grid_x >= 0 && grid_y >= 0 && (grid_x as usize) < self.tile_width() && (grid_y as usize) < self.tile_height()
    }

    /// Pixel size of the whole terrain.
    #[must_use]
    pub fn world_bounds(&self) -> WorldBounds {
        WorldBounds {
            width: self.tile_width() as f64 * self.tile_size,
            height: self.tile_height() as f64 * self.tile_size,
        }
    }

    fn locate(&self, grid_x: i32, grid_y: i32) -> Option<(ChunkCoord, usize, usize)> {
        if !self.in_bounds(grid_x, grid_y) {
            return None;
        }
        let coord = ChunkCoord::from_tile_pos(grid_x, grid_y, self.chunk_size);
        let (lx, ly) = ChunkCoord::local_offset(grid_x, grid_y, self.chunk_size);
        Some((coord, lx, ly))
    }

    fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(i64::from(coord.x), i64::from(coord.y)).ok()
    }

    /// Tile at a grid position, generating its chunk on first access.
    pub fn get_tile(&mut self, grid_x: i32, grid_y: i32) -> Option<&Tile> {
        let (coord, lx, ly) = self.locate(grid_x, grid_y)?;
        let generator = &self.generator;
        let chunk = self.chunks.get_mut(i64::from(coord.x), i64::from(coord.y)).ok()?;
        chunk.ensure_generated(generator).get(lx as i64, ly as i64).ok()
    }

    /// Material at a grid position, generating on first access.
    pub fn material_at(&mut self, grid_x: i32, grid_y: i32) -> Option<MaterialId> {
        self.get_tile(grid_x, grid_y).map(|t| t.material)
    }

    /// Tile at a grid position without generating anything.
    ///
    /// `None` for out-of-bounds tiles *and* for tiles in pending chunks.
    #[must_use]
    pub fn peek_tile(&self, grid_x: i32, grid_y: i32) -> Option<&Tile> {
        let (coord, lx, ly) = self.locate(grid_x, grid_y)?;
        self.chunks
            .get(i64::from(coord.x), i64::from(coord.y))
            .ok()?
            .get_local(lx, ly)
    }

    /// Paints a tile. Generates the owning chunk first so the paint is never
    /// overwritten by later generation.
    ///
    /// Returns false when the position is outside the terrain.
    pub fn set_tile(&mut self, grid_x: i32, grid_y: i32, material: MaterialId) -> bool {
        let Some((coord, lx, ly)) = self.locate(grid_x, grid_y) else {
            return false;
        };
        let generator = &self.generator;
        let Some(chunk) = self.chunks.get_mut(i64::from(coord.x), i64::from(coord.y)).ok() else {
            return false;
        };
        match chunk.ensure_generated(generator).get_mut(lx as i64, ly as i64) {
            Ok(tile) => {
                tile.material = material;
                true
            }
            Err(_) => false,
        }
    }

    /// Sets a tile's pathing weight. Returns false out of bounds.
    pub fn set_tile_weight(&mut self, grid_x: i32, grid_y: i32, weight: f32) -> bool {
        let Some((coord, lx, ly)) = self.locate(grid_x, grid_y) else {
            return false;
        };
        let generator = &self.generator;
        let Some(chunk) = self.chunks.get_mut(i64::from(coord.x), i64::from(coord.y)).ok() else {
            return false;
        };
        chunk
            .ensure_generated(generator)
            .get_mut(lx as i64, ly as i64)
            .map(|tile| tile.weight = weight)
            .is_ok()
    }

    /// Generates every pending chunk.
    pub fn generate_all(&mut self) {
        let generator = &self.generator;
        let mut generated = 0usize;
        for chunk in self.chunks.iter_mut() {
            if !chunk.is_generated() {
                chunk.ensure_generated(generator);
                generated += 1;
            }
        }
        debug!(generated, "generated remaining chunks");
    }

    /// Chunks in row-major chunk-grid order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Replaces a chunk's tiles wholesale. Used by importers.
    ///
    /// Returns false if the chunk does not exist or the grid has the wrong
    /// size.
    pub fn install_chunk(&mut self, coord: ChunkCoord, tiles: Grid<Tile>) -> bool {
        self.chunk_mut(coord).is_some_and(|chunk| chunk.install(tiles))
    }

    /// Every tile, chunk-major then row-major within each chunk.
    ///
    /// Generates all pending chunks first. This is the order used by the
    /// flat and run-length export encodings.
    pub fn tiles_in_export_order(&mut self) -> Vec<Tile> {
        self.generate_all();
        self.chunks
            .iter()
            .filter_map(Chunk::tiles)
            .flat_map(|tiles| tiles.iter().copied())
            .collect()
    }

    /// Tile under a screen pixel, via the terrain's coordinate system.
    pub fn tile_at_pixel(&mut self, px: f64, py: f64) -> Option<&Tile> {
        let GridPos { x, y } = self.coord_sys.pixel_to_grid(px, py);
        self.get_tile(x, y)
    }

    /// Feeds tiles to a renderer.
    ///
    /// `view` limits the walk to a tile rectangle (clamped to the terrain);
    /// `None` renders everything. Chunks in view are generated.
    pub fn render(&mut self, renderer: &mut impl TileRenderer, view: Option<TileBounds>) {
        let max_x = self.tile_width() as i32 - 1;
        let max_y = self.tile_height() as i32 - 1;
        let view = view.unwrap_or(TileBounds { min_x: 0, max_x, min_y: 0, max_y });
        let tile_size = self.tile_size;

        for y in view.min_y.max(0)..=view.max_y.min(max_y) {
            for x in view.min_x.max(0)..=view.max_x.min(max_x) {
                if let Some(tile) = self.get_tile(x, y) {
                    let material = tile.material;
                    renderer.draw_tile(material, f64::from(x) * tile_size, f64::from(y) * tile_size, tile_size);
                }
            }
        }
    }
}

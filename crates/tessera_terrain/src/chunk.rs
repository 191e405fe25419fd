//! # Chunk System
//!
//! World tiles are grouped into fixed-size square chunks. A chunk is the
//! unit of lazy generation: it starts [`ChunkState::Pending`] and becomes
//! [`ChunkState::Generated`] the first time anything touches one of its
//! tiles. It never goes back.
//!
//! ## Layout
//!
//! Tiles live in a [`Grid<Tile>`] indexed `y * size + x` in chunk-local
//! coordinates; each tile stores its *global* grid position.

use tracing::trace;

use crate::generator::TerrainGenerator;
use crate::grid::Grid;
use crate::tile::Tile;

/// Default chunk edge length in tiles.
pub const DEFAULT_CHUNK_SIZE: usize = 8;

/// Chunk coordinate (identifies a chunk in the chunk grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not tiles).
    pub x: i32,
    /// Y coordinate (in chunks, not tiles).
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing a global tile position.
    #[inline]
    #[must_use]
    pub const fn from_tile_pos(tile_x: i32, tile_y: i32, chunk_size: usize) -> Self {
        Self {
            x: tile_x.div_euclid(chunk_size as i32),
            y: tile_y.div_euclid(chunk_size as i32),
        }
    }

    /// Offset of a global tile position inside its chunk.
    #[inline]
    #[must_use]
    pub const fn local_offset(tile_x: i32, tile_y: i32, chunk_size: usize) -> (usize, usize) {
        (
            tile_x.rem_euclid(chunk_size as i32) as usize,
            tile_y.rem_euclid(chunk_size as i32) as usize,
        )
    }
}

/// Generation state of a chunk.
#[derive(Clone, Debug, PartialEq)]
pub enum ChunkState {
    /// Not generated yet; holds no tiles.
    Pending,
    /// All tiles populated.
    Generated(Grid<Tile>),
}

/// A square block of tiles.
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    size: usize,
    state: ChunkState,
}

impl Chunk {
    /// Creates a pending chunk.
    #[must_use]
    pub const fn new(coord: ChunkCoord, size: usize) -> Self {
        Self {
            coord,
            size,
            state: ChunkState::Pending,
        }
    }

    /// Position in the chunk grid.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Edge length in tiles.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Global tile coordinate of the chunk's top-left tile.
    #[inline]
    #[must_use]
    pub const fn world_position(&self) -> (i32, i32) {
        (
            self.coord.x * self.size as i32,
            self.coord.y * self.size as i32,
        )
    }

    /// Returns true once the chunk has tiles.
    #[inline]
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        matches!(self.state, ChunkState::Generated(_))
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &ChunkState {
        &self.state
    }

    /// Generates the chunk if pending and returns its tiles.
    ///
    /// Runs the generator exactly once per tile, the first time it is
    /// called; later calls return the stored grid untouched.
    pub fn ensure_generated(&mut self, generator: &TerrainGenerator) -> &mut Grid<Tile> {
        if let ChunkState::Pending = self.state {
            let (origin_x, origin_y) = self.world_position();
            let tiles = Grid::from_fn(self.size, self.size, |lx, ly| {
                let x = origin_x + lx as i32;
                let y = origin_y + ly as i32;
                Tile::new(x, y, generator.classify_material(x, y))
            });
            trace!(x = self.coord.x, y = self.coord.y, "chunk generated");
            self.state = ChunkState::Generated(tiles);
        }

        match &mut self.state {
            ChunkState::Generated(tiles) => tiles,
            ChunkState::Pending => unreachable!("chunk state set to generated above"),
        }
    }

    /// Installs tiles directly, marking the chunk generated.
    ///
    /// Used by importers replaying a snapshot. Returns false (and leaves the
    /// chunk alone) if the grid has the wrong size.
    pub fn install(&mut self, tiles: Grid<Tile>) -> bool {
        if tiles.width() != self.size || tiles.height() != self.size {
            return false;
        }
        self.state = ChunkState::Generated(tiles);
        true
    }

    /// Tile at chunk-local coordinates; `None` while pending.
    #[must_use]
    pub fn get_local(&self, local_x: usize, local_y: usize) -> Option<&Tile> {
        self.tiles()?.get(local_x as i64, local_y as i64).ok()
    }

    /// Mutable tile at chunk-local coordinates; `None` while pending.
    pub fn get_local_mut(&mut self, local_x: usize, local_y: usize) -> Option<&mut Tile> {
        match &mut self.state {
            ChunkState::Generated(tiles) => tiles.get_mut(local_x as i64, local_y as i64).ok(),
            ChunkState::Pending => None,
        }
    }

    /// Tiles of a generated chunk.
    #[must_use]
    pub fn tiles(&self) -> Option<&Grid<Tile>> {
        match &self.state {
            ChunkState::Generated(tiles) => Some(tiles),
            ChunkState::Pending => None,
        }
    }
}

//! # Sparse Terrain
//!
//! Storage for hand-authored levels: only painted tiles take memory,
//! everything else reads as the default material. No chunks, no noise.
//!
//! ## Bounds
//!
//! The reported world size is the smallest rectangle containing the canvas,
//! every painted tile and any explicit bounds the level declared. An
//! untouched terrain reports exactly the canvas size.

use std::collections::HashMap;

use crate::coords::PixelPos;
use crate::material::MaterialId;
use crate::render::TileRenderer;
use crate::tile::{Tile, TileBounds, WorldBounds};

/// Hash-map backed terrain for custom levels.
#[derive(Clone, Debug)]
pub struct SparseTerrain {
    tile_size: f64,
    default_material: MaterialId,
    canvas_size: PixelPos,
    explicit_bounds: Option<TileBounds>,
    painted_bounds: Option<TileBounds>,
    tiles: HashMap<(i32, i32), Tile>,
}

impl SparseTerrain {
    /// Creates an empty terrain.
    #[must_use]
    pub fn new(tile_size: f64, default_material: MaterialId, canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            tile_size,
            default_material,
            canvas_size: PixelPos::new(canvas_width, canvas_height),
            explicit_bounds: None,
            painted_bounds: None,
            tiles: HashMap::new(),
        }
    }

    /// Declares level bounds up front.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: TileBounds) -> Self {
        self.explicit_bounds = Some(bounds);
        self
    }

    /// Tile edge length in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Material of unpainted tiles.
    #[must_use]
    pub const fn default_material(&self) -> MaterialId {
        self.default_material
    }

    /// Canvas size in pixels.
    #[must_use]
    pub const fn canvas_size(&self) -> PixelPos {
        self.canvas_size
    }

    /// Updates the canvas size.
    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.canvas_size = PixelPos::new(width, height);
    }

    /// Number of painted tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns true if nothing is painted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Paints a tile, growing the bounds if needed.
    pub fn set_tile(&mut self, x: i32, y: i32, material: MaterialId) {
        self.tiles
            .entry((x, y))
            .and_modify(|tile| tile.material = material)
            .or_insert_with(|| Tile::new(x, y, material));
        self.painted_bounds = Some(match self.painted_bounds {
            Some(bounds) => bounds.including(x, y),
            None => TileBounds::single(x, y),
        });
    }

    /// Inserts a fully specified tile (keeps its weight).
    pub fn insert_tile(&mut self, tile: Tile) {
        self.set_tile(tile.x, tile.y, tile.material);
        if let Some(stored) = self.tiles.get_mut(&(tile.x, tile.y)) {
            stored.weight = tile.weight;
        }
    }

    /// Removes a painted tile, returning it. Bounds shrink to the remaining
    /// tiles.
    pub fn erase_tile(&mut self, x: i32, y: i32) -> Option<Tile> {
        let removed = self.tiles.remove(&(x, y))?;
        let on_edge = self
            .painted_bounds
            .is_some_and(|b| x == b.min_x || x == b.max_x || y == b.min_y || y == b.max_y);
        if on_edge {
            self.painted_bounds = self
                .tiles
                .keys()
                .fold(None, |acc: Option<TileBounds>, &(tx, ty)| {
                    Some(acc.map_or_else(|| TileBounds::single(tx, ty), |b| b.including(tx, ty)))
                });
        }
        Some(removed)
    }

    /// Tile at a position; unpainted positions get a synthesized default tile.
    #[must_use]
    pub fn get_tile(&self, x: i32, y: i32) -> Tile {
        self.tiles
            .get(&(x, y))
            .copied()
            .unwrap_or_else(|| Tile::new(x, y, self.default_material))
    }

    /// Painted tile at a position, if any.
    #[must_use]
    pub fn painted_tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.tiles.get(&(x, y))
    }

    /// Returns true if the position was painted.
    #[must_use]
    pub fn is_painted(&self, x: i32, y: i32) -> bool {
        self.tiles.contains_key(&(x, y))
    }

    /// Painted tiles in unspecified order.
    pub fn painted_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Painted tiles sorted row-major (y, then x), for stable output.
    #[must_use]
    pub fn painted_tiles_sorted(&self) -> Vec<Tile> {
        let mut tiles: Vec<Tile> = self.tiles.values().copied().collect();
        tiles.sort_by_key(|t| (t.y, t.x));
        tiles
    }

    /// Union of explicit and painted bounds, if either exists.
    #[must_use]
    pub fn bounds(&self) -> Option<TileBounds> {
        match (self.explicit_bounds, self.painted_bounds) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }

    /// Pixel size of the level, never smaller than the canvas.
    #[must_use]
    pub fn world_bounds(&self) -> WorldBounds {
        let canvas = WorldBounds {
            width: self.canvas_size.x,
            height: self.canvas_size.y,
        };
        match self.bounds() {
            None => canvas,
            Some(b) => WorldBounds {
                width: canvas.width.max(f64::from(b.width()) * self.tile_size),
                height: canvas.height.max(f64::from(b.height()) * self.tile_size),
            },
        }
    }

    /// Feeds tiles inside `view` to a renderer, defaults included.
    ///
    /// `None` renders only painted tiles.
    pub fn render(&self, renderer: &mut impl TileRenderer, view: Option<TileBounds>) {
        let size = self.tile_size;
        match view {
            Some(view) => {
                for y in view.min_y..=view.max_y {
                    for x in view.min_x..=view.max_x {
                        let tile = self.get_tile(x, y);
                        renderer.draw_tile(tile.material, f64::from(x) * size, f64::from(y) * size, size);
                    }
                }
            }
            None => {
                for tile in self.painted_tiles_sorted() {
                    renderer.draw_tile(tile.material, f64::from(tile.x) * size, f64::from(tile.y) * size, size);
                }
            }
        }
    }
}

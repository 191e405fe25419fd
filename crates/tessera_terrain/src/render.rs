//! Renderer seam.
//!
//! The terrain never draws. It walks the visible tiles and hands each one's
//! material and world rectangle to whatever implements [`TileRenderer`].

use crate::material::MaterialId;

/// Receives one call per visible tile.
pub trait TileRenderer {
    /// Draws a tile whose top-left corner is at `(world_x, world_y)` pixels.
    fn draw_tile(&mut self, material: MaterialId, world_x: f64, world_y: f64, tile_size: f64);
}

impl<F> TileRenderer for F
where
    F: FnMut(MaterialId, f64, f64, f64),
{
    fn draw_tile(&mut self, material: MaterialId, world_x: f64, world_y: f64, tile_size: f64) {
        self(material, world_x, world_y, tile_size);
    }
}

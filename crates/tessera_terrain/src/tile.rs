//! Tiles: the smallest addressable terrain cell.

use serde::{Deserialize, Serialize};

use crate::material::MaterialId;

/// A single terrain cell.
///
/// `x`/`y` are global grid coordinates, fixed once the tile is placed.
/// Only the material changes afterwards, through an explicit paint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Global grid X.
    pub x: i32,
    /// Global grid Y.
    pub y: i32,
    /// Material occupying the tile.
    pub material: MaterialId,
    /// Movement cost multiplier for pathing.
    #[serde(default = "Tile::default_weight")]
    pub weight: f32,
}

impl Tile {
    /// Weight of a freshly created tile.
    pub const DEFAULT_WEIGHT: f32 = 1.0;

    /// Creates a tile with the default weight.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, material: MaterialId) -> Self {
        Self {
            x,
            y,
            material,
            weight: Self::DEFAULT_WEIGHT,
        }
    }

    /// Sets the weight.
    #[inline]
    #[must_use]
    pub const fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Grid position as a pair.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    const fn default_weight() -> f32 {
        Self::DEFAULT_WEIGHT
    }
}

/// Inclusive rectangle of tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileBounds {
    /// Leftmost column.
    pub min_x: i32,
    /// Rightmost column.
    pub max_x: i32,
    /// Top row.
    pub min_y: i32,
    /// Bottom row.
    pub max_y: i32,
}

impl TileBounds {
    /// Bounds covering exactly one tile.
    #[must_use]
    pub const fn single(x: i32, y: i32) -> Self {
        Self { min_x: x, max_x: x, min_y: y, max_y: y }
    }

    /// Returns true if `(x, y)` is inside.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Grows the bounds to include `(x, y)`.
    #[must_use]
    pub fn including(self, x: i32, y: i32) -> Self {
        Self {
            min_x: self.min_x.min(x),
            max_x: self.max_x.max(x),
            min_y: self.min_y.min(y),
            max_y: self.max_y.max(y),
        }
    }

    /// Smallest bounds containing both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        self.including(other.min_x, other.min_y)
            .including(other.max_x, other.max_y)
    }

    /// Width in tiles, saturating at `u32::MAX` for the full `i32` range.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.max_x.abs_diff(self.min_x).saturating_add(1)
    }

    /// Height in tiles, saturating like [`width`](Self::width).
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.max_y.abs_diff(self.min_y).saturating_add(1)
    }
}

/// Pixel extent of a terrain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tile_has_unit_weight() {
        let tile = Tile::new(3, -2, MaterialId::Sand);
        assert_eq!(tile.weight, 1.0);
        assert_eq!(tile.position(), (3, -2));
        assert_eq!(tile.with_weight(2.5).weight, 2.5);
    }

    #[test]
    fn test_bounds_grow() {
        let bounds = TileBounds::single(0, 0).including(5, -3);
        assert_eq!(bounds, TileBounds { min_x: 0, max_x: 5, min_y: -3, max_y: 0 });
        assert_eq!(bounds.width(), 6);
        assert_eq!(bounds.height(), 4);
        assert!(bounds.contains(2, -1));
        assert!(!bounds.contains(6, 0));

        let merged = bounds.union(TileBounds::single(-2, 10));
        assert_eq!(merged, TileBounds { min_x: -2, max_x: 5, min_y: -3, max_y: 10 });
    }

    #[test]
    fn test_bounds_span_full_i32_range() {
        let bounds = TileBounds::single(i32::MIN, 0).including(i32::MAX, 1);
        assert_eq!(bounds.width(), u32::MAX);
        assert_eq!(bounds.height(), 2);

        let half = TileBounds::single(-1, 0).including(i32::MAX, 0);
        assert_eq!(half.width(), (1u32 << 31) + 1);
    }
}

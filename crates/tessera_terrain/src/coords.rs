//! # Coordinate Systems
//!
//! Three spaces meet here:
//!
//! - **Grid**: integer tile coordinates (`GridPos`).
//! - **World**: unscaled pixels, `grid * tile_size`.
//! - **Screen / backing canvas**: world pixels after camera pan, zoom and
//!   the alignment offset that centres a small terrain on a large canvas.
//!
//! ```text
//! screen = (world - camera_offset) * zoom + alignment
//! world  = (screen - alignment) / zoom + camera_offset
//! grid   = floor(world / tile_size)
//! ```
//!
//! Every division floors toward negative infinity, so pixel `-10` is in
//! tile `-1`, never tile `0`.

use serde::{Deserialize, Serialize};

/// Integer tile coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPos {
    /// Creates a grid position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Pixel coordinates (world or screen, depending on context).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPos {
    /// Horizontal pixel.
    pub x: f64,
    /// Vertical pixel.
    pub y: f64,
}

impl PixelPos {
    /// Creates a pixel position.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Tolerance used to snap values that float arithmetic left a hair below an
/// integer tile border.
const SNAP_EPSILON: f64 = 1e-9;

/// Floors `value / divisor` toward negative infinity.
///
/// Quotients within `1e-9` of an integer snap to it, which keeps
/// `pixel_to_grid(grid_to_pixel(p)) == p` under any zoom. The snap is
/// symmetric: a value that far below a border lands on the tile above it,
/// so `floor_div(-1e-10, 32.0)` is `0`, not `-1`.
#[inline]
#[must_use]
pub fn floor_div(value: f64, divisor: f64) -> i32 {
    let q = value / divisor;
    let nearest = q.round();
    if (q - nearest).abs() < SNAP_EPSILON {
        nearest as i32
    } else {
        q.floor() as i32
    }
}

/// Camera-aware conversions between grid, world and canvas space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    tile_size: f64,
    canvas_size: PixelPos,
    camera_offset: PixelPos,
    camera_zoom: f64,
    alignment_offset: PixelPos,
    render_conversion: PixelPos,
}

impl CoordinateSystem {
    /// Creates a coordinate system with an identity camera.
    #[must_use]
    pub const fn new(tile_size: f64, canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            tile_size,
            canvas_size: PixelPos::new(canvas_width, canvas_height),
            camera_offset: PixelPos::new(0.0, 0.0),
            camera_zoom: 1.0,
            alignment_offset: PixelPos::new(0.0, 0.0),
            render_conversion: PixelPos::new(0.0, 0.0),
        }
    }

    /// Tile edge length in world pixels.
    #[inline]
    #[must_use]
    pub const fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Canvas size in screen pixels.
    #[inline]
    #[must_use]
    pub const fn canvas_size(&self) -> PixelPos {
        self.canvas_size
    }

    /// Camera offset in world pixels.
    #[inline]
    #[must_use]
    pub const fn camera_offset(&self) -> PixelPos {
        self.camera_offset
    }

    /// Camera zoom factor.
    #[inline]
    #[must_use]
    pub const fn camera_zoom(&self) -> f64 {
        self.camera_zoom
    }

    /// Alignment offset in screen pixels.
    #[inline]
    #[must_use]
    pub const fn alignment_offset(&self) -> PixelPos {
        self.alignment_offset
    }

    /// Fixed grid-to-backing-canvas offset computed by
    /// [`align_to_terrain`](Self::align_to_terrain).
    #[inline]
    #[must_use]
    pub const fn render_conversion(&self) -> PixelPos {
        self.render_conversion
    }

    /// Updates camera pan and zoom. Non-positive zoom is ignored.
    pub fn set_camera(&mut self, offset: PixelPos, zoom: f64) {
        self.camera_offset = offset;
        if zoom > 0.0 {
            self.camera_zoom = zoom;
        }
    }

    /// Updates the canvas size (e.g. on window resize).
    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.canvas_size = PixelPos::new(width, height);
    }

    /// Centres a terrain of the given pixel size on the canvas.
    ///
    /// Axes where the terrain is at least as large as the canvas get no
    /// offset. Computed once at terrain creation so per-frame backing-canvas
    /// conversions are a single add.
    pub fn align_to_terrain(&mut self, terrain_width: f64, terrain_height: f64) {
        let centre = |canvas: f64, terrain: f64| ((canvas - terrain) / 2.0).max(0.0).floor();
        self.alignment_offset = PixelPos::new(
            centre(self.canvas_size.x, terrain_width),
            centre(self.canvas_size.y, terrain_height),
        );
        self.render_conversion = self.alignment_offset;
    }

    /// Top-left screen pixel of a grid cell.
    #[must_use]
    pub fn grid_to_pixel(&self, grid_x: i32, grid_y: i32) -> PixelPos {
        let zoom = self.camera_zoom;
        PixelPos::new(
            f64::from(grid_x) * self.tile_size * zoom - self.camera_offset.x * zoom + self.alignment_offset.x,
            f64::from(grid_y) * self.tile_size * zoom - self.camera_offset.y * zoom + self.alignment_offset.y,
        )
    }

    /// Centre screen pixel of a grid cell.
    #[must_use]
    pub fn grid_to_pixel_center(&self, grid_x: i32, grid_y: i32) -> PixelPos {
        let corner = self.grid_to_pixel(grid_x, grid_y);
        let half = self.tile_size * self.camera_zoom / 2.0;
        PixelPos::new(corner.x + half, corner.y + half)
    }

    /// Grid cell under a screen pixel.
    #[must_use]
    pub fn pixel_to_grid(&self, px: f64, py: f64) -> GridPos {
        let world = self.screen_to_world(px, py);
        self.world_to_grid(world.x, world.y)
    }

    /// Screen pixel to world pixel (undoes alignment, zoom and pan).
    #[must_use]
    pub fn screen_to_world(&self, px: f64, py: f64) -> PixelPos {
        PixelPos::new(
            (px - self.alignment_offset.x) / self.camera_zoom + self.camera_offset.x,
            (py - self.alignment_offset.y) / self.camera_zoom + self.camera_offset.y,
        )
    }

    /// World pixel to screen pixel.
    #[must_use]
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> PixelPos {
        PixelPos::new(
            (wx - self.camera_offset.x) * self.camera_zoom + self.alignment_offset.x,
            (wy - self.camera_offset.y) * self.camera_zoom + self.alignment_offset.y,
        )
    }

    /// Grid cell containing a world pixel (camera-independent).
    #[must_use]
    pub fn world_to_grid(&self, wx: f64, wy: f64) -> GridPos {
        GridPos::new(floor_div(wx, self.tile_size), floor_div(wy, self.tile_size))
    }

    /// Top-left world pixel of a grid cell (camera-independent).
    #[must_use]
    pub fn grid_to_world(&self, grid_x: i32, grid_y: i32) -> PixelPos {
        PixelPos::new(f64::from(grid_x) * self.tile_size, f64::from(grid_y) * self.tile_size)
    }

    /// Grid position to backing-canvas pixel, using the fixed render
    /// conversion.
    #[must_use]
    pub fn conv_pos_to_backing_canvas(&self, pos: GridPos) -> PixelPos {
        let world = self.grid_to_world(pos.x, pos.y);
        PixelPos::new(world.x + self.render_conversion.x, world.y + self.render_conversion.y)
    }

    /// Backing-canvas pixel back to a grid position.
    #[must_use]
    pub fn conv_backing_canvas_to_pos(&self, canvas: PixelPos) -> GridPos {
        self.world_to_grid(canvas.x - self.render_conversion.x, canvas.y - self.render_conversion.y)
    }
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self::new(32.0, 800.0, 600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_div_negative() {
        assert_eq!(floor_div(-10.0, 32.0), -1);
        assert_eq!(floor_div(-32.0, 32.0), -1);
        assert_eq!(floor_div(-33.0, 32.0), -2);
        assert_eq!(floor_div(31.9, 32.0), 0);
        assert_eq!(floor_div(32.0, 32.0), 1);
    }

    #[test]
    fn test_floor_div_snaps_both_sides_of_border() {
        assert_eq!(floor_div(64.0 - 1e-8, 32.0), 2);
        assert_eq!(floor_div(-1e-10, 32.0), 0);
        assert_eq!(floor_div(-1e-3, 32.0), -1);
        assert_eq!(floor_div(32.0 + 1e-8, 32.0), 1);
    }

    #[test]
    fn test_round_trip_identity_cam() {
        let cs = CoordinateSystem::new(32.0, 800.0, 600.0);
        for y in -10..10 {
            for x in -10..10 {
                let p = cs.grid_to_pixel(x, y);
                assert_eq!(cs.pixel_to_grid(p.x, p.y), GridPos::new(x, y));
            }
        }
    }

    #[test]
    fn test_round_trip_with_pan_and_zoom() {
        let mut cs = CoordinateSystem::new(32.0, 800.0, 600.0);
        cs.align_to_terrain(256.0, 256.0);
        for zoom in [0.1, 0.5, 1.0, 1.3, 2.0, 3.7] {
            cs.set_camera(PixelPos::new(-117.5, 44.25), zoom);
            for y in -16..16 {
                for x in -16..16 {
                    let p = cs.grid_to_pixel(x, y);
                    assert_eq!(cs.pixel_to_grid(p.x, p.y), GridPos::new(x, y), "zoom {zoom} cell ({x}, {y})");
                    let c = cs.grid_to_pixel_center(x, y);
                    assert_eq!(cs.pixel_to_grid(c.x, c.y), GridPos::new(x, y));
                }
            }
        }
    }

    #[test]
    fn test_grid_to_pixel_formula() {
        let mut cs = CoordinateSystem::new(32.0, 800.0, 600.0);
        cs.set_camera(PixelPos::new(10.0, 20.0), 2.0);
        let p = cs.grid_to_pixel(3, 4);
        assert_eq!(p, PixelPos::new(3.0 * 32.0 * 2.0 - 20.0, 4.0 * 32.0 * 2.0 - 40.0));
    }

    #[test]
    fn test_alignment_centres_small_terrain() {
        let mut cs = CoordinateSystem::new(32.0, 800.0, 600.0);
        cs.align_to_terrain(256.0, 1024.0);
        assert_eq!(cs.alignment_offset(), PixelPos::new(272.0, 0.0));
        assert_eq!(cs.render_conversion(), PixelPos::new(272.0, 0.0));

        let canvas = cs.conv_pos_to_backing_canvas(GridPos::new(2, 3));
        assert_eq!(canvas, PixelPos::new(272.0 + 64.0, 96.0));
        assert_eq!(cs.conv_backing_canvas_to_pos(canvas), GridPos::new(2, 3));
    }

    #[test]
    fn test_screen_world_inverse() {
        let mut cs = CoordinateSystem::default();
        cs.set_camera(PixelPos::new(50.0, -25.0), 1.5);
        let world = cs.screen_to_world(300.0, 120.0);
        let screen = cs.world_to_screen(world.x, world.y);
        assert!((screen.x - 300.0).abs() < 1e-9);
        assert!((screen.y - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_zoom_ignored() {
        let mut cs = CoordinateSystem::default();
        cs.set_camera(PixelPos::new(1.0, 1.0), 0.0);
        assert_eq!(cs.camera_zoom(), 1.0);
    }
}

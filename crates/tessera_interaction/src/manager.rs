//! # Tile Interaction Manager
//!
//! Spatial index from tile to the objects standing on it, plus a priority
//! list of UI elements, and the click dispatch that walks both.
//!
//! ## Invariants
//!
//! - A bucket never holds the same object twice (identity, not equality).
//! - Every bucket is sorted by descending z-index.
//! - Empty buckets are removed, so the map size is the occupied tile count.
//! - UI elements are sorted by descending priority and always see a click
//!   before any world object.
//!
//! ## Reentrancy
//!
//! Dispatch holds `&mut self`, so callbacks cannot reach the manager. A click
//! that should add or remove objects queues the change for the caller to
//! apply once dispatch returns. Buckets and the UI list are still cloned (as
//! `Rc` handles) before callbacks run, so a callback may drop its own
//! handles freely.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tessera_terrain::coords::{floor_div, GridPos};
use tracing::{debug, trace};

use crate::input::MouseButton;
use crate::object::{EmptyTileHandler, TileObject, UiElement};

/// Tile under a pixel and that tile's centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileHit {
    /// Tile X (may be negative).
    pub tile_x: i32,
    /// Tile Y (may be negative).
    pub tile_y: i32,
    /// Centre X in pixels.
    pub center_x: f64,
    /// Centre Y in pixels.
    pub center_y: f64,
}

impl TileHit {
    /// Tile coordinates as a grid position.
    #[must_use]
    pub const fn grid_pos(&self) -> GridPos {
        GridPos::new(self.tile_x, self.tile_y)
    }
}

/// Result of [`TileInteractionManager::handle_mouse_click`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClickOutcome {
    /// A world object took the click.
    pub entity_clicked: bool,
    /// A UI element took the click; nothing else saw it.
    pub ui_consumed: bool,
    /// Centre of the clicked tile, if the click landed on a valid tile.
    pub tile_center: Option<(f64, f64)>,
}

/// Snapshot of index sizes for overlays and logs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebugInfo {
    /// Tile edge length in pixels.
    pub tile_size: f64,
    /// Grid width in tiles.
    pub grid_width: i32,
    /// Grid height in tiles.
    pub grid_height: i32,
    /// Tiles with at least one object.
    pub occupied_tiles: usize,
    /// Object registrations summed over all buckets.
    pub total_registrations: usize,
    /// Registered UI elements.
    pub ui_elements: usize,
}

type Bucket = Vec<Rc<dyn TileObject>>;

/// Tile-to-object index with UI-first click dispatch.
///
/// `H` handles clicks on valid tiles that no object took.
pub struct TileInteractionManager<H: EmptyTileHandler = ()> {
    tile_size: f64,
    grid_width: i32,
    grid_height: i32,
    tile_map: HashMap<(i32, i32), Bucket>,
    ui_elements: Vec<(Rc<dyn UiElement>, i32)>,
    empty_tile_handler: H,
}

impl TileInteractionManager<()> {
    /// Manager for a `grid_width` x `grid_height` tile world.
    #[must_use]
    pub fn new(tile_size: f64, grid_width: i32, grid_height: i32) -> Self {
        Self::with_handler(tile_size, grid_width, grid_height, ())
    }
}

impl<H: EmptyTileHandler> TileInteractionManager<H> {
    /// Manager with a handler for empty-tile clicks.
    #[must_use]
    pub fn with_handler(tile_size: f64, grid_width: i32, grid_height: i32, handler: H) -> Self {
        Self {
            tile_size,
            grid_width,
            grid_height,
            tile_map: HashMap::new(),
            ui_elements: Vec::new(),
            empty_tile_handler: handler,
        }
    }

    /// Tile edge length in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// The empty-tile handler.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.empty_tile_handler
    }

    /// The empty-tile handler, mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.empty_tile_handler
    }

    /// Tile under a pixel. Floors toward negative infinity, so `(-10, -20)`
    /// is tile `(-1, -1)`.
    #[must_use]
    pub fn pixel_to_tile(&self, px: f64, py: f64) -> TileHit {
        let tile_x = floor_div(px, self.tile_size);
        let tile_y = floor_div(py, self.tile_size);
        let half = self.tile_size / 2.0;
        TileHit {
            tile_x,
            tile_y,
            center_x: f64::from(tile_x) * self.tile_size + half,
            center_y: f64::from(tile_y) * self.tile_size + half,
        }
    }

    /// Returns true if the tile lies inside the grid.
    #[must_use]
    pub const fn is_valid_tile(&self, tile_x: i32, tile_y: i32) -> bool {
        tile_x >= 0 && tile_y >= 0 && tile_x < self.grid_width && tile_y < self.grid_height
    }

    /// Registers an object on a tile.
    ///
    /// Invalid tiles and repeat registrations are ignored. Returns true if the
    /// object was added.
    pub fn add_object_to_tile(&mut self, obj: &Rc<dyn TileObject>, tile_x: i32, tile_y: i32) -> bool {
        if !self.is_valid_tile(tile_x, tile_y) {
            return false;
        }
        let bucket = self.tile_map.entry((tile_x, tile_y)).or_default();
        if bucket.iter().any(|o| Rc::ptr_eq(o, obj)) {
            return false;
        }
        bucket.push(Rc::clone(obj));
        // stable: equal z keeps insertion order
        bucket.sort_by_key(|o| std::cmp::Reverse(o.z_index()));
        trace!(tile_x, tile_y, len = bucket.len(), "object added to tile");
        true
    }

    /// Unregisters an object from a tile. Returns true if it was there.
    pub fn remove_object_from_tile(&mut self, obj: &Rc<dyn TileObject>, tile_x: i32, tile_y: i32) -> bool {
        let Some(bucket) = self.tile_map.get_mut(&(tile_x, tile_y)) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|o| !Rc::ptr_eq(o, obj));
        let removed = bucket.len() != before;
        if bucket.is_empty() {
            self.tile_map.remove(&(tile_x, tile_y));
        }
        removed
    }

    /// Moves an object between tiles. `old = None` means it had no prior
    /// registration.
    pub fn update_object_position(&mut self, obj: &Rc<dyn TileObject>, old: Option<(i32, i32)>, new: (i32, i32)) -> bool {
        if let Some((x, y)) = old {
            self.remove_object_from_tile(obj, x, y);
        }
        self.add_object_to_tile(obj, new.0, new.1)
    }

    /// Registers an object on the tile under its [`position`](TileObject::position).
    pub fn add_object(&mut self, obj: &Rc<dyn TileObject>) -> bool {
        let (px, py) = obj.position();
        let hit = self.pixel_to_tile(px, py);
        self.add_object_to_tile(obj, hit.tile_x, hit.tile_y)
    }

    /// Removes an object from every tile. Returns how many buckets held it.
    pub fn remove_object(&mut self, obj: &Rc<dyn TileObject>) -> usize {
        let mut removed = 0;
        self.tile_map.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|o| !Rc::ptr_eq(o, obj));
            removed += before - bucket.len();
            !bucket.is_empty()
        });
        removed
    }

    /// Objects on a tile, highest z first.
    #[must_use]
    pub fn objects_at_tile(&self, tile_x: i32, tile_y: i32) -> &[Rc<dyn TileObject>] {
        self.tile_map.get(&(tile_x, tile_y)).map_or(&[], Vec::as_slice)
    }

    /// Objects on the tile under a pixel, highest z first.
    #[must_use]
    pub fn objects_at_pixel(&self, px: f64, py: f64) -> &[Rc<dyn TileObject>] {
        let hit = self.pixel_to_tile(px, py);
        self.objects_at_tile(hit.tile_x, hit.tile_y)
    }

    /// Adds a UI element. Higher priority is tested first; equal priorities
    /// keep registration order.
    pub fn register_ui_element(&mut self, element: &Rc<dyn UiElement>, priority: i32) {
        if self.ui_elements.iter().any(|(e, _)| Rc::ptr_eq(e, element)) {
            return;
        }
        let at = self.ui_elements.partition_point(|(_, p)| *p >= priority);
        self.ui_elements.insert(at, (Rc::clone(element), priority));
    }

    /// Removes a UI element. Returns true if it was registered.
    pub fn unregister_ui_element(&mut self, element: &Rc<dyn UiElement>) -> bool {
        let before = self.ui_elements.len();
        self.ui_elements.retain(|(e, _)| !Rc::ptr_eq(e, element));
        self.ui_elements.len() != before
    }

    /// Dispatches a click: UI elements, then the tile's objects by z-order,
    /// then the empty-tile handler.
    pub fn handle_mouse_click(&mut self, px: f64, py: f64, button: MouseButton) -> ClickOutcome {
        let ui: Vec<Rc<dyn UiElement>> = self.ui_elements.iter().map(|(e, _)| Rc::clone(e)).collect();
        if ui.iter().any(|e| e.contains_point(px, py) && e.handle_click(px, py, button)) {
            trace!(px, py, "click consumed by ui");
            return ClickOutcome {
                ui_consumed: true,
                ..ClickOutcome::default()
            };
        }

        let hit = self.pixel_to_tile(px, py);
        if !self.is_valid_tile(hit.tile_x, hit.tile_y) {
            return ClickOutcome::default();
        }

        let bucket: Bucket = self.objects_at_tile(hit.tile_x, hit.tile_y).to_vec();
        let entity_clicked = bucket.iter().any(|o| o.handle_click(px, py, button));
        if !entity_clicked {
            self.empty_tile_handler.handle_tile_click(hit, button);
        }

        ClickOutcome {
            entity_clicked,
            ui_consumed: false,
            tile_center: Some((hit.center_x, hit.center_y)),
        }
    }

    /// Offers a release to the controllers of objects under the pixel until
    /// one consumes it.
    pub fn handle_mouse_release(&mut self, px: f64, py: f64, button: MouseButton) -> bool {
        let bucket: Bucket = self.objects_at_pixel(px, py).to_vec();
        bucket.iter().any(|o| {
            o.interaction_controller()
                .is_some_and(|c| c.handle_mouse_release(px, py, button))
        })
    }

    /// Index sizes.
    #[must_use]
    pub fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            tile_size: self.tile_size,
            grid_width: self.grid_width,
            grid_height: self.grid_height,
            occupied_tiles: self.tile_map.len(),
            total_registrations: self.tile_map.values().map(Vec::len).sum(),
            ui_elements: self.ui_elements.len(),
        }
    }

    /// Drops every object and UI registration.
    pub fn clear(&mut self) {
        debug!(
            occupied = self.tile_map.len(),
            ui = self.ui_elements.len(),
            "interaction index cleared"
        );
        self.tile_map.clear();
        self.ui_elements.clear();
    }
}

impl<H: EmptyTileHandler> fmt::Debug for TileInteractionManager<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileInteractionManager")
            .field("info", &self.debug_info())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Unit {
        z: i32,
        pos: (f64, f64),
        takes_clicks: bool,
        clicks: Cell<u32>,
    }

    impl Unit {
        fn new(z: i32, takes_clicks: bool) -> Rc<Self> {
            Rc::new(Self {
                z,
                pos: (0.0, 0.0),
                takes_clicks,
                clicks: Cell::new(0),
            })
        }
    }

    impl TileObject for Unit {
        fn z_index(&self) -> i32 {
            self.z
        }

        fn position(&self) -> (f64, f64) {
            self.pos
        }

        fn handle_click(&self, _px: f64, _py: f64, _button: MouseButton) -> bool {
            self.clicks.set(self.clicks.get() + 1);
            self.takes_clicks
        }
    }

    fn as_obj(unit: &Rc<Unit>) -> Rc<dyn TileObject> {
        Rc::clone(unit) as Rc<dyn TileObject>
    }

    #[test]
    fn test_pixel_to_tile() {
        let m = TileInteractionManager::new(32.0, 20, 15);
        assert_eq!(
            m.pixel_to_tile(50.0, 50.0),
            TileHit { tile_x: 1, tile_y: 1, center_x: 48.0, center_y: 48.0 }
        );
        let neg = m.pixel_to_tile(-10.0, -20.0);
        assert_eq!((neg.tile_x, neg.tile_y), (-1, -1));
        assert_eq!((neg.center_x, neg.center_y), (-16.0, -16.0));
        assert_eq!(m.pixel_to_tile(32.0, 0.0).tile_x, 1);
    }

    #[test]
    fn test_bucket_sorted_and_unique() {
        let mut m = TileInteractionManager::new(32.0, 20, 15);
        let low = as_obj(&Unit::new(1, true));
        let high = as_obj(&Unit::new(9, true));
        let mid = as_obj(&Unit::new(5, true));

        assert!(m.add_object_to_tile(&low, 2, 2));
        assert!(m.add_object_to_tile(&high, 2, 2));
        assert!(m.add_object_to_tile(&mid, 2, 2));
        assert!(!m.add_object_to_tile(&mid, 2, 2));

        let zs: Vec<i32> = m.objects_at_tile(2, 2).iter().map(|o| o.z_index()).collect();
        assert_eq!(zs, vec![9, 5, 1]);
    }

    #[test]
    fn test_invalid_tiles_rejected() {
        let mut m = TileInteractionManager::new(32.0, 20, 15);
        let obj = as_obj(&Unit::new(0, true));
        assert!(!m.add_object_to_tile(&obj, -1, 0));
        assert!(!m.add_object_to_tile(&obj, 20, 0));
        assert!(!m.add_object_to_tile(&obj, 0, 15));
        assert_eq!(m.debug_info().occupied_tiles, 0);
    }

    #[test]
    fn test_empty_buckets_removed() {
        let mut m = TileInteractionManager::new(32.0, 20, 15);
        let obj = as_obj(&Unit::new(0, true));
        m.add_object_to_tile(&obj, 3, 4);
        assert_eq!(m.debug_info().occupied_tiles, 1);
        assert!(m.remove_object_from_tile(&obj, 3, 4));
        assert_eq!(m.debug_info().occupied_tiles, 0);
        assert!(!m.remove_object_from_tile(&obj, 3, 4));
    }

    #[test]
    fn test_update_position() {
        let mut m = TileInteractionManager::new(32.0, 20, 15);
        let obj = as_obj(&Unit::new(0, true));
        assert!(m.update_object_position(&obj, None, (1, 1)));
        assert!(m.update_object_position(&obj, Some((1, 1)), (2, 1)));
        assert!(m.objects_at_tile(1, 1).is_empty());
        assert_eq!(m.objects_at_tile(2, 1).len(), 1);
        assert_eq!(m.debug_info().occupied_tiles, 1);
    }

    #[test]
    fn test_remove_object_everywhere() {
        let mut m = TileInteractionManager::new(32.0, 20, 15);
        let big = as_obj(&Unit::new(0, true));
        let other = as_obj(&Unit::new(0, true));
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            m.add_object_to_tile(&big, x, y);
        }
        m.add_object_to_tile(&other, 1, 1);
        assert_eq!(m.remove_object(&big), 4);
        let info = m.debug_info();
        assert_eq!(info.occupied_tiles, 1);
        assert_eq!(info.total_registrations, 1);
    }

    #[test]
    fn test_click_goes_to_highest_taker() {
        let mut m = TileInteractionManager::new(32.0, 20, 15);
        let passive = Unit::new(10, false);
        let taker = Unit::new(5, true);
        let hidden = Unit::new(1, true);
        for u in [&passive, &taker, &hidden] {
            m.add_object_to_tile(&as_obj(u), 1, 1);
        }

        let outcome = m.handle_mouse_click(40.0, 40.0, MouseButton::Left);
        assert!(outcome.entity_clicked);
        assert_eq!(outcome.tile_center, Some((48.0, 48.0)));
        assert_eq!(passive.clicks.get(), 1);
        assert_eq!(taker.clicks.get(), 1);
        assert_eq!(hidden.clicks.get(), 0);
    }

    #[test]
    fn test_click_outside_grid() {
        let mut m = TileInteractionManager::new(32.0, 20, 15);
        let outcome = m.handle_mouse_click(-5.0, 10.0, MouseButton::Left);
        assert_eq!(outcome, ClickOutcome::default());
    }

    #[test]
    fn test_empty_tile_handler() {
        let mut placed = Vec::new();
        {
            let mut m = TileInteractionManager::with_handler(32.0, 20, 15, |hit: TileHit, _b: MouseButton| {
                placed.push(hit.grid_pos());
                true
            });
            let outcome = m.handle_mouse_click(70.0, 5.0, MouseButton::Right);
            assert!(!outcome.entity_clicked);
            assert_eq!(outcome.tile_center, Some((80.0, 16.0)));
        }
        assert_eq!(placed, vec![GridPos::new(2, 0)]);
    }
}

//! Traits implemented by things the pointer can hit.
//!
//! Everything is called through `&self`; implementors that change state on a
//! click keep it in a `Cell` or `RefCell`.

use crate::input::MouseButton;
use crate::manager::TileHit;

/// A world object registered on one or more tiles.
pub trait TileObject {
    /// Ordering key within a tile. Higher values are offered clicks first.
    fn z_index(&self) -> i32 {
        0
    }

    /// Pixel position used by [`add_object`](crate::TileInteractionManager::add_object).
    fn position(&self) -> (f64, f64);

    /// Offers a click. Returns true if the object took it.
    fn handle_click(&self, px: f64, py: f64, button: MouseButton) -> bool;

    /// Drag/press controller that wants release events.
    fn interaction_controller(&self) -> Option<&dyn InteractionController> {
        None
    }
}

/// Receives pointer releases on behalf of a [`TileObject`].
pub trait InteractionController {
    /// Returns true if the release was consumed.
    fn handle_mouse_release(&self, px: f64, py: f64, button: MouseButton) -> bool;
}

/// Screen-space UI element that sits above the world.
pub trait UiElement {
    /// Hit test in screen pixels.
    fn contains_point(&self, px: f64, py: f64) -> bool;

    /// Offers a click already known to be inside the element.
    fn handle_click(&self, px: f64, py: f64, button: MouseButton) -> bool;
}

/// Fallback for clicks on a valid tile no object took.
pub trait EmptyTileHandler {
    /// Returns true if the click did something (e.g. placed an object).
    fn handle_tile_click(&mut self, hit: TileHit, button: MouseButton) -> bool;
}

impl EmptyTileHandler for () {
    fn handle_tile_click(&mut self, _hit: TileHit, _button: MouseButton) -> bool {
        false
    }
}

impl<F> EmptyTileHandler for F
where
    F: FnMut(TileHit, MouseButton) -> bool,
{
    fn handle_tile_click(&mut self, hit: TileHit, button: MouseButton) -> bool {
        self(hit, button)
    }
}

//! # Tessera Interaction
//!
//! Pointer dispatch for tile worlds.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  CLICK PIPELINE                       │
//! ├──────────────────────────────────────────────────────┤
//! │  UI elements → Tile under pixel → Objects by z → Hook │
//! │  (priority)     (floor division)   (first taker)      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! UI always wins. A world object only sees a click no UI element took.
//!
//! Objects are shared as `Rc<dyn TileObject>` and compared by identity. The
//! manager is single-threaded by construction.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod input;
pub mod manager;
pub mod object;

pub use input::MouseButton;
pub use manager::{ClickOutcome, DebugInfo, TileHit, TileInteractionManager};
pub use object::{EmptyTileHandler, InteractionController, TileObject, UiElement};

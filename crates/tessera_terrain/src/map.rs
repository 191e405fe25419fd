//! # Map Registry
//!
//! Owns every loaded level and which one is active. Callers hold a
//! [`MapManager`] and go through it instead of sharing a global terrain.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::chunked::ChunkedTerrain;
use crate::error::{TerrainError, TerrainResult, ValidationIssue};
use crate::export::{ExportOptions, TerrainExporter, TerrainSnapshot};
use crate::material::MaterialId;
use crate::render::TileRenderer;
use crate::sparse::SparseTerrain;
use crate::tile::{Tile, TileBounds, WorldBounds};

/// Either terrain flavour behind one interface.
pub enum MapTerrain {
    /// Procedural, chunk-paged terrain.
    Chunked(ChunkedTerrain),
    /// Hand-authored sparse terrain.
    Sparse(SparseTerrain),
}

impl MapTerrain {
    /// Tile at a grid position. Sparse maps always answer; chunked maps
    /// answer `None` outside their extent.
    pub fn get_tile(&mut self, x: i32, y: i32) -> Option<Tile> {
        match self {
            Self::Chunked(t) => t.get_tile(x, y).copied(),
            Self::Sparse(t) => Some(t.get_tile(x, y)),
        }
    }

    /// Paints a tile. Returns false if the position is outside the map.
    pub fn set_tile(&mut self, x: i32, y: i32, material: MaterialId) -> bool {
        match self {
            Self::Chunked(t) => t.set_tile(x, y, material),
            Self::Sparse(t) => {
                t.set_tile(x, y, material);
                true
            }
        }
    }

    /// Pixel size of the map.
    #[must_use]
    pub fn world_bounds(&self) -> WorldBounds {
        match self {
            Self::Chunked(t) => t.world_bounds(),
            Self::Sparse(t) => t.world_bounds(),
        }
    }

    /// Tile edge length in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> f64 {
        match self {
            Self::Chunked(t) => t.tile_size(),
            Self::Sparse(t) => t.tile_size(),
        }
    }

    /// Snapshot of the map.
    pub fn export(&mut self, options: &ExportOptions) -> TerrainSnapshot {
        match self {
            Self::Chunked(t) => TerrainExporter::export_chunked(t, options),
            Self::Sparse(t) => TerrainExporter::export_sparse(t, options),
        }
    }

    /// Feeds tiles to a renderer.
    pub fn render(&mut self, renderer: &mut impl TileRenderer, view: Option<TileBounds>) {
        match self {
            Self::Chunked(t) => t.render(renderer, view),
            Self::Sparse(t) => t.render(renderer, view),
        }
    }

    /// Short kind name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Chunked(_) => "chunked",
            Self::Sparse(_) => "sparse",
        }
    }
}

/// Registry of loaded maps with one optional active map.
pub struct MapManager {
    canvas_width: f64,
    canvas_height: f64,
    maps: HashMap<String, MapTerrain>,
    active: Option<String>,
}

impl MapManager {
    /// Empty registry. Sparse levels it loads use this canvas size.
    #[must_use]
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            canvas_width,
            canvas_height,
            maps: HashMap::new(),
            active: None,
        }
    }

    /// Number of registered maps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Returns true if no map is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Registers a map, returning the one it replaced.
    pub fn register(&mut self, map_id: impl Into<String>, terrain: MapTerrain) -> Option<MapTerrain> {
        self.maps.insert(map_id.into(), terrain)
    }

    /// Removes a map. Removing the active map leaves nothing active.
    pub fn remove(&mut self, map_id: &str) -> Option<MapTerrain> {
        if self.active.as_deref() == Some(map_id) {
            self.active = None;
        }
        self.maps.remove(map_id)
    }

    /// Map by id.
    #[must_use]
    pub fn get(&self, map_id: &str) -> Option<&MapTerrain> {
        self.maps.get(map_id)
    }

    /// Makes a registered map active.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::MapNotFound`] if no map has this id.
    pub fn set_active(&mut self, map_id: &str) -> TerrainResult<()> {
        if !self.maps.contains_key(map_id) {
            return Err(TerrainError::MapNotFound(map_id.to_string()));
        }
        self.active = Some(map_id.to_string());
        Ok(())
    }

    /// Id of the active map.
    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The active map.
    #[must_use]
    pub fn active(&self) -> Option<&MapTerrain> {
        self.active.as_ref().and_then(|id| self.maps.get(id))
    }

    /// The active map, mutably.
    pub fn active_mut(&mut self) -> Option<&mut MapTerrain> {
        let id = self.active.as_ref()?;
        self.maps.get_mut(id)
    }

    /// Parses a level snapshot, registers it under `map_id` and activates it.
    ///
    /// Snapshots carrying a default material become sparse maps, the rest
    /// chunked maps. On any error the registry is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationIssue::EmptyMapId`] for an empty id, otherwise the
    /// parse, validation or construction error.
    pub fn load_level(&mut self, map_id: &str, json: &str) -> TerrainResult<()> {
        match self.build_level(map_id, json) {
            Ok(terrain) => {
                info!("Level '{}' loaded ({} map)", map_id, terrain.kind());
                self.maps.insert(map_id.to_string(), terrain);
                self.active = Some(map_id.to_string());
                Ok(())
            }
            Err(err) => {
                warn!("Level '{}' rejected: {}", map_id, err);
                Err(err)
            }
        }
    }

    fn build_level(&self, map_id: &str, json: &str) -> TerrainResult<MapTerrain> {
        if map_id.is_empty() {
            return Err(ValidationIssue::EmptyMapId.into());
        }
        let snapshot = TerrainSnapshot::from_json(json)?;
        if snapshot.is_sparse() {
            Ok(MapTerrain::Sparse(snapshot.build_sparse(self.canvas_width, self.canvas_height)?))
        } else {
            Ok(MapTerrain::Chunked(snapshot.build_chunked()?))
        }
    }
}

impl Default for MapManager {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

//! # Terrain Import
//!
//! Turns snapshot JSON back into terrain.
//!
//! Raw JSON is run through [`validate_export_data`] before it is
//! deserialized, and every tile is decoded and bounds-checked before the
//! target terrain is touched. A rejected payload leaves the terrain exactly
//! as it was.

use serde_json::Value;
use tracing::{debug, warn};

use crate::chunk::ChunkCoord;
use crate::chunked::ChunkedTerrain;
use crate::config::{TerrainConfig, MAX_TILES};
use crate::error::{TerrainError, TerrainResult, ValidationIssue};
use crate::export::{rle_decode, rle_decoded_len, validate_export_data, TerrainSnapshot, TileData};
use crate::grid::Grid;
use crate::material::MaterialId;
use crate::sparse::SparseTerrain;
use crate::tile::{Tile, TileBounds};

impl TerrainSnapshot {
    /// Parses and validates snapshot JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::Json`] for unparseable text and
    /// [`TerrainError::Validation`] with the first problem found otherwise.
    pub fn from_json(json: &str) -> TerrainResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Validates and converts an already parsed JSON tree.
    ///
    /// # Errors
    ///
    /// As [`from_json`](Self::from_json).
    pub fn from_value(value: Value) -> TerrainResult<Self> {
        let report = validate_export_data(&value);
        if let Some(first) = report.errors.first() {
            warn!(problems = report.errors.len(), first = %first, "snapshot rejected");
        }
        report.into_result()?;
        Ok(serde_json::from_value(value)?)
    }

    /// Returns true if the snapshot came from a sparse terrain.
    #[must_use]
    pub const fn is_sparse(&self) -> bool {
        self.metadata.default_material.is_some()
    }

    /// Config for a chunked terrain with the snapshot's dimensions and seed.
    #[must_use]
    pub fn to_config(&self) -> TerrainConfig {
        let m = &self.metadata;
        TerrainConfig {
            tile_size: m.tile_size,
            ..TerrainConfig::new(m.grid_size_x, m.grid_size_y, m.chunk_size, m.seed)
        }
    }

    /// Decodes the tiles array into tiles at absolute grid positions.
    ///
    /// Flat and run-length data are laid out in chunk-major export order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationIssue::MalformedTiles`] if the grid extent does
    /// not fit `i32` coordinates, the data holds more tiles than the grid (or
    /// [`MAX_TILES`]), a run has zero length, or an object tile lands outside
    /// `i32` coordinates.
    pub fn decode_tiles(&self) -> TerrainResult<Vec<Tile>> {
        let m = &self.metadata;
        let extent = self.extent()?;
        let capacity = extent.map_or(0, |b| (b.width() as usize).saturating_mul(b.height() as usize));
        match &self.tiles {
            TileData::Flat(materials) => self.place_in_export_order(materials, capacity),
            TileData::Runs(runs) => {
                if let Some(index) = runs.iter().position(|r| r.count == 0) {
                    return Err(ValidationIssue::MalformedTiles(format!("run {index} is empty")).into());
                }
                let limit = capacity.min(MAX_TILES);
                match rle_decoded_len(runs) {
                    Some(total) if total <= limit => self.place_in_export_order(&rle_decode(runs), capacity),
                    _ => Err(ValidationIssue::MalformedTiles(format!("runs exceed {limit} tiles")).into()),
                }
            }
            TileData::Objects(records) => records
                .iter()
                .enumerate()
                .map(|(index, r)| -> TerrainResult<Tile> {
                    let x = i32::try_from(r.x).ok().and_then(|x| m.origin_x.checked_add(x));
                    let y = i32::try_from(r.y).ok().and_then(|y| m.origin_y.checked_add(y));
                    let (Some(x), Some(y)) = (x, y) else {
                        return Err(ValidationIssue::MalformedTiles(format!(
                            "tile {index} at ({}, {}) overflows i32 coordinates",
                            r.x, r.y
                        ))
                        .into());
                    };
                    let tile = Tile::new(x, y, r.material);
                    Ok(r.weight.map_or(tile, |w| tile.with_weight(w)))
                })
                .collect(),
        }
    }

    /// Tile rectangle covered by the metadata, `None` for an empty grid.
    fn extent(&self) -> TerrainResult<Option<TileBounds>> {
        let m = &self.metadata;
        let max_x = last_coordinate(m.origin_x, m.grid_size_x, m.chunk_size, "x")?;
        let max_y = last_coordinate(m.origin_y, m.grid_size_y, m.chunk_size, "y")?;
        Ok(max_x.zip(max_y).map(|(max_x, max_y)| TileBounds {
            min_x: m.origin_x,
            max_x,
            min_y: m.origin_y,
            max_y,
        }))
    }

    fn place_in_export_order(&self, materials: &[MaterialId], capacity: usize) -> TerrainResult<Vec<Tile>> {
        let m = &self.metadata;
        if materials.len() > capacity {
            return Err(ValidationIssue::MalformedTiles(format!(
                "{} tiles exceed the {}x{} tile grid",
                materials.len(),
                m.tile_width(),
                m.tile_height()
            ))
            .into());
        }
        // positions stay inside the extent checked by `extent`
        Ok(materials
            .iter()
            .enumerate()
            .map(|(i, &material)| {
                let (x, y) = m.export_order_position(i);
                Tile::new(m.origin_x + x as i32, m.origin_y + y as i32, material)
            })
            .collect())
    }

    /// Builds a new chunked terrain and replays the tiles onto it.
    ///
    /// Positions the snapshot omits are generated from its seed.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] for unusable dimensions and
    /// the errors of [`import_into_chunked`] otherwise.
    pub fn build_chunked(&self) -> TerrainResult<ChunkedTerrain> {
        let mut terrain = ChunkedTerrain::new(&self.to_config())?;
        import_into_chunked(&mut terrain, self)?;
        Ok(terrain)
    }

    /// Builds a sparse terrain from any encoding.
    ///
    /// The metadata's grid extent becomes the explicit bounds. Tiles equal to
    /// the default material (at default weight) are not stored.
    ///
    /// # Errors
    ///
    /// As [`decode_tiles`](Self::decode_tiles).
    pub fn build_sparse(&self, canvas_width: f64, canvas_height: f64) -> TerrainResult<SparseTerrain> {
        let m = &self.metadata;
        let default_material = m.default_material.unwrap_or_default();
        let tiles = self.decode_tiles()?;

        let mut terrain = SparseTerrain::new(m.tile_size, default_material, canvas_width, canvas_height);
        if let Some(bounds) = self.extent()? {
            terrain = terrain.with_bounds(bounds);
        }

        for tile in tiles {
            if tile.material != default_material || tile.weight != Tile::DEFAULT_WEIGHT {
                terrain.insert_tile(tile);
            }
        }
        debug!(painted = terrain.len(), "sparse terrain imported");
        Ok(terrain)
    }
}

/// Last tile coordinate along one axis, `None` if the axis is empty.
fn last_coordinate(origin: i32, chunks: usize, chunk_size: usize, axis: &str) -> TerrainResult<Option<i32>> {
    let tiles = chunks.checked_mul(chunk_size).and_then(|t| i32::try_from(t).ok());
    let last = tiles.and_then(|t| if t == 0 { Some(None) } else { origin.checked_add(t - 1).map(Some) });
    last.ok_or_else(|| {
        ValidationIssue::MalformedTiles(format!(
            "{axis} extent of {chunks} chunks of {chunk_size} from {origin} exceeds i32 coordinates"
        ))
        .into()
    })
}

/// Replays a snapshot onto an existing terrain of the same dimensions.
///
/// Whole-grid flat or run-length data replaces chunks wholesale; anything
/// else is painted tile by tile.
///
/// # Errors
///
/// Returns [`TerrainError::InvalidConfig`] if the dimensions differ and
/// [`TerrainError::Validation`] if any tile falls outside the terrain. The
/// terrain is not modified on error.
pub fn import_into_chunked(terrain: &mut ChunkedTerrain, snapshot: &TerrainSnapshot) -> TerrainResult<()> {
    let m = &snapshot.metadata;
    if (m.grid_size_x, m.grid_size_y, m.chunk_size) != (terrain.grid_size_x(), terrain.grid_size_y(), terrain.chunk_size())
        || (m.origin_x, m.origin_y) != (0, 0)
    {
        return Err(TerrainError::InvalidConfig(format!(
            "snapshot is {}x{} chunks of {} tiles, terrain is {}x{} chunks of {}",
            m.grid_size_x,
            m.grid_size_y,
            m.chunk_size,
            terrain.grid_size_x(),
            terrain.grid_size_y(),
            terrain.chunk_size()
        )));
    }

    let tiles = snapshot.decode_tiles()?;
    if let Some(tile) = tiles.iter().find(|t| !terrain.in_bounds(t.x, t.y)) {
        return Err(ValidationIssue::MalformedTiles(format!("tile ({}, {}) is outside the terrain", tile.x, tile.y)).into());
    }

    let whole_grid = !matches!(snapshot.tiles, TileData::Objects(_)) && tiles.len() == terrain.tile_width() * terrain.tile_height();
    if whole_grid {
        let chunk_size = terrain.chunk_size();
        let per_chunk = chunk_size * chunk_size;
        for (index, chunk_tiles) in tiles.chunks(per_chunk).enumerate() {
            let coord = ChunkCoord::new((index % m.grid_size_x) as i32, (index / m.grid_size_x) as i32);
            let grid = Grid::from_fn(chunk_size, chunk_size, |lx, ly| chunk_tiles[ly * chunk_size + lx]);
            if !terrain.install_chunk(coord, grid) {
                warn!(x = coord.x, y = coord.y, "chunk install refused");
            }
        }
    } else {
        for tile in &tiles {
            terrain.set_tile(tile.x, tile.y, tile.material);
            if tile.weight != Tile::DEFAULT_WEIGHT {
                terrain.set_tile_weight(tile.x, tile.y, tile.weight);
            }
        }
    }

    debug!(tiles = tiles.len(), whole_grid, "snapshot replayed onto chunked terrain");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportOptions, TerrainExporter, TileEncoding};
    use crate::generator::GenerationMode;

    fn checkerboard() -> ChunkedTerrain {
        ChunkedTerrain::new(&TerrainConfig::new(2, 1, 4, 3).with_mode(GenerationMode::Checkerboard)).unwrap()
    }

    #[test]
    fn test_from_json_rejects_before_deserializing() {
        let err = TerrainSnapshot::from_json(r#"{"metadata":{"version":"one","gridSizeX":1,"gridSizeY":1},"tiles":[]}"#)
            .unwrap_err();
        assert_eq!(err, TerrainError::Validation(ValidationIssue::BadVersion("one".into())));

        let err = TerrainSnapshot::from_json("not json").unwrap_err();
        assert!(matches!(err, TerrainError::Json(_)));
    }

    #[test]
    fn test_flat_decode_uses_export_order() {
        let mut terrain = checkerboard();
        let snapshot = TerrainExporter::export_chunked(&mut terrain, &ExportOptions::default());
        let tiles = snapshot.decode_tiles().unwrap();
        assert_eq!(tiles.len(), 32);
        assert_eq!(tiles[16].position(), (4, 0));
        assert_eq!(tiles[17].position(), (5, 0));
        assert_eq!(tiles[20].position(), (4, 1));
    }

    #[test]
    fn test_import_replaces_whole_chunks() {
        let mut source = checkerboard();
        source.set_tile(6, 2, MaterialId::Cave);
        let snapshot = TerrainExporter::export_chunked(&mut source, &ExportOptions::with_encoding(TileEncoding::RunLength));

        let mut target = checkerboard();
        import_into_chunked(&mut target, &snapshot).unwrap();
        assert_eq!(target.generated_chunk_count(), 2);
        assert_eq!(target.material_at(6, 2), Some(MaterialId::Cave));
    }

    #[test]
    fn test_import_is_atomic_on_bad_tile() {
        let mut terrain = checkerboard();
        let before = terrain.tiles_in_export_order();

        let json = r#"{
            "metadata": { "version": "1.0", "gridSizeX": 2, "gridSizeY": 1, "chunkSize": 4 },
            "tiles": [
                { "x": 0, "y": 0, "material": "water" },
                { "x": 40, "y": 0, "material": "water" }
            ]
        }"#;
        let snapshot = TerrainSnapshot::from_json(json).unwrap();
        assert!(import_into_chunked(&mut terrain, &snapshot).is_err());
        assert_eq!(terrain.tiles_in_export_order(), before);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut small = checkerboard();
        let snapshot = TerrainExporter::export_chunked(&mut small, &ExportOptions::default());
        let mut other = ChunkedTerrain::with_seed(1, 1, 4, 3).unwrap();
        assert!(matches!(
            import_into_chunked(&mut other, &snapshot),
            Err(TerrainError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_oversized_flat_data_rejected() {
        let json = r#"{
            "metadata": { "version": "1.0", "gridSizeX": 1, "gridSizeY": 1, "chunkSize": 1 },
            "tiles": ["grass", "dirt"]
        }"#;
        let snapshot = TerrainSnapshot::from_json(json).unwrap();
        assert!(matches!(
            snapshot.decode_tiles(),
            Err(TerrainError::Validation(ValidationIssue::MalformedTiles(_)))
        ));
    }

    #[test]
    fn test_missing_optional_metadata_uses_defaults() {
        let json = r#"{
            "metadata": { "version": "2.1", "gridSizeX": 1, "gridSizeY": 1 },
            "tiles": []
        }"#;
        let snapshot = TerrainSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.metadata.chunk_size, 8);
        assert_eq!(snapshot.metadata.tile_size, 32.0);

        let sparse = snapshot.build_sparse(800.0, 600.0).unwrap();
        assert_eq!(sparse.default_material(), MaterialId::Grass);
        assert!(sparse.is_empty());
    }

    #[test]
    fn test_build_sparse_from_objects_keeps_origin() {
        let mut level = SparseTerrain::new(16.0, MaterialId::Sand, 800.0, 600.0);
        level.set_tile(-3, -2, MaterialId::Water);
        level.set_tile(1, 4, MaterialId::Stone);
        let snapshot = TerrainExporter::export_sparse(&level, &ExportOptions::with_encoding(TileEncoding::Objects));
        assert_eq!((snapshot.metadata.origin_x, snapshot.metadata.origin_y), (-3, -2));

        let json = snapshot.to_json().unwrap();
        let rebuilt = TerrainSnapshot::from_json(&json).unwrap().build_sparse(800.0, 600.0).unwrap();
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt.get_tile(-3, -2).material, MaterialId::Water);
        assert_eq!(rebuilt.get_tile(1, 4).material, MaterialId::Stone);
        assert_eq!(rebuilt.bounds(), level.bounds());
    }
}

//! # Terrain Export
//!
//! Snapshots a terrain as `{ metadata, tiles }` JSON.
//!
//! ## Tile Encodings
//!
//! | Encoding    | Shape                        | Order                      |
//! |-------------|------------------------------|----------------------------|
//! | `Flat`      | `["grass", "dirt", ...]`     | chunk-major, row-major     |
//! | `Objects`   | `[{x, y, material}, ...]`    | explicit coordinates       |
//! | `RunLength` | `[{material, count}, ...]`   | chunk-major, run-merged    |
//!
//! Coordinates in the `Objects` encoding are relative to
//! `metadata.originX/originY` (zero for chunked terrains), so they are
//! never negative. Sparse terrains export with `chunkSize = 1`, which makes
//! the flat order plain row-major over their bounds.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::chunked::ChunkedTerrain;
use crate::error::{TerrainResult, ValidationIssue};
use crate::material::MaterialId;
use crate::sparse::SparseTerrain;
use crate::tile::Tile;

/// Current snapshot format version.
pub const FORMAT_VERSION: &str = "1.0";

/// How the `tiles` array is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileEncoding {
    /// One material name per tile.
    #[default]
    Flat,
    /// One `{x, y, material}` object per tile.
    Objects,
    /// `{material, count}` runs of identical adjacent materials.
    RunLength,
}

/// One tile in the `Objects` encoding.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    /// X relative to the snapshot origin.
    pub x: u32,
    /// Y relative to the snapshot origin.
    pub y: u32,
    /// Material.
    pub material: MaterialId,
    /// Weight, present only when not the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

/// A run of identical materials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRun {
    /// Material of every tile in the run.
    pub material: MaterialId,
    /// Run length, at least 1.
    pub count: usize,
}

/// The `tiles` array in one of the three encodings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TileData {
    /// Flat material list.
    Flat(Vec<MaterialId>),
    /// Explicit tile records.
    Objects(Vec<TileRecord>),
    /// Run-length encoded materials.
    Runs(Vec<MaterialRun>),
}

impl TileData {
    /// Encoding of this data.
    #[must_use]
    pub const fn encoding(&self) -> TileEncoding {
        match self {
            Self::Flat(_) => TileEncoding::Flat,
            Self::Objects(_) => TileEncoding::Objects,
            Self::Runs(_) => TileEncoding::RunLength,
        }
    }

    /// Number of array entries (runs count once each).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(v) => v.len(),
            Self::Objects(v) => v.len(),
            Self::Runs(v) => v.len(),
        }
    }

    /// Returns true if the array is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Snapshot header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    /// Format version, `major.minor`.
    pub version: String,
    /// Chunks (or tiles, for sparse snapshots) along X.
    pub grid_size_x: usize,
    /// Chunks (or tiles, for sparse snapshots) along Y.
    pub grid_size_y: usize,
    /// Chunk edge length in tiles.
    #[serde(default = "ExportMetadata::default_chunk_size")]
    pub chunk_size: usize,
    /// Tile edge length in pixels.
    #[serde(default = "ExportMetadata::default_tile_size")]
    pub tile_size: f64,
    /// World seed.
    #[serde(default)]
    pub seed: u64,
    /// RFC 3339 creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Tile encoding used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<TileEncoding>,
    /// Grid X of the snapshot's first tile.
    #[serde(default)]
    pub origin_x: i32,
    /// Grid Y of the snapshot's first tile.
    #[serde(default)]
    pub origin_y: i32,
    /// Material for positions absent from the tiles array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_material: Option<MaterialId>,
    /// Level identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Anything else the caller attached.
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl ExportMetadata {
    const fn default_chunk_size() -> usize {
        crate::chunk::DEFAULT_CHUNK_SIZE
    }

    const fn default_tile_size() -> f64 {
        32.0
    }

    /// Tiles along X covered by the grid.
    #[must_use]
    pub const fn tile_width(&self) -> usize {
        self.grid_size_x.saturating_mul(self.chunk_size)
    }

    /// Tiles along Y covered by the grid.
    #[must_use]
    pub const fn tile_height(&self) -> usize {
        self.grid_size_y.saturating_mul(self.chunk_size)
    }

    /// Relative position of the `index`-th tile in chunk-major export order.
    #[must_use]
    pub fn export_order_position(&self, index: usize) -> (usize, usize) {
        let per_chunk = self.chunk_size.saturating_mul(self.chunk_size).max(1);
        let chunk = index / per_chunk;
        let within = index % per_chunk;
        let cx = chunk % self.grid_size_x.max(1);
        let cy = chunk / self.grid_size_x.max(1);
        (
            cx * self.chunk_size + within % self.chunk_size,
            cy * self.chunk_size + within / self.chunk_size,
        )
    }
}

/// A complete exported terrain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainSnapshot {
    /// Header.
    pub metadata: ExportMetadata,
    /// Tile payload.
    pub tiles: TileData,
}

impl TerrainSnapshot {
    /// Serializes to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::Json`](crate::error::TerrainError::Json) if
    /// serialization fails.
    pub fn to_json(&self) -> TerrainResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes to indented JSON.
    ///
    /// # Errors
    ///
    /// As [`to_json`](Self::to_json).
    pub fn to_json_pretty(&self) -> TerrainResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Converts to a JSON value tree.
    ///
    /// # Errors
    ///
    /// As [`to_json`](Self::to_json).
    pub fn to_value(&self) -> TerrainResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Caller-supplied export settings.
#[derive(Clone, Debug, Default)]
pub struct ExportOptions {
    /// Tile encoding.
    pub encoding: TileEncoding,
    /// Level identifier.
    pub map_id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Author.
    pub author: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Creation timestamp override; `None` stamps the current UTC time.
    pub created: Option<String>,
    /// Extra metadata fields.
    pub custom: Map<String, Value>,
}

impl ExportOptions {
    /// Options for the given encoding.
    #[must_use]
    pub fn with_encoding(encoding: TileEncoding) -> Self {
        Self {
            encoding,
            ..Self::default()
        }
    }

    fn metadata(&self, grid_size_x: usize, grid_size_y: usize, chunk_size: usize, tile_size: f64) -> ExportMetadata {
        ExportMetadata {
            version: FORMAT_VERSION.to_string(),
            grid_size_x,
            grid_size_y,
            chunk_size,
            tile_size,
            seed: 0,
            created: Some(
                self.created
                    .clone()
                    .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
            ),
            encoding: Some(self.encoding),
            origin_x: 0,
            origin_y: 0,
            default_material: None,
            map_id: self.map_id.clone(),
            name: self.name.clone(),
            author: self.author.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            custom: self.custom.clone(),
        }
    }
}

/// Merges adjacent identical materials into runs.
#[must_use]
pub fn rle_encode(materials: &[MaterialId]) -> Vec<MaterialRun> {
    let mut runs: Vec<MaterialRun> = Vec::new();
    for &material in materials {
        match runs.last_mut() {
            Some(run) if run.material == material => run.count += 1,
            _ => runs.push(MaterialRun { material, count: 1 }),
        }
    }
    runs
}

/// Total tile count of a run list, or `None` if it overflows `usize`.
#[must_use]
pub fn rle_decoded_len(runs: &[MaterialRun]) -> Option<usize> {
    runs.iter().try_fold(0usize, |total, run| total.checked_add(run.count))
}

/// Expands runs back into a material list.
///
/// Runs read from untrusted input should be measured with
/// [`rle_decoded_len`] first.
#[must_use]
pub fn rle_decode(runs: &[MaterialRun]) -> Vec<MaterialId> {
    let mut materials = Vec::with_capacity(rle_decoded_len(runs).unwrap_or(0));
    for run in runs {
        materials.extend(std::iter::repeat(run.material).take(run.count));
    }
    materials
}

/// Builds snapshots from terrains.
pub struct TerrainExporter;

impl TerrainExporter {
    /// Exports a chunked terrain, generating any pending chunks.
    pub fn export_chunked(terrain: &mut ChunkedTerrain, options: &ExportOptions) -> TerrainSnapshot {
        let tiles = terrain.tiles_in_export_order();

        let mut metadata = options.metadata(
            terrain.grid_size_x(),
            terrain.grid_size_y(),
            terrain.chunk_size(),
            terrain.tile_size(),
        );
        metadata.seed = terrain.seed().value();
        metadata
            .custom
            .entry("generationMode")
            .or_insert_with(|| Value::String(terrain.mode().name().to_string()));

        let data = Self::encode(&tiles, options.encoding, 0, 0);
        debug!(tiles = tiles.len(), entries = data.len(), encoding = ?options.encoding, "chunked terrain exported");

        TerrainSnapshot { metadata, tiles: data }
    }

    /// Exports a sparse terrain over its bounds.
    ///
    /// `Objects` lists only painted tiles; `Flat` and `RunLength` cover
    /// every position in the bounds, defaults included.
    #[must_use]
    pub fn export_sparse(terrain: &SparseTerrain, options: &ExportOptions) -> TerrainSnapshot {
        let bounds = terrain.bounds();
        let (origin_x, origin_y, width, height) =
            bounds.map_or((0, 0, 0, 0), |b| (b.min_x, b.min_y, b.width() as usize, b.height() as usize));

        let mut metadata = options.metadata(width, height, 1, terrain.tile_size());
        metadata.origin_x = origin_x;
        metadata.origin_y = origin_y;
        metadata.default_material = Some(terrain.default_material());

        let data = match options.encoding {
            TileEncoding::Objects => Self::encode(&terrain.painted_tiles_sorted(), TileEncoding::Objects, origin_x, origin_y),
            encoding => {
                let tiles: Vec<Tile> = bounds.map_or_else(Vec::new, |b| {
                    (b.min_y..=b.max_y)
                        .flat_map(|y| (b.min_x..=b.max_x).map(move |x| terrain.get_tile(x, y)))
                        .collect()
                });
                Self::encode(&tiles, encoding, origin_x, origin_y)
            }
        };
        debug!(painted = terrain.len(), entries = data.len(), encoding = ?options.encoding, "sparse terrain exported");

        TerrainSnapshot { metadata, tiles: data }
    }

    fn encode(tiles: &[Tile], encoding: TileEncoding, origin_x: i32, origin_y: i32) -> TileData {
        match encoding {
            TileEncoding::Flat => TileData::Flat(tiles.iter().map(|t| t.material).collect()),
            TileEncoding::Objects => TileData::Objects(
                tiles
                    .iter()
                    .map(|t| TileRecord {
                        x: t.x.abs_diff(origin_x),
                        y: t.y.abs_diff(origin_y),
                        material: t.material,
                        weight: (t.weight != Tile::DEFAULT_WEIGHT).then_some(t.weight),
                    })
                    .collect(),
            ),
            TileEncoding::RunLength => {
                let materials: Vec<MaterialId> = tiles.iter().map(|t| t.material).collect();
                TileData::Runs(rle_encode(&materials))
            }
        }
    }

    /// JSON byte length of a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::Json`](crate::error::TerrainError::Json) if
    /// serialization fails.
    pub fn estimate_size(snapshot: &TerrainSnapshot) -> TerrainResult<usize> {
        Ok(snapshot.to_json()?.len())
    }

    /// Human-readable byte count: `"512 bytes"`, `"1.50 KB"`, `"2.00 MB"`.
    #[must_use]
    pub fn format_size(bytes: usize) -> String {
        const KB: f64 = 1024.0;
        const MB: f64 = 1024.0 * 1024.0;
        let b = bytes as f64;
        if b < KB {
            format!("{bytes} bytes")
        } else if b < MB {
            format!("{:.2} KB", b / KB)
        } else {
            format!("{:.2} MB", b / MB)
        }
    }
}

/// Outcome of [`validate_export_data`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Every problem found, in discovery order.
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true if no problems were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// First problem as an error.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationIssue`] if the report is not clean.
    pub fn into_result(self) -> Result<(), ValidationIssue> {
        match self.errors.into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }
}

/// Returns true for `major.minor` version strings made of ASCII digits.
#[must_use]
pub fn is_valid_version(version: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    version
        .split_once('.')
        .is_some_and(|(major, minor)| all_digits(major) && all_digits(minor))
}

/// Checks raw snapshot JSON before it is trusted.
///
/// Collects every problem rather than stopping at the first.
#[must_use]
pub fn validate_export_data(data: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    match data.get("metadata").and_then(Value::as_object) {
        None => report.errors.push(ValidationIssue::MissingMetadata),
        Some(metadata) => validate_metadata(metadata, &mut report.errors),
    }

    match data.get("tiles").and_then(Value::as_array) {
        None => report.errors.push(ValidationIssue::MissingTiles),
        Some(tiles) => {
            for (index, tile) in tiles.iter().enumerate() {
                validate_tile(index, tile, &mut report.errors);
            }
        }
    }

    report
}

fn validate_metadata(metadata: &Map<String, Value>, errors: &mut Vec<ValidationIssue>) {
    match metadata.get("version").and_then(Value::as_str) {
        None => errors.push(ValidationIssue::MissingField("version")),
        Some(v) if !is_valid_version(v) => errors.push(ValidationIssue::BadVersion(v.to_string())),
        Some(_) => {}
    }

    for field in ["gridSizeX", "gridSizeY"] {
        match metadata.get(field).and_then(Value::as_i64) {
            None => errors.push(ValidationIssue::MissingField(field)),
            Some(value) if value < 0 => errors.push(ValidationIssue::NegativeDimension { field, value }),
            Some(_) => {}
        }
    }

    match metadata.get("mapId") {
        None | Some(Value::Null) => {}
        Some(Value::String(id)) if id.is_empty() => errors.push(ValidationIssue::EmptyMapId),
        Some(Value::String(_)) => {}
        Some(Value::Number(n)) if n.as_i64().is_some_and(|v| v < 0) => {
            errors.push(ValidationIssue::NegativeDimension {
                field: "mapId",
                value: n.as_i64().unwrap_or_default(),
            });
        }
        Some(_) => errors.push(ValidationIssue::MissingField("mapId")),
    }
}

fn validate_material(index: usize, value: Option<&Value>, errors: &mut Vec<ValidationIssue>) {
    match value.and_then(Value::as_str) {
        Some(name) if MaterialId::from_name(name).is_some() => {}
        Some(name) => errors.push(ValidationIssue::UnknownMaterial {
            index,
            name: name.to_string(),
        }),
        None => errors.push(ValidationIssue::MalformedTiles(format!("tile {index} has no material name"))),
    }
}

fn validate_tile(index: usize, tile: &Value, errors: &mut Vec<ValidationIssue>) {
    match tile {
        Value::String(_) => validate_material(index, Some(tile), errors),
        Value::Object(fields) if fields.contains_key("count") => {
            if fields.get("count").and_then(Value::as_u64).is_none() {
                errors.push(ValidationIssue::MalformedTiles(format!("run {index} has a bad count")));
            }
            validate_material(index, fields.get("material"), errors);
        }
        Value::Object(fields) => {
            match (
                fields.get("x").and_then(Value::as_i64),
                fields.get("y").and_then(Value::as_i64),
            ) {
                (Some(x), Some(y)) if x < 0 || y < 0 => {
                    errors.push(ValidationIssue::NegativeCoordinate { index, x, y });
                }
                (Some(_), Some(_)) => {}
                _ => errors.push(ValidationIssue::MalformedTiles(format!("tile {index} is missing x/y"))),
            }
            validate_material(index, fields.get("material"), errors);
        }
        _ => errors.push(ValidationIssue::MalformedTiles(format!("tile {index} is neither a name nor an object"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialId::{Dirt, Grass, Water};
    use serde_json::json;

    #[test]
    fn test_rle_example() {
        let materials = [Grass, Grass, Grass, Dirt, Dirt, Grass];
        let runs = rle_encode(&materials);
        assert_eq!(
            runs,
            vec![
                MaterialRun { material: Grass, count: 3 },
                MaterialRun { material: Dirt, count: 2 },
                MaterialRun { material: Grass, count: 1 },
            ]
        );
        assert_eq!(rle_decode(&runs), materials);
    }

    #[test]
    fn test_rle_edge_sequences() {
        assert!(rle_encode(&[]).is_empty());
        assert!(rle_decode(&[]).is_empty());

        let single = vec![Water; 500];
        let runs = rle_encode(&single);
        assert_eq!(runs, vec![MaterialRun { material: Water, count: 500 }]);
        assert_eq!(rle_decode(&runs), single);

        let alternating: Vec<_> = (0..101).map(|i| if i % 2 == 0 { Grass } else { Dirt }).collect();
        let runs = rle_encode(&alternating);
        assert_eq!(runs.len(), 101);
        assert!(runs.iter().all(|r| r.count == 1));
        assert_eq!(rle_decode(&runs), alternating);
    }

    #[test]
    fn test_rle_decoded_len_detects_overflow() {
        let runs = [MaterialRun { material: Grass, count: 3 }, MaterialRun { material: Dirt, count: 4 }];
        assert_eq!(rle_decoded_len(&runs), Some(7));
        assert_eq!(rle_decoded_len(&[]), Some(0));

        let huge = [MaterialRun { material: Grass, count: usize::MAX }, MaterialRun { material: Dirt, count: 1 }];
        assert_eq!(rle_decoded_len(&huge), None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(TerrainExporter::format_size(0), "0 bytes");
        assert_eq!(TerrainExporter::format_size(1023), "1023 bytes");
        assert_eq!(TerrainExporter::format_size(1024), "1.00 KB");
        assert_eq!(TerrainExporter::format_size(1536), "1.50 KB");
        assert_eq!(TerrainExporter::format_size(2 * 1024 * 1024), "2.00 MB");
    }

    #[test]
    fn test_version_pattern() {
        assert!(is_valid_version("1.0"));
        assert!(is_valid_version("12.345"));
        assert!(!is_valid_version("1"));
        assert!(!is_valid_version("1.0.0"));
        assert!(!is_valid_version("v1.0"));
        assert!(!is_valid_version(".1"));
        assert!(!is_valid_version("1."));
    }

    #[test]
    fn test_export_order_position() {
        let metadata: ExportMetadata = serde_json::from_value(json!({
            "version": "1.0", "gridSizeX": 2, "gridSizeY": 2, "chunkSize": 8
        }))
        .unwrap();
        assert_eq!(metadata.export_order_position(0), (0, 0));
        assert_eq!(metadata.export_order_position(9), (1, 1));
        assert_eq!(metadata.export_order_position(64), (8, 0));
        assert_eq!(metadata.export_order_position(255), (15, 15));
    }

    #[test]
    fn test_validate_accepts_all_encodings() {
        let metadata = json!({ "version": "1.0", "gridSizeX": 1, "gridSizeY": 1 });
        for tiles in [
            json!(["grass", "dirt"]),
            json!([{ "x": 0, "y": 1, "material": "sand" }]),
            json!([{ "material": "water", "count": 4 }]),
        ] {
            let report = validate_export_data(&json!({ "metadata": metadata, "tiles": tiles }));
            assert!(report.is_valid(), "{:?}", report.errors);
        }
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let report = validate_export_data(&json!({
            "metadata": { "version": "1", "gridSizeX": -2, "gridSizeY": 3, "mapId": "" },
            "tiles": []
        }));
        assert!(report.errors.contains(&ValidationIssue::EmptyMapId));

        let report = validate_export_data(&json!({
            "metadata": { "version": "1", "gridSizeX": -2, "gridSizeY": 3, "mapId": -4 },
            "tiles": [
                "grass",
                "lava",
                { "x": -1, "y": 0, "material": "dirt" },
                { "material": "stone", "count": -3 },
                7
            ]
        }));

        assert!(!report.is_valid());
        assert!(report.errors.contains(&ValidationIssue::BadVersion("1".into())));
        assert!(report.errors.contains(&ValidationIssue::NegativeDimension { field: "gridSizeX", value: -2 }));
        assert!(report.errors.contains(&ValidationIssue::NegativeDimension { field: "mapId", value: -4 }));
        assert!(report.errors.contains(&ValidationIssue::UnknownMaterial { index: 1, name: "lava".into() }));
        assert!(report.errors.contains(&ValidationIssue::NegativeCoordinate { index: 2, x: -1, y: 0 }));
        assert_eq!(
            report.errors.iter().filter(|e| matches!(e, ValidationIssue::MalformedTiles(_))).count(),
            2
        );
    }

    #[test]
    fn test_validate_missing_sections() {
        let report = validate_export_data(&json!({}));
        assert_eq!(report.errors, vec![ValidationIssue::MissingMetadata, ValidationIssue::MissingTiles]);
        assert_eq!(report.into_result(), Err(ValidationIssue::MissingMetadata));
    }

    #[test]
    fn test_untagged_tile_data_shapes() {
        let flat: TileData = serde_json::from_value(json!(["grass", "moss"])).unwrap();
        assert_eq!(flat.encoding(), TileEncoding::Flat);

        let objects: TileData = serde_json::from_value(json!([{ "x": 1, "y": 2, "material": "cave" }])).unwrap();
        assert_eq!(objects.encoding(), TileEncoding::Objects);

        let runs: TileData = serde_json::from_value(json!([{ "material": "cave", "count": 2 }])).unwrap();
        assert_eq!(runs.encoding(), TileEncoding::RunLength);
    }
}

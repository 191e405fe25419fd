//! # Terrain Error Types
//!
//! Everything that can go wrong while building, loading or indexing terrain.
//!
//! Out-of-world terrain queries are *not* errors: `ChunkedTerrain::get_tile`
//! and friends return `None`. Only the raw [`Grid`](crate::grid::Grid) API
//! reports [`TerrainError::IndexOutOfRange`].

use thiserror::Error;

/// A single reason an import payload was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// The payload has no `metadata` object.
    #[error("missing metadata object")]
    MissingMetadata,

    /// A required metadata field is absent or has the wrong type.
    #[error("missing or malformed metadata field `{0}`")]
    MissingField(&'static str),

    /// `metadata.version` does not look like `major.minor`.
    #[error("invalid version string {0:?}, expected major.minor")]
    BadVersion(String),

    /// A grid dimension is negative.
    #[error("{field} must be non-negative, got {value}")]
    NegativeDimension {
        /// Offending field name.
        field: &'static str,
        /// The value found.
        value: i64,
    },

    /// The payload has no `tiles` array.
    #[error("missing tiles array")]
    MissingTiles,

    /// A tile record has a negative coordinate.
    #[error("tile {index} has negative coordinates ({x}, {y})")]
    NegativeCoordinate {
        /// Position of the record in the tiles array.
        index: usize,
        /// X coordinate.
        x: i64,
        /// Y coordinate.
        y: i64,
    },

    /// A tile names a material this engine does not know.
    #[error("tile {index} has unknown material {name:?}")]
    UnknownMaterial {
        /// Position of the record in the tiles array.
        index: usize,
        /// The unrecognized name.
        name: String,
    },

    /// The tiles array cannot be decoded as any known encoding.
    #[error("malformed tiles array: {0}")]
    MalformedTiles(String),

    /// The map identifier is empty.
    #[error("map id must not be empty")]
    EmptyMapId,
}

/// Errors that can occur in the terrain system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    /// Raw grid access outside its extent.
    #[error("index ({x}, {y}) out of range for {width}x{height} grid")]
    IndexOutOfRange {
        /// Requested X.
        x: i64,
        /// Requested Y.
        y: i64,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },

    /// Invalid configuration values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Import data failed validation.
    #[error("validation failed: {0}")]
    Validation(ValidationIssue),

    /// JSON could not be parsed or produced.
    #[error("json error: {0}")]
    Json(String),

    /// Reading a file failed.
    #[error("io error: {0}")]
    Io(String),

    /// No map is registered under the given id.
    #[error("map not found: {0}")]
    MapNotFound(String),
}

impl From<ValidationIssue> for TerrainError {
    fn from(issue: ValidationIssue) -> Self {
        Self::Validation(issue)
    }
}

impl From<serde_json::Error> for TerrainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type for terrain operations.
pub type TerrainResult<T> = Result<T, TerrainError>;

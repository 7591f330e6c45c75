//! Error types for geoclip

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoclipError {
    // Bounding box errors
    #[error("Invalid bounds: {reason}")]
    InvalidBounds { reason: String },

    #[error("No features remain after filtering; a bounding box over zero features is undefined")]
    EmptyCollection,

    #[error("No bounding boxes provided")]
    EmptyInput,

    // Engine errors
    #[error("Failed to initialize query engine: {reason}")]
    Connection { reason: String },

    #[error("Failed to load engine extension '{name}': {reason}")]
    ExtensionLoad { name: String, reason: String },

    #[error("Geometry column '{column}' not found in source schema (available: {})", .available.join(", "))]
    MissingGeometryColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Source unreachable: {locator}: {reason}")]
    SourceUnreachable { locator: String, reason: String },

    #[error("Engine is {state}, expected {expected}")]
    EngineState { state: String, expected: String },

    // Catalog errors
    #[error("Unknown data source: {name}")]
    UnknownSource { name: String },

    #[error("Unknown location: {name}")]
    UnknownLocation { name: String },

    // Format errors
    #[error("{format}: {message}")]
    Format { format: String, message: String },

    #[error("Format driver '{driver}' unavailable: {reason}")]
    DriverUnavailable { driver: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Upload errors
    #[error("Upload failed for {}: {reason}", .path.display())]
    Upload { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, GeoclipError>;

//! Error types for schema extraction and reconciliation

use std::path::PathBuf;

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema extraction errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Collection not found: {0}")]
    UnknownCollection(String),

    #[error("INCLUDED_MODELS and EXCLUDED_MODELS cannot both be configured")]
    ConflictingModelFilters,

    #[error("Smart feature module '{module}' failed: {reason}")]
    SmartFeature { module: String, reason: String },

    #[error("Version lookup failed: {0}")]
    VersionLookup(String),

    #[error("Schema file does not exist: {}", .0.display())]
    SchemaFileMissing(PathBuf),

    #[error("Schema file {} is not valid: {reason}", .path.display())]
    SchemaFileInvalid { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

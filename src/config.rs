//! Configuration management for schema extraction
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (forest.toml)
//! - Environment variables (FOREST__*)
//!
//! ## Example config file (forest.toml):
//! ```toml
//! debug = false
//! schema_path = ".forestadmin-schema.json"
//! excluded_models = ["Permission", "Group", "User", "ContentType"]
//! smart_features = ["polls", "billing"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, SchemaError};

/// Name of the persisted schema cache file
pub const SCHEMA_FILE_NAME: &str = ".forestadmin-schema.json";

/// Runtime mode driving schema file reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Always rewrite the schema file from the freshly built document
    Development,
    /// Treat the schema file as the source of truth
    Production,
}

/// Main configuration for schema extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Allow-list of model names
    #[serde(default)]
    pub included_models: Vec<String>,

    /// Deny-list of model names
    #[serde(default)]
    pub excluded_models: Vec<String>,

    /// Development-like mode when set
    #[serde(default)]
    pub debug: bool,

    /// Schema cache file location
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    /// Smart feature modules to register at startup, in order
    #[serde(default)]
    pub smart_features: Vec<String>,

    /// Overrides the database type reported by the host
    #[serde(default)]
    pub database_type: Option<String>,
}

fn default_schema_path() -> PathBuf {
    PathBuf::from(SCHEMA_FILE_NAME)
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            included_models: Vec::new(),
            excluded_models: Vec::new(),
            debug: false,
            schema_path: default_schema_path(),
            smart_features: Vec::new(),
            database_type: None,
        }
    }
}

impl ForestConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["forest.toml", ".forest.toml", "config/forest.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("com", "forestadmin", "forest") {
            let xdg_config = config_dir.config_dir().join("forest.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // FOREST__DEBUG=true, FOREST__SCHEMA_PATH=...
        builder = builder.add_source(
            Environment::with_prefix("FOREST")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("included_models")
                .with_list_parse_key("excluded_models")
                .with_list_parse_key("smart_features"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Reject model filter combinations with no defined precedence
    pub fn validate(&self) -> Result<()> {
        if !self.included_models.is_empty() && !self.excluded_models.is_empty() {
            return Err(SchemaError::ConflictingModelFilters);
        }
        Ok(())
    }

    /// Reconciliation mode derived from the debug flag
    pub fn mode(&self) -> Mode {
        if self.debug {
            Mode::Development
        } else {
            Mode::Production
        }
    }

    /// Whether a model survives the include/exclude filters
    pub fn retains_model(&self, name: &str) -> bool {
        if !self.included_models.is_empty() {
            return self.included_models.iter().any(|m| m == name);
        }
        !self.excluded_models.iter().any(|m| m == name)
    }

    /// Get the schema file path (resolves relative paths)
    pub fn schema_file_path(&self) -> PathBuf {
        if self.schema_path.is_absolute() {
            self.schema_path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.schema_path)
        }
    }
}

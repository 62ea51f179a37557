//! Application configuration.
//!
//! Read from the TOML file named by `LANDSLIDE_CONFIG` (default
//! `config/landslide.toml`). When that file does not exist the embedded
//! default is used.

use std::path::{Path, PathBuf};

use landslide_viewer_incident_models::ColumnMapping;
use landslide_viewer_spatial::BoundaryFields;
use serde::Deserialize;

use crate::SourceError;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "LANDSLIDE_CONFIG";

/// Config path used when `LANDSLIDE_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/landslide.toml";

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Where incident records come from.
    pub records: RecordSourceConfig,
    /// Where boundary polygons come from.
    pub boundaries: BoundarySourceConfig,
    /// Record column names.
    #[serde(default)]
    pub columns: ColumnMapping,
    /// Boundary property names.
    #[serde(default)]
    pub boundary_fields: BoundaryFields,
    /// Display labels.
    #[serde(default)]
    pub labels: LabelsConfig,
    /// User document store.
    pub users: UsersConfig,
}

/// How to fetch the incident record table.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordSourceConfig {
    /// Local CSV file with a header row.
    Csv {
        /// File path.
        path: PathBuf,
        /// Field delimiter (default: comma).
        delimiter: Option<String>,
    },
    /// Local JSON file holding an array of row objects.
    Json {
        /// File path.
        path: PathBuf,
    },
    /// HTTP endpoint returning a JSON array of row objects.
    JsonUrl {
        /// Endpoint URL.
        url: String,
        /// Environment variable holding a bearer token, if the endpoint
        /// needs one.
        token_env: Option<String>,
    },
}

/// How to fetch the boundary `FeatureCollection`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundarySourceConfig {
    /// Local `GeoJSON` file.
    Geojson {
        /// File path.
        path: PathBuf,
    },
    /// `GeoJSON` served over HTTP.
    GeojsonUrl {
        /// URL returning a `FeatureCollection`.
        url: String,
    },
}

/// Display labels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    /// Region label shown when every region is selected.
    pub entire_area: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            entire_area: "Seluruh Jawa Barat".to_string(),
        }
    }
}

/// User document store location and session lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersConfig {
    /// JSON file holding one document per username.
    pub path: PathBuf,
    /// Hours a login session stays valid.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

const fn default_session_ttl_hours() -> i64 {
    12
}

impl AppConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if the TOML is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, SourceError> {
        Ok(toml::de::from_str(s)?)
    }

    /// Loads the config from `path`, or the embedded default if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load_from(path: &Path) -> Result<Self, SourceError> {
        if path.exists() {
            log::info!("Loading config from {}", path.display());
            let text = std::fs::read_to_string(path)?;
            Self::from_toml_str(&text)
        } else {
            log::info!(
                "Config {} not found, using embedded default",
                path.display()
            );
            Self::embedded_default()
        }
    }

    /// Loads the config from `LANDSLIDE_CONFIG` or the default path.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the config exists but is invalid.
    pub fn load() -> Result<Self, SourceError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// The embedded default config.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if the embedded TOML is invalid.
    pub fn embedded_default() -> Result<Self, SourceError> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record and boundary sources for the landslide viewer.
//!
//! Reads the application config, pulls the incident table and boundary
//! polygons from their configured sources, and builds the shared
//! [`Dataset`]. Both sources are read once per process through
//! [`cache::DatasetCache`].

pub mod boundaries;
pub mod cache;
pub mod config;
pub mod records;

use landslide_viewer_pipeline::Dataset;
use landslide_viewer_spatial::SpatialError;

use crate::config::AppConfig;

/// Errors that can occur while loading configuration or source data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for [`AppConfig`].
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Boundary data could not be parsed.
    #[error("Boundary error: {0}")]
    Spatial(#[from] SpatialError),

    /// Source data had an unexpected shape.
    #[error("Format error: {message}")]
    Format {
        /// Description of what went wrong.
        message: String,
    },
}

/// Loads records and boundaries from `config` and normalizes them into a
/// [`Dataset`].
///
/// # Errors
///
/// Returns [`SourceError`] if either source fails.
pub async fn load_dataset(config: &AppConfig) -> Result<Dataset, SourceError> {
    let client = reqwest::Client::new();

    let table = records::load_records(&config.records, &client).await?;
    let boundaries =
        boundaries::load_boundaries(&config.boundaries, &config.boundary_fields, &client).await?;

    let dataset = Dataset::new(&table, config.columns.clone(), boundaries);

    log::info!(
        "Dataset ready: {} incidents ({} dropped), {} boundary polygons",
        dataset.incidents.len(),
        dataset.dropped,
        dataset.boundaries.len()
    );

    Ok(dataset)
}

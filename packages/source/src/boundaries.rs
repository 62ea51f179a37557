//! Boundary source: reads the administrative polygon `FeatureCollection`.

use landslide_viewer_spatial::{BoundaryFields, BoundarySet};

use crate::SourceError;
use crate::config::BoundarySourceConfig;

/// Loads the boundary set described by `config`.
///
/// # Errors
///
/// Returns [`SourceError`] if the source cannot be read or is not a
/// `GeoJSON` `FeatureCollection`.
pub async fn load_boundaries(
    config: &BoundarySourceConfig,
    fields: &BoundaryFields,
    client: &reqwest::Client,
) -> Result<BoundarySet, SourceError> {
    let text = match config {
        BoundarySourceConfig::Geojson { path } => {
            log::info!("Reading boundaries from {}", path.display());
            tokio::fs::read_to_string(path).await?
        }
        BoundarySourceConfig::GeojsonUrl { url } => {
            log::info!("Fetching boundaries from {url}");
            let resp = client.get(url).send().await?;
            if !resp.status().is_success() {
                return Err(SourceError::Format {
                    message: format!("GeoJSON request failed with status {}", resp.status()),
                });
            }
            resp.text().await?
        }
    };

    Ok(BoundarySet::from_geojson_str(&text, fields)?)
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the landslide viewer server.
//!
//! These types are serialized to JSON for the map frontend. They are
//! separate from the pipeline types so the API contract can evolve
//! independently.

use std::collections::BTreeMap;

use geojson::{Feature, FeatureCollection};
use landslide_viewer_incident_models::{ColumnMapping, Incident, MeasurementField, Selection};
use landslide_viewer_pipeline::{
    Dataset, FilterSelection, PipelineOutput, RangeControl, RangeRequest, Summary,
};
use serde::{Deserialize, Serialize};

/// Query parameters for the view endpoint.
///
/// Range parameters are `lo,hi`; either side may be empty. Range keys are
/// the `snake_case` field keys the range controls are reported under.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQueryParams {
    /// Region name, or absent/`Semua` for every region.
    pub region: Option<String>,
    /// District name, or absent/`Semua` for every district.
    pub district: Option<String>,
    /// Landslide length range in meters.
    pub length: Option<String>,
    /// Landslide width range in meters.
    pub width: Option<String>,
    /// Landslide height range in meters.
    pub height: Option<String>,
    /// Elevation range in meters.
    pub elevation: Option<String>,
    /// Slope angle range in degrees.
    pub slope_angle: Option<String>,
}

impl ViewQueryParams {
    /// Converts the parameters into a pipeline selection. Malformed range
    /// bounds are ignored.
    #[must_use]
    pub fn to_selection(&self) -> FilterSelection {
        let ranges: BTreeMap<MeasurementField, RangeRequest> = [
            (MeasurementField::Length, &self.length),
            (MeasurementField::Width, &self.width),
            (MeasurementField::Height, &self.height),
            (MeasurementField::Elevation, &self.elevation),
            (MeasurementField::SlopeAngle, &self.slope_angle),
        ]
        .into_iter()
        .filter_map(|(field, raw)| raw.as_deref().map(|s| (field, parse_range(s))))
        .collect();

        FilterSelection {
            region: Selection::from_optional(self.region.as_deref()),
            district: Selection::from_optional(self.district.as_deref()),
            ranges,
        }
    }
}

/// Parses `"lo,hi"` into a range request. Empty or unparseable sides are
/// left open.
#[must_use]
pub fn parse_range(s: &str) -> RangeRequest {
    let (lo, hi) = s.split_once(',').unwrap_or((s, ""));
    RangeRequest {
        min: lo.trim().parse().ok(),
        max: hi.trim().parse().ok(),
    }
}

/// Query parameters for the districts endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictQueryParams {
    /// Region name.
    pub region: Option<String>,
}

/// Username and password for register and login.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// Logged-in username.
    pub username: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Whether the dataset has been loaded.
    pub dataset_loaded: bool,
}

/// A range control as shown next to the map.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRangeControl {
    /// Field key (e.g. `slope_angle`).
    pub field: MeasurementField,
    /// Source column name, used as the control label.
    pub label: String,
    /// Truncated minimum in the view.
    pub min: i64,
    /// Truncated maximum in the view.
    pub max: i64,
    /// Selected lower bound.
    pub selected_min: i64,
    /// Selected upper bound.
    pub selected_max: i64,
    /// Whether the selection spans the whole control.
    pub full_range: bool,
}

impl From<&RangeControl> for ApiRangeControl {
    fn from(control: &RangeControl) -> Self {
        Self {
            field: control.field,
            label: control.field.column_name().to_string(),
            min: control.min,
            max: control.max,
            selected_min: control.selected_min,
            selected_max: control.selected_max,
            full_range: control.is_full_range(),
        }
    }
}

/// Summary metrics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSummary {
    /// Number of incidents shown.
    pub total_count: usize,
    /// Selected region, or the entire-area label.
    pub region_label: String,
    /// Mean elevation rounded to one decimal place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_elevation: Option<f64>,
}

impl From<&Summary> for ApiSummary {
    fn from(summary: &Summary) -> Self {
        Self {
            total_count: summary.total_count,
            region_label: summary.region_label.clone(),
            mean_elevation: summary.mean_elevation,
        }
    }
}

/// Everything the map needs for one filter state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiView {
    /// Region selector choices, sentinel first.
    pub region_choices: Vec<String>,
    /// District selector choices, sentinel first.
    pub district_choices: Vec<String>,
    /// Non-coordinate record columns in source order, for listing
    /// incident properties.
    pub attribute_columns: Vec<String>,
    /// Boundary polygons to draw.
    pub boundary: FeatureCollection,
    /// Filtered incidents as point features.
    pub incidents: FeatureCollection,
    /// Engaged range controls.
    pub ranges: Vec<ApiRangeControl>,
    /// Summary metrics.
    pub summary: ApiSummary,
}

impl ApiView {
    /// Builds the response from a pipeline pass over `dataset`.
    #[must_use]
    pub fn from_output(output: &PipelineOutput<'_>, dataset: &Dataset) -> Self {
        let mapping = &dataset.mapping;
        Self {
            region_choices: output.region_choices.clone(),
            district_choices: output.district_choices.clone(),
            attribute_columns: attribute_columns(&dataset.columns, mapping),
            boundary: output.boundary.to_feature_collection(),
            incidents: FeatureCollection {
                bbox: None,
                features: output
                    .incidents
                    .iter()
                    .map(|i| incident_feature(i, mapping))
                    .collect(),
                foreign_members: None,
            },
            ranges: output.range_controls.iter().map(Into::into).collect(),
            summary: (&output.summary).into(),
        }
    }
}

/// Record columns in source order, without the coordinate columns.
#[must_use]
pub fn attribute_columns(columns: &[String], mapping: &ColumnMapping) -> Vec<String> {
    columns
        .iter()
        .filter(|column| !mapping.is_coordinate(column))
        .cloned()
        .collect()
}

/// A point feature for one incident. Properties hold every original
/// column except the coordinate columns; missing values are `null`.
#[must_use]
pub fn incident_feature(incident: &Incident, columns: &ColumnMapping) -> Feature {
    let properties: serde_json::Map<String, serde_json::Value> = incident
        .attributes
        .iter()
        .filter(|(column, _)| !columns.is_coordinate(column))
        .map(|(column, value)| (column.clone(), value.to_json()))
        .collect();

    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![
            incident.longitude(),
            incident.latitude(),
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landslide_viewer_incident_models::{CellValue, RawRecord};

    #[test]
    fn parses_ranges_with_open_sides() {
        assert_eq!(parse_range("750,1300"), RangeRequest::between(750, 1300));
        assert_eq!(
            parse_range(",1300"),
            RangeRequest {
                min: None,
                max: Some(1300)
            }
        );
        assert_eq!(
            parse_range("750"),
            RangeRequest {
                min: Some(750),
                max: None
            }
        );
        assert_eq!(parse_range("x,y"), RangeRequest::default());
    }

    #[test]
    fn query_params_build_selection() {
        let params = ViewQueryParams {
            region: Some("Bandung".to_string()),
            district: Some("Semua".to_string()),
            elevation: Some("750,1300".to_string()),
            ..ViewQueryParams::default()
        };
        let selection = params.to_selection();
        assert_eq!(selection.region, Selection::Only("bandung".to_string()));
        assert_eq!(selection.district, Selection::All);
        assert_eq!(
            selection.ranges.get(&MeasurementField::Elevation),
            Some(&RangeRequest::between(750, 1300))
        );
        assert_eq!(selection.ranges.len(), 1);
    }

    #[test]
    fn incident_feature_drops_coordinate_columns() {
        let mut attributes = RawRecord::new();
        attributes.insert("Latitude Decimals".to_string(), CellValue::Number(-6.9));
        attributes.insert("Longitude Decimals".to_string(), CellValue::Number(107.6));
        attributes.insert("District".to_string(), CellValue::Text("Coblong".to_string()));
        attributes.insert("Notes".to_string(), CellValue::Null);
        let incident = Incident {
            row_index: 0,
            point: geo_point(107.6, -6.9),
            region: None,
            district: Some("coblong".to_string()),
            attributes,
        };

        let feature = incident_feature(&incident, &ColumnMapping::default());
        let properties = feature.properties.unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties["District"], "Coblong");
        assert!(properties["Notes"].is_null());

        let json = serde_json::to_value(feature.geometry.unwrap()).unwrap();
        assert_eq!(json["coordinates"], serde_json::json!([107.6, -6.9]));
    }

    #[test]
    fn query_params_accept_snake_case_range_keys() {
        let params: ViewQueryParams =
            serde_json::from_value(serde_json::json!({ "slope_angle": "10,20" })).unwrap();
        let selection = params.to_selection();
        assert_eq!(
            selection.ranges.get(&MeasurementField::SlopeAngle),
            Some(&RangeRequest::between(10, 20))
        );
        assert_eq!(
            serde_json::to_value(MeasurementField::SlopeAngle).unwrap(),
            "slope_angle"
        );
    }

    #[test]
    fn attribute_columns_keep_source_order() {
        let columns: Vec<String> = [
            "No",
            "Regency/City",
            "Latitude Decimals",
            "District",
            "Longitude Decimals",
            "Elevation (m)",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        assert_eq!(
            attribute_columns(&columns, &ColumnMapping::default()),
            vec!["No", "Regency/City", "District", "Elevation (m)"]
        );
    }

    #[test]
    fn summary_omits_missing_mean() {
        let summary = ApiSummary {
            total_count: 0,
            region_label: "Seluruh Jawa Barat".to_string(),
            mean_elevation: None,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert!(json.get("meanElevation").is_none());
        assert_eq!(json["totalCount"], 0);
    }

    fn geo_point(x: f64, y: f64) -> landslide_viewer_incident_models::Point {
        landslide_viewer_incident_models::Point::new(x, y)
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Landslide incident filtering and aggregation.
//!
//! The cached [`Dataset`] holds normalized incidents and boundary polygons.
//! Every interaction runs [`run`], which composes the region, district and
//! range filters as pure functions over borrowed views and summarizes the
//! result. Nothing in the dataset is mutated or copied per stage.

pub mod aggregate;
pub mod district;
pub mod normalize;
pub mod range;
pub mod region;
pub mod view;

use std::collections::BTreeMap;

use landslide_viewer_incident_models::{
    ALL_SENTINEL, ColumnMapping, Incident, MeasurementField, RecordTable, Selection,
};
use landslide_viewer_spatial::{BoundarySelection, BoundarySet};

pub use aggregate::Summary;
pub use range::{RangeControl, RangeRequest};
pub use view::{IncidentView, Stage};

/// Normalized incidents and boundaries, loaded once and shared read-only.
#[derive(Debug)]
pub struct Dataset {
    /// Record column names in source order.
    pub columns: Vec<String>,
    /// Column mapping used to normalize the records.
    pub mapping: ColumnMapping,
    /// Incidents that survived normalization.
    pub incidents: Vec<Incident>,
    /// Rows dropped by normalization.
    pub dropped: usize,
    /// Administrative boundaries.
    pub boundaries: BoundarySet,
}

impl Dataset {
    /// Normalizes `table` and pairs it with `boundaries`.
    #[must_use]
    pub fn new(table: &RecordTable, mapping: ColumnMapping, boundaries: BoundarySet) -> Self {
        let normalized = normalize::normalize(table, &mapping);
        let dropped = normalized.dropped();

        Self {
            columns: table.columns.clone(),
            mapping,
            incidents: normalized.incidents,
            dropped,
            boundaries,
        }
    }

    /// A view over every incident.
    #[must_use]
    pub fn view(&self) -> IncidentView<'_> {
        IncidentView::of(&self.incidents)
    }

    /// Region choices: the sentinel, then the sorted boundary region names.
    #[must_use]
    pub fn region_choices(&self) -> Vec<String> {
        std::iter::once(ALL_SENTINEL.to_string())
            .chain(self.boundaries.region_names())
            .collect()
    }
}

/// Everything the user has selected on the filter controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    /// Region selector.
    pub region: Selection,
    /// District selector.
    pub district: Selection,
    /// Requested measurement ranges.
    pub ranges: BTreeMap<MeasurementField, RangeRequest>,
}

/// What one pipeline pass hands to the renderer.
#[derive(Debug, Clone)]
pub struct PipelineOutput<'a> {
    /// Region selector choices.
    pub region_choices: Vec<String>,
    /// District selector choices, derived from the region stage.
    pub district_choices: Vec<String>,
    /// Boundary polygons to draw.
    pub boundary: BoundarySelection<'a>,
    /// Incidents passing every filter.
    pub incidents: IncidentView<'a>,
    /// Range controls that were engaged, in field order.
    pub range_controls: Vec<RangeControl>,
    /// Summary of `incidents`.
    pub summary: Summary,
}

/// Runs the region, district and range filters and summarizes the result.
#[must_use]
pub fn run<'a>(
    dataset: &'a Dataset,
    selection: &FilterSelection,
    entire_area_label: &str,
) -> PipelineOutput<'a> {
    let all = dataset.view();

    let region_stage = region::filter_region(&all, &dataset.boundaries, &selection.region);
    let district_choices = district::district_choices(&region_stage.incidents);
    let district_stage = district::filter_district(
        &region_stage,
        &dataset.boundaries,
        &selection.region,
        &selection.district,
    );
    let (incidents, range_controls) =
        range::filter_ranges(&district_stage.incidents, &selection.ranges);
    let summary = aggregate::summarize(&incidents, &selection.region, entire_area_label);

    log::debug!(
        "Pipeline region={} district={}: {} of {} incidents",
        selection.region,
        selection.district,
        incidents.len(),
        dataset.incidents.len()
    );

    PipelineOutput {
        region_choices: dataset.region_choices(),
        district_choices,
        boundary: district_stage.boundary,
        incidents,
        range_controls,
        summary,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use geo::{MultiPolygon, Rect, coord};
    use landslide_viewer_incident_models::{CellValue, Incident, RawRecord};
    use landslide_viewer_spatial::{BoundaryPolygon, BoundarySet};

    pub fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![
            Rect::new(coord! { x: min_x, y: min_y }, coord! { x: max_x, y: max_y }).to_polygon(),
        ])
    }

    /// Coblong and Lembang districts of Bandung, Tarogong of Garut.
    pub fn sample_boundaries() -> BoundarySet {
        BoundarySet::new(vec![
            BoundaryPolygon::new("Bandung", Some("Coblong"), square(107.55, -6.95, 107.65, -6.85)),
            BoundaryPolygon::new("Bandung", Some("Lembang"), square(107.45, -6.85, 107.55, -6.75)),
            BoundaryPolygon::new("Garut", Some("Tarogong"), square(107.8, -7.3, 108.0, -7.1)),
        ])
    }

    pub fn raw_row(
        region: &str,
        district: &str,
        lat: f64,
        lon: f64,
        elevation: Option<f64>,
    ) -> RawRecord {
        let mut row = RawRecord::new();
        row.insert("Regency/City".to_string(), CellValue::Text(region.to_string()));
        row.insert("District".to_string(), CellValue::Text(district.to_string()));
        row.insert("Latitude Decimals".to_string(), CellValue::Number(lat));
        row.insert("Longitude Decimals".to_string(), CellValue::Number(lon));
        if let Some(elevation) = elevation {
            row.insert("Elevation (m)".to_string(), CellValue::Number(elevation));
        }
        row
    }

    pub fn incident(
        row_index: usize,
        region: &str,
        district: &str,
        lat: f64,
        lon: f64,
        elevation: Option<f64>,
    ) -> Incident {
        Incident {
            row_index,
            point: geo::Point::new(lon, lat),
            region: Some(region.to_lowercase()),
            district: Some(district.to_lowercase()),
            attributes: raw_row(region, district, lat, lon, elevation),
        }
    }
}

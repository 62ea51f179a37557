//! Summary statistics over the final filtered view.

use landslide_viewer_incident_models::{MeasurementField, Selection};

use crate::view::IncidentView;

/// Summary of the filtered view.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Number of incidents in the view.
    pub total_count: usize,
    /// Selected region name, or the entire-area label for the sentinel.
    pub region_label: String,
    /// Mean elevation over numeric values, rounded to one decimal place.
    /// `None` when no incident has a numeric elevation.
    pub mean_elevation: Option<f64>,
}

/// Summarizes `view`.
#[must_use]
pub fn summarize(view: &IncidentView<'_>, region: &Selection, entire_area_label: &str) -> Summary {
    Summary {
        total_count: view.len(),
        region_label: region
            .name()
            .unwrap_or(entire_area_label)
            .to_string(),
        mean_elevation: mean(view, MeasurementField::Elevation).map(round_one_decimal),
    }
}

/// Mean of a field's numeric values in `view`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(view: &IncidentView<'_>, field: MeasurementField) -> Option<f64> {
    let (sum, count) = view
        .iter()
        .filter_map(|i| i.measurement(field))
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    (count > 0).then(|| sum / count as f64)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

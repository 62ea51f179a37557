//! District (kecamatan) filter.

use std::collections::BTreeSet;

use landslide_viewer_incident_models::{ALL_SENTINEL, Selection};
use landslide_viewer_spatial::BoundarySet;

use crate::view::{IncidentView, Stage};

/// District choices offered after the region filter: the sentinel, then
/// the sorted distinct district names present in `view`.
#[must_use]
pub fn district_choices(view: &IncidentView<'_>) -> Vec<String> {
    let names: BTreeSet<&str> = view.iter().filter_map(|i| i.district.as_deref()).collect();

    std::iter::once(ALL_SENTINEL.to_string())
        .chain(names.into_iter().map(str::to_string))
        .collect()
}

/// Narrows the region stage to one district.
///
/// The boundary for display becomes the polygons matching both the region
/// and the district. A concrete district with the region sentinel is not
/// offered by the choices; if a caller asks for it anyway the boundary is
/// empty.
#[must_use]
pub fn filter_district<'a>(
    input: &Stage<'a>,
    boundaries: &'a BoundarySet,
    region: &Selection,
    district: &Selection,
) -> Stage<'a> {
    let Some(district_name) = district.name() else {
        return input.clone();
    };

    let incidents = input
        .incidents
        .filter(|incident| incident.district.as_deref() == Some(district_name));

    let boundary = region.name().map_or_else(
        || boundaries.none(),
        |region_name| boundaries.select_district(region_name, district_name),
    );

    log::debug!(
        "District filter '{district_name}': {} -> {} incidents, {} polygons",
        input.incidents.len(),
        incidents.len(),
        boundary.len()
    );

    Stage {
        incidents,
        boundary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::filter_region;
    use crate::test_support::{incident, sample_boundaries};
    use landslide_viewer_incident_models::{CellValue, Incident};

    fn bandung_incidents() -> Vec<Incident> {
        vec![
            incident(0, "bandung", "lembang", -6.8, 107.5, None),
            incident(1, "bandung", "coblong", -6.9, 107.6, None),
            incident(2, "bandung", "coblong", -6.91, 107.61, None),
        ]
    }

    #[test]
    fn choices_are_sorted_distinct_with_sentinel_first() {
        let mut incidents = bandung_incidents();
        let mut nameless = incidents[0].clone();
        nameless.row_index = 3;
        nameless.district = None;
        nameless
            .attributes
            .insert("District".to_string(), CellValue::Null);
        incidents.push(nameless);

        let choices = district_choices(&IncidentView::of(&incidents));
        assert_eq!(choices, vec![ALL_SENTINEL, "coblong", "lembang"]);
    }

    #[test]
    fn sentinel_is_identity() {
        let incidents = bandung_incidents();
        let boundaries = sample_boundaries();
        let region = Selection::Only("bandung".to_string());
        let stage = filter_region(&IncidentView::of(&incidents), &boundaries, &region);

        let out = filter_district(&stage, &boundaries, &region, &Selection::All);
        assert_eq!(out.incidents, stage.incidents);
        assert_eq!(out.boundary.len(), stage.boundary.len());
    }

    #[test]
    fn narrows_incidents_and_boundary() {
        let incidents = bandung_incidents();
        let boundaries = sample_boundaries();
        let region = Selection::Only("bandung".to_string());
        let stage = filter_region(&IncidentView::of(&incidents), &boundaries, &region);

        let out = filter_district(
            &stage,
            &boundaries,
            &region,
            &Selection::Only("coblong".to_string()),
        );
        assert_eq!(out.incidents.row_indexes(), vec![1, 2]);
        let districts: Vec<_> = out
            .boundary
            .polygons()
            .map(|p| p.district.as_deref())
            .collect();
        assert_eq!(districts, vec![Some("coblong")]);
    }

    #[test]
    fn district_without_region_has_empty_boundary() {
        let incidents = bandung_incidents();
        let boundaries = sample_boundaries();
        let stage = filter_region(&IncidentView::of(&incidents), &boundaries, &Selection::All);

        let out = filter_district(
            &stage,
            &boundaries,
            &Selection::All,
            &Selection::Only("coblong".to_string()),
        );
        assert_eq!(out.incidents.len(), 2);
        assert!(out.boundary.is_empty());
    }
}

//! Region (regency/city) filter.

use landslide_viewer_incident_models::Selection;
use landslide_viewer_spatial::BoundarySet;

use crate::view::{IncidentView, Stage};

/// Narrows `input` to the incidents strictly inside the polygons of the
/// selected region.
///
/// The sentinel keeps every incident and displays every polygon. A region
/// with no polygons yields an empty view and an empty boundary.
#[must_use]
pub fn filter_region<'a>(
    input: &IncidentView<'a>,
    boundaries: &'a BoundarySet,
    region: &Selection,
) -> Stage<'a> {
    let Some(name) = region.name() else {
        return Stage {
            incidents: input.clone(),
            boundary: boundaries.all(),
        };
    };

    let boundary = boundaries.select_region(name);
    let incidents = input.filter(|incident| boundary.contains(&incident.point));

    log::debug!(
        "Region filter '{name}': {} polygons, {} -> {} incidents",
        boundary.len(),
        input.len(),
        incidents.len()
    );

    Stage {
        incidents,
        boundary,
    }
}

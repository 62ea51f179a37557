//! Filtered views over the cached incident set.

use landslide_viewer_incident_models::Incident;
use landslide_viewer_spatial::BoundarySelection;

/// An immutable subset of incidents, borrowed from the cached dataset.
///
/// Filtering never mutates a view; every stage builds a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentView<'a> {
    incidents: Vec<&'a Incident>,
}

impl<'a> IncidentView<'a> {
    /// A view over every incident in `incidents`.
    #[must_use]
    pub fn of(incidents: &'a [Incident]) -> Self {
        Self {
            incidents: incidents.iter().collect(),
        }
    }

    /// Incidents in input order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Incident> + '_ {
        self.incidents.iter().copied()
    }

    /// Number of incidents in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    /// Whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    /// Source row indexes of the incidents in the view.
    #[must_use]
    pub fn row_indexes(&self) -> Vec<usize> {
        self.iter().map(|i| i.row_index).collect()
    }

    /// A new view holding only incidents matching `predicate`.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&Incident) -> bool) -> Self {
        Self {
            incidents: self.iter().filter(|i| predicate(i)).collect(),
        }
    }
}

impl<'a> FromIterator<&'a Incident> for IncidentView<'a> {
    fn from_iter<T: IntoIterator<Item = &'a Incident>>(iter: T) -> Self {
        Self {
            incidents: iter.into_iter().collect(),
        }
    }
}

/// Output of a location filter stage: the incidents that passed and the
/// boundary polygons to draw for them.
#[derive(Debug, Clone)]
pub struct Stage<'a> {
    /// Incidents that passed the stage.
    pub incidents: IncidentView<'a>,
    /// Boundary for display.
    pub boundary: BoundarySelection<'a>,
}

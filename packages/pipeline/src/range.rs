//! Numeric range filters over the measurement fields.
//!
//! Each field that has at least one numeric value in the current view gets
//! a [`RangeControl`] whose bounds are the truncated minimum and maximum.
//! Once a field's control exists its filter is engaged: incidents without
//! a numeric value for that field are dropped, even at full range.

use std::collections::BTreeMap;

use landslide_viewer_incident_models::MeasurementField;

use crate::view::IncidentView;

/// A requested inclusive range for one field. Either side may be left
/// open, meaning the control's own bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeRequest {
    /// Requested lower bound.
    pub min: Option<i64>,
    /// Requested upper bound.
    pub max: Option<i64>,
}

impl RangeRequest {
    /// A fully specified range.
    #[must_use]
    pub const fn between(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// The range control for one field, as computed from the view it filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeControl {
    /// Field this control filters.
    pub field: MeasurementField,
    /// Truncated smallest value in the view.
    pub min: i64,
    /// Truncated largest value in the view.
    pub max: i64,
    /// Selected lower bound, clamped into `[min, max]`.
    pub selected_min: i64,
    /// Selected upper bound, clamped into `[min, max]`.
    pub selected_max: i64,
    observed_min: f64,
    observed_max: f64,
}

impl RangeControl {
    /// Builds the control for `field` over `view`, or `None` when no
    /// incident in the view has a numeric value for it.
    #[must_use]
    pub fn for_view(
        field: MeasurementField,
        view: &IncidentView<'_>,
        request: RangeRequest,
    ) -> Option<Self> {
        let (observed_min, observed_max) = view
            .iter()
            .filter_map(|i| i.measurement(field))
            .fold(None, |acc: Option<(f64, f64)>, v| {
                Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
            })?;

        let min = truncate(observed_min);
        let max = truncate(observed_max);

        Some(Self {
            field,
            min,
            max,
            selected_min: request.min.unwrap_or(min).clamp(min, max),
            selected_max: request.max.unwrap_or(max).clamp(min, max),
            observed_min,
            observed_max,
        })
    }

    /// Whether the selection covers the control's whole range.
    #[must_use]
    pub const fn is_full_range(&self) -> bool {
        self.selected_min == self.min && self.selected_max == self.max
    }

    /// Whether `value` passes the selected range.
    ///
    /// A bound left at the control's extreme admits the exact observed
    /// extreme, so fractional minima and maxima are not cut off by the
    /// truncated bounds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accepts(&self, value: f64) -> bool {
        let lower = if self.selected_min == self.min {
            self.observed_min.min(self.min as f64)
        } else {
            self.selected_min as f64
        };
        let upper = if self.selected_max == self.max {
            self.observed_max.max(self.max as f64)
        } else {
            self.selected_max as f64
        };
        lower <= value && value <= upper
    }

    /// Applies this control to `view`. Incidents without a numeric value
    /// for the field never pass.
    #[must_use]
    pub fn apply<'a>(&self, view: &IncidentView<'a>) -> IncidentView<'a> {
        view.filter(|i| i.measurement(self.field).is_some_and(|v| self.accepts(v)))
    }
}

/// Applies every measurement field's range filter in order.
///
/// Each field's control is computed from the view left by the previous
/// fields. Fields without numeric values are skipped.
#[must_use]
pub fn filter_ranges<'a>(
    view: &IncidentView<'a>,
    requests: &BTreeMap<MeasurementField, RangeRequest>,
) -> (IncidentView<'a>, Vec<RangeControl>) {
    let mut current = view.clone();
    let mut controls = Vec::new();

    for &field in MeasurementField::ALL {
        let request = requests.get(&field).copied().unwrap_or_default();
        let Some(control) = RangeControl::for_view(field, &current, request) else {
            log::debug!("No numeric values for {field}, skipping range filter");
            continue;
        };

        let next = control.apply(&current);
        log::debug!(
            "Range filter {field} [{}, {}]: {} -> {} incidents",
            control.selected_min,
            control.selected_max,
            current.len(),
            next.len()
        );
        current = next;
        controls.push(control);
    }

    (current, controls)
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(value: f64) -> i64 {
    value as i64
}

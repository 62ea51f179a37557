//! Geocoding normalization.
//!
//! Turns raw record rows into [`Incident`]s with point geometries. Rows
//! whose coordinates are absent, or present but not coercible to finite
//! numbers, are dropped rather than repaired.

use landslide_viewer_incident_models::{
    CellValue, ColumnMapping, Incident, RawRecord, RecordTable, canonical_name,
};

/// Result of normalizing a record table.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Surviving incidents, in input row order.
    pub incidents: Vec<Incident>,
    /// Rows dropped because a coordinate was absent or null.
    pub dropped_missing: usize,
    /// Rows dropped because a coordinate could not be coerced to a number.
    pub dropped_invalid: usize,
}

impl Normalized {
    /// Total number of dropped rows.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped_missing + self.dropped_invalid
    }
}

/// Normalizes every row of `table`.
#[must_use]
pub fn normalize(table: &RecordTable, columns: &ColumnMapping) -> Normalized {
    let mut out = Normalized::default();

    for (row_index, row) in table.rows.iter().enumerate() {
        let lat_cell = present(row, &columns.latitude);
        let lon_cell = present(row, &columns.longitude);
        let (Some(lat_cell), Some(lon_cell)) = (lat_cell, lon_cell) else {
            log::debug!("Row {row_index}: missing coordinates");
            out.dropped_missing += 1;
            continue;
        };

        let (Some(latitude), Some(longitude)) = (lat_cell.to_number(), lon_cell.to_number())
        else {
            log::debug!("Row {row_index}: non-numeric coordinates {lat_cell:?}, {lon_cell:?}");
            out.dropped_invalid += 1;
            continue;
        };

        out.incidents.push(Incident {
            row_index,
            point: geo::Point::new(longitude, latitude),
            region: name_of(row, &columns.region),
            district: name_of(row, &columns.district),
            attributes: row.clone(),
        });
    }

    log::info!(
        "Normalized {} of {} records ({} missing coordinates, {} invalid coordinates)",
        out.incidents.len(),
        table.len(),
        out.dropped_missing,
        out.dropped_invalid,
    );

    out
}

fn present<'a>(row: &'a RawRecord, column: &str) -> Option<&'a CellValue> {
    row.get(column).filter(|cell| !cell.is_null())
}

fn name_of(row: &RawRecord, column: &str) -> Option<String> {
    row.get(column)
        .and_then(CellValue::to_text)
        .as_deref()
        .and_then(canonical_name)
}

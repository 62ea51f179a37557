#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Landslide incident record types.
//!
//! Raw records arrive from the record source as loosely typed tables (one
//! row per reported landslide, columns of mixed type). This crate defines
//! the cell and table shapes they are held in, the column mapping used to
//! find the location and administrative name columns, the fixed set of
//! numeric measurement fields, and the normalized [`Incident`] produced
//! once a row has a valid point geometry.

use std::collections::BTreeMap;
use std::str::FromStr;

pub use geo::Point;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Selector label meaning "no filter at this stage".
pub const ALL_SENTINEL: &str = "Semua";

/// Canonical form of a region or district name.
///
/// Every name comparison in the system goes through this function, applied
/// once when records and boundaries are ingested. Returns `None` for names
/// that are empty after trimming.
#[must_use]
pub fn canonical_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// A single cell of a raw record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Free-text value (including numbers that arrived as strings).
    Text(String),
}

impl CellValue {
    /// Converts a JSON value from the record source into a cell.
    ///
    /// Nested arrays and objects are kept as their JSON text.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::Text(s),
            other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Self::Text(other.to_string())
            }
        }
    }

    /// Converts this cell into a JSON value. Non-finite numbers become
    /// `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Converts a CSV field into a cell. Empty fields are missing.
    #[must_use]
    pub fn from_csv_field(field: &str) -> Self {
        if field.is_empty() {
            Self::Null
        } else {
            Self::Text(field.to_string())
        }
    }

    /// Whether this cell holds no value at all (before any coercion).
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Coerces this cell to a finite number.
    ///
    /// Text is trimmed and parsed; booleans map to `1.0`/`0.0`. Anything
    /// that fails to parse, and any non-finite result, is missing.
    #[must_use]
    pub fn to_number(&self) -> Option<f64> {
        let value = match self {
            Self::Null => return None,
            Self::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Renders this cell as text, or `None` if it is missing.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

/// One raw row from the record source, keyed by column name.
pub type RawRecord = BTreeMap<String, CellValue>;

/// A full table pulled from the record source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    /// Column names in source order.
    pub columns: Vec<String>,
    /// Rows in source order.
    pub rows: Vec<RawRecord>,
}

impl RecordTable {
    /// Builds a table, trimming surrounding whitespace from every column
    /// name (in the column list and in each row's keys).
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<RawRecord>) -> Self {
        let columns = columns.into_iter().map(|c| c.trim().to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(key, value)| (key.trim().to_string(), value))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Names of the record columns the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Regency/city name column.
    pub region: String,
    /// District (kecamatan) name column.
    pub district: String,
    /// Latitude in decimal degrees.
    pub latitude: String,
    /// Longitude in decimal degrees.
    pub longitude: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            region: "Regency/City".to_string(),
            district: "District".to_string(),
            latitude: "Latitude Decimals".to_string(),
            longitude: "Longitude Decimals".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Whether `column` is one of the coordinate columns.
    #[must_use]
    pub fn is_coordinate(&self, column: &str) -> bool {
        column == self.latitude || column == self.longitude
    }
}

/// Numeric measurement fields that can be range-filtered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MeasurementField {
    /// Landslide length in meters.
    Length,
    /// Landslide width in meters.
    Width,
    /// Landslide height in meters.
    Height,
    /// Elevation in meters.
    Elevation,
    /// Slope angle in degrees.
    SlopeAngle,
}

impl MeasurementField {
    /// All fields, in the order their filters are applied.
    pub const ALL: &[Self] = &[
        Self::Length,
        Self::Width,
        Self::Height,
        Self::Elevation,
        Self::SlopeAngle,
    ];

    /// Column name of this field in the record source.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Length => "Landslide Length (m)",
            Self::Width => "Landslide Width (m)",
            Self::Height => "Landslide Height (m)",
            Self::Elevation => "Elevation (m)",
            Self::SlopeAngle => "Slope Angle (°)",
        }
    }
}

/// A record that survived geocoding normalization.
///
/// Carries its point geometry (WGS84, x = longitude, y = latitude), the
/// canonical region and district names, and every original column.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    /// Position of the row in the source table.
    pub row_index: usize,
    /// Point geometry in EPSG:4326.
    pub point: Point<f64>,
    /// Canonical region name, if the record has one.
    pub region: Option<String>,
    /// Canonical district name, if the record has one.
    pub district: Option<String>,
    /// All original columns, coordinates included.
    pub attributes: RawRecord,
}

impl Incident {
    /// Latitude in decimal degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.point.y()
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.point.x()
    }

    /// The coerced numeric value of a measurement field, if present and
    /// numeric.
    #[must_use]
    pub fn measurement(&self, field: MeasurementField) -> Option<f64> {
        self.attributes
            .get(field.column_name())
            .and_then(CellValue::to_number)
    }
}

/// A selector value: the "all" sentinel or one concrete canonical name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Selection {
    /// No filtering at this stage.
    #[default]
    All,
    /// Only the named region or district (canonical form).
    Only(String),
}

impl Selection {
    /// Builds a selection from an optional raw name; absent or blank
    /// names and the sentinel mean [`Selection::All`].
    #[must_use]
    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.map_or(Self::All, |s| s.parse().unwrap_or_default())
    }

    /// Whether this is the sentinel.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// The selected canonical name, if concrete.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(name) => Some(name),
        }
    }
}

impl FromStr for Selection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match canonical_name(s) {
            None => Self::All,
            Some(name) if name == "all" || name == ALL_SENTINEL.to_lowercase() => Self::All,
            Some(name) => Self::Only(name),
        })
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str(ALL_SENTINEL),
            Self::Only(name) => f.write_str(name),
        }
    }
}

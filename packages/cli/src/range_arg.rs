//! Parsing for `--range field=lo,hi` arguments.

use std::str::FromStr;

use landslide_viewer_incident_models::MeasurementField;
use landslide_viewer_pipeline::RangeRequest;
use thiserror::Error;

/// Errors from parsing a range argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeArgError {
    /// The argument has no `=`.
    #[error("expected FIELD=LO,HI, got '{0}'")]
    MissingEquals(String),

    /// The field name is not a measurement field.
    #[error("unknown field '{0}' (expected one of length, width, height, elevation, slope_angle)")]
    UnknownField(String),

    /// A bound is not an integer.
    #[error("invalid bound '{0}'")]
    InvalidBound(String),
}

/// One `--range` argument: a field and the requested bounds. Either bound
/// may be left empty (`elevation=750,` or `elevation=,1300`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeArg {
    /// Field to filter.
    pub field: MeasurementField,
    /// Requested bounds.
    pub request: RangeRequest,
}

impl FromStr for RangeArg {
    type Err = RangeArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, bounds) = s
            .split_once('=')
            .ok_or_else(|| RangeArgError::MissingEquals(s.to_string()))?;

        let field = field.trim();
        let field: MeasurementField = field
            .parse()
            .map_err(|_| RangeArgError::UnknownField(field.to_string()))?;

        let (lo, hi) = bounds.split_once(',').unwrap_or((bounds, ""));
        Ok(Self {
            field,
            request: RangeRequest {
                min: parse_bound(lo)?,
                max: parse_bound(hi)?,
            },
        })
    }
}

fn parse_bound(s: &str) -> Result<Option<i64>, RangeArgError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    s.parse()
        .map(Some)
        .map_err(|_| RangeArgError::InvalidBound(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_and_open_ranges() {
        let arg: RangeArg = "elevation=750,1300".parse().unwrap();
        assert_eq!(arg.field, MeasurementField::Elevation);
        assert_eq!(arg.request, RangeRequest::between(750, 1300));

        let arg: RangeArg = "slope_angle=,45".parse().unwrap();
        assert_eq!(arg.field, MeasurementField::SlopeAngle);
        assert_eq!(
            arg.request,
            RangeRequest {
                min: None,
                max: Some(45)
            }
        );

        let arg: RangeArg = "length=10".parse().unwrap();
        assert_eq!(
            arg.request,
            RangeRequest {
                min: Some(10),
                max: None
            }
        );
    }

    #[test]
    fn rejects_malformed_ranges() {
        assert_eq!(
            "elevation".parse::<RangeArg>(),
            Err(RangeArgError::MissingEquals("elevation".to_string()))
        );
        assert_eq!(
            "depth=1,2".parse::<RangeArg>(),
            Err(RangeArgError::UnknownField("depth".to_string()))
        );
        assert_eq!(
            "height=a,2".parse::<RangeArg>(),
            Err(RangeArgError::InvalidBound("a".to_string()))
        );
        assert_eq!(
            "elevation=750:1300".parse::<RangeArg>(),
            Err(RangeArgError::InvalidBound("750:1300".to_string()))
        );
    }
}

use thiserror::Error;

use crate::category::Category;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid record id: {0:?}")]
    InvalidRecordId(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// Why a GeoJSON value could not be turned into a [`crate::Geometry`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("geometry is missing")]
    Missing,
    #[error("geometry is not valid GeoJSON: {0}")]
    Malformed(String),
    #[error("unsupported geometry type: {0}")]
    UnsupportedType(String),
    #[error("coordinate out of range: lat={lat}, lon={lon}")]
    OutOfRange { lat: f64, lon: f64 },
    #[error("polygon ring has {0} positions (at least 3 required)")]
    DegenerateRing(usize),
}

/// A fetched row that cannot become a record.
///
/// Rows failing with one of these are skipped; sibling rows of the same
/// fetch are still decoded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("row is not a JSON object")]
    NotAnObject,
    #[error("row has no usable `{column}` identity")]
    MissingId { column: &'static str },
    #[error("{category} rows need {expected} geometry, found {found}")]
    UnexpectedGeometry {
        category: Category,
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("row could not be decoded: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for RowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

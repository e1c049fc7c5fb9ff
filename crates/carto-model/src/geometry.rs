//! Geographic geometry decoded from the GeoJSON cells of the remote views.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GeometryError;

/// A WGS84 position. GeoJSON stores `[lon, lat]`; this type is lat/lon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeometryError> {
        let in_range = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if !in_range {
            return Err(GeometryError::OutOfRange { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    fn from_position(position: &[f64]) -> Result<Self, GeometryError> {
        match position {
            [lon, lat, ..] => Self::new(*lat, *lon),
            _ => Err(GeometryError::Malformed(format!(
                "position needs 2 numbers, got {}",
                position.len()
            ))),
        }
    }
}

/// A closed ring of positions (first and last may or may not repeat).
pub type Ring = Vec<LatLng>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(LatLng),
    MultiPoint(Vec<LatLng>),
    /// Outer ring followed by holes.
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Decodes a GeoJSON geometry.
    ///
    /// A `Feature` is unwrapped to its geometry and a string cell is parsed
    /// as JSON first, since some views serialise the column as text.
    pub fn from_geojson(value: &Value) -> Result<Self, GeometryError> {
        match value {
            Value::Null => Err(GeometryError::Missing),
            Value::String(text) => {
                let parsed: Value = serde_json::from_str(text)
                    .map_err(|e| GeometryError::Malformed(e.to_string()))?;
                Self::from_geojson(&parsed)
            }
            Value::Object(map) => Self::from_object(map),
            other => Err(GeometryError::Malformed(format!(
                "expected an object, got {}",
                json_kind(other)
            ))),
        }
    }

    fn from_object(map: &Map<String, Value>) -> Result<Self, GeometryError> {
        let kind = map
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| GeometryError::Malformed("missing `type`".to_string()))?;

        match kind {
            "Feature" => Self::from_geojson(map.get("geometry").unwrap_or(&Value::Null)),
            "Point" => {
                let position: Vec<f64> = coordinates(map)?;
                Ok(Self::Point(LatLng::from_position(&position)?))
            }
            "MultiPoint" => {
                let positions: Vec<Vec<f64>> = coordinates(map)?;
                let points = positions
                    .iter()
                    .map(|p| LatLng::from_position(p))
                    .collect::<Result<Vec<_>, _>>()?;
                if points.is_empty() {
                    return Err(GeometryError::Malformed("empty MultiPoint".to_string()));
                }
                Ok(Self::MultiPoint(points))
            }
            "Polygon" => {
                let rings: Vec<Vec<Vec<f64>>> = coordinates(map)?;
                Ok(Self::Polygon(polygon(&rings)?))
            }
            "MultiPolygon" => {
                let polygons: Vec<Vec<Vec<Vec<f64>>>> = coordinates(map)?;
                if polygons.is_empty() {
                    return Err(GeometryError::Malformed("empty MultiPolygon".to_string()));
                }
                let decoded = polygons
                    .iter()
                    .map(|rings| polygon(rings))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::MultiPolygon(decoded))
            }
            other => Err(GeometryError::UnsupportedType(other.to_string())),
        }
    }

    /// GeoJSON type name.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::MultiPoint(_) => "MultiPoint",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }

    pub fn is_area(&self) -> bool {
        matches!(self, Self::Polygon(_) | Self::MultiPolygon(_))
    }

    /// Point positions; empty for areas.
    pub fn points(&self) -> Vec<LatLng> {
        match self {
            Self::Point(p) => vec![*p],
            Self::MultiPoint(points) => points.clone(),
            Self::Polygon(_) | Self::MultiPolygon(_) => Vec::new(),
        }
    }
}

fn coordinates<T: DeserializeOwned>(map: &Map<String, Value>) -> Result<T, GeometryError> {
    let raw = map
        .get("coordinates")
        .ok_or_else(|| GeometryError::Malformed("missing `coordinates`".to_string()))?;
    T::deserialize(raw).map_err(|e| GeometryError::Malformed(e.to_string()))
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Result<Vec<Ring>, GeometryError> {
    if rings.is_empty() {
        return Err(GeometryError::DegenerateRing(0));
    }
    rings
        .iter()
        .map(|ring| -> Result<Ring, GeometryError> {
            if ring.len() < 3 {
                return Err(GeometryError::DegenerateRing(ring.len()));
            }
            ring.iter().map(|p| LatLng::from_position(p)).collect()
        })
        .collect()
}

/// Article and name of a JSON value's type, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_point_swaps_to_lat_lon() {
        let geometry =
            Geometry::from_geojson(&json!({"type": "Point", "coordinates": [2.436, 50.969]}))
                .unwrap();
        assert_eq!(geometry, Geometry::Point(LatLng { lat: 50.969, lon: 2.436 }));
    }

    #[test]
    fn test_feature_and_string_are_unwrapped() {
        let feature = json!({
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}
        });
        assert_eq!(Geometry::from_geojson(&feature).unwrap().kind_name(), "Point");

        let text = json!("{\"type\":\"Point\",\"coordinates\":[1.0,2.0]}");
        assert_eq!(Geometry::from_geojson(&text).unwrap().kind_name(), "Point");
    }

    #[test]
    fn test_polygon_rings() {
        let polygon = json!({
            "type": "Polygon",
            "coordinates": [[[2.0, 50.0], [2.1, 50.0], [2.1, 50.1], [2.0, 50.0]]]
        });
        let geometry = Geometry::from_geojson(&polygon).unwrap();
        assert!(geometry.is_area());
        assert!(geometry.points().is_empty());
    }

    #[test]
    fn test_rejects_bad_geometry() {
        assert_eq!(
            Geometry::from_geojson(&Value::Null),
            Err(GeometryError::Missing)
        );
        assert!(matches!(
            Geometry::from_geojson(&json!({"type": "LineString", "coordinates": []})),
            Err(GeometryError::UnsupportedType(_))
        ));
        assert!(matches!(
            Geometry::from_geojson(&json!({"type": "Point", "coordinates": [200.0, 10.0]})),
            Err(GeometryError::OutOfRange { .. })
        ));
        assert!(matches!(
            Geometry::from_geojson(&json!({"type": "Polygon", "coordinates": [[[0.0, 0.0]]]})),
            Err(GeometryError::DegenerateRing(1))
        ));
        assert!(matches!(
            Geometry::from_geojson(&json!({"type": "Point"})),
            Err(GeometryError::Malformed(_))
        ));
    }

    #[test]
    fn test_json_kind_names_value_types() {
        assert_eq!(json_kind(&json!(null)), "null");
        assert_eq!(json_kind(&json!([1, 2])), "an array");
        assert_eq!(json_kind(&json!({"rows": []})), "an object");
    }
}

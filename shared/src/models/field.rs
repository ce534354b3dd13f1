//! Field boundary model

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FieldResult};
use crate::geometry;
use crate::types::GeoPoint;

/// A closed field boundary ring
///
/// Construction always closes the ring, so the first and last points coincide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<GeoPoint>", into = "Vec<GeoPoint>")]
pub struct FieldGeometry {
    points: Vec<GeoPoint>,
}

impl FieldGeometry {
    /// Validate coordinates and close the ring
    pub fn new(points: Vec<GeoPoint>) -> FieldResult<Self> {
        crate::validation::validate_coordinates(&points)?;
        let points = geometry::close_polygon(&points)?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Planar area in square degrees
    pub fn area(&self) -> f64 {
        geometry::area(&self.points)
    }

    pub fn centroid(&self) -> GeoPoint {
        // A constructed geometry always has at least three vertices
        geometry::centroid(&self.points).unwrap_or(self.points[0])
    }

    /// Outer ring as GeoJSON `[lng, lat]` positions
    pub fn to_geojson_ring(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| [p.lng, p.lat]).collect()
    }
}

impl TryFrom<Vec<GeoPoint>> for FieldGeometry {
    type Error = FieldError;

    fn try_from(points: Vec<GeoPoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<FieldGeometry> for Vec<GeoPoint> {
    fn from(geometry: FieldGeometry) -> Self {
        geometry.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_is_closed_on_construction() {
        let geometry = FieldGeometry::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.001),
            GeoPoint::new(0.001, 0.001),
        ])
        .unwrap();

        let points = geometry.points();
        assert_eq!(points.len(), 4);
        assert!(points[0].coincides_with(&points[3]));
    }

    #[test]
    fn test_geometry_deserialize_closes_and_validates() {
        let json = r#"[{"lat":0.0,"lng":0.0},{"lat":0.0,"lng":1.0},{"lat":1.0,"lng":1.0}]"#;
        let geometry: FieldGeometry = serde_json::from_str(json).unwrap();
        assert_eq!(geometry.points().len(), 4);

        let bad = r#"[{"lat":0.0,"lng":0.0},{"lat":0.0,"lng":1.0}]"#;
        assert!(serde_json::from_str::<FieldGeometry>(bad).is_err());
    }

    #[test]
    fn test_geojson_ring_is_lng_lat() {
        let geometry = FieldGeometry::new(vec![
            GeoPoint::new(1.0, 2.0),
            GeoPoint::new(1.0, 3.0),
            GeoPoint::new(2.0, 3.0),
        ])
        .unwrap();
        assert_eq!(geometry.to_geojson_ring()[0], [2.0, 1.0]);
    }
}

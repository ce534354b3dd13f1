//! Planar polygon utilities over latitude/longitude rings
//!
//! All computations work directly in degree units. Areas are therefore in
//! square degrees and only meaningful for comparing fields of similar latitude.

use std::collections::HashSet;
use std::f64::consts::PI;

use crate::error::{FieldError, FieldResult};
use crate::types::GeoPoint;

/// Number of vertices used for zone outlines
pub const OCTAGON_VERTICES: usize = 8;

/// Count distinct vertices by exact coordinate value
pub fn distinct_vertex_count(points: &[GeoPoint]) -> usize {
    points
        .iter()
        .map(|p| (p.lat.to_bits(), p.lng.to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

/// Close a ring by repeating the first vertex when the last one differs
pub fn close_polygon(points: &[GeoPoint]) -> FieldResult<Vec<GeoPoint>> {
    if distinct_vertex_count(points) < 3 {
        return Err(FieldError::InvalidGeometry(format!(
            "a field boundary needs at least 3 distinct points, got {}",
            distinct_vertex_count(points)
        )));
    }

    let mut ring = points.to_vec();
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if !first.coincides_with(last) {
            ring.push(*first);
        }
    }
    Ok(ring)
}

/// Shoelace area in square degrees (x = lng, y = lat)
///
/// Works on open or closed rings: the wrap-around edge of a closed ring
/// contributes zero.
pub fn area(points: &[GeoPoint]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let twice_area: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.lng * b.lat - b.lng * a.lat
        })
        .sum();

    twice_area.abs() / 2.0
}

/// Arithmetic mean of the ring's vertices, ignoring the closing duplicate
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    let vertices = match points {
        [] => return None,
        [first, .., last] if first.coincides_with(last) => &points[..points.len() - 1],
        _ => points,
    };

    let n = vertices.len() as f64;
    let (lat_sum, lng_sum) = vertices
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));

    Some(GeoPoint::new(lat_sum / n, lng_sum / n))
}

/// Closed octagon around `center`, used as a treatment-zone outline
pub fn octagon(center: GeoPoint, radius_degrees: f64) -> Vec<GeoPoint> {
    let mut ring: Vec<GeoPoint> = (0..OCTAGON_VERTICES)
        .map(|i| {
            let angle = (i as f64) * 2.0 * PI / OCTAGON_VERTICES as f64;
            GeoPoint::new(
                center.lat + radius_degrees * angle.cos(),
                center.lng + radius_degrees * angle.sin(),
            )
        })
        .collect();

    ring.push(ring[0]);
    ring
}

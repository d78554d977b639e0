//! Spatial math for distances, offsets and sampling rings.

use crate::models::Coordinate;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate great-circle distance between two points using the haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Offset a position by distance and bearing.
///
/// # Arguments
/// * `lat`, `lon` - Starting position in degrees
/// * `distance_m` - Distance in meters
/// * `bearing_rad` - Bearing in radians (0 = north, π/2 = east)
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}

/// Points at `radius_m` around `center`, evenly spaced starting due north.
pub fn ring_points(center: Coordinate, radius_m: f64, count: usize) -> Vec<Coordinate> {
    if count == 0 {
        return Vec::new();
    }
    (0..count)
        .map(|i| {
            let bearing = (i as f64) * std::f64::consts::TAU / count as f64;
            let (lat, lon) = offset_by_bearing(center.lat, center.lon, radius_m, bearing);
            Coordinate::new(lat, lon)
        })
        .collect()
}

/// Closed circle ring in GeoJSON `[lon, lat]` order.
///
/// The first vertex is repeated at the end, so the ring has `segments + 1` entries.
pub fn circle_ring(center: Coordinate, radius_m: f64, segments: usize) -> Vec<[f64; 2]> {
    let mut ring: Vec<[f64; 2]> = ring_points(center, radius_m, segments.max(3))
        .into_iter()
        .map(|point| [point.lon, point.lat])
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    ring
}

/// Linear interpolation between two points, `samples + 1` points inclusive.
pub fn interpolate_path(start: Coordinate, end: Coordinate, samples: usize) -> Vec<Coordinate> {
    let samples = samples.max(1);
    (0..=samples)
        .map(|i| {
            let ratio = i as f64 / samples as f64;
            Coordinate::new(
                start.lat + (end.lat - start.lat) * ratio,
                start.lon + (end.lon - start.lon) * ratio,
            )
        })
        .collect()
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_distance(3.1390, 101.6869, 3.1390, 101.6869);
        assert!(dist < 0.001);
    }

    #[test]
    fn ring_points_sit_on_the_radius() {
        let center = Coordinate::new(5.737, 100.417);
        let ring = ring_points(center, 100.0, 8);
        assert_eq!(ring.len(), 8);
        for point in &ring {
            let dist = center.distance_m(point);
            assert!((dist - 100.0).abs() < 0.5, "expected ~100m, got {dist}");
        }
        // First sample is due north.
        assert!(ring[0].lat > center.lat);
        assert!((ring[0].lon - center.lon).abs() < 1e-9);
    }

    #[test]
    fn circle_ring_is_closed_in_lon_lat_order() {
        let center = Coordinate::new(3.0, 101.0);
        let ring = circle_ring(center, 500.0, 32);
        assert_eq!(ring.len(), 33);
        assert_eq!(ring.first(), ring.last());
        // North vertex: same lon, larger lat.
        assert!((ring[0][0] - 101.0).abs() < 1e-9);
        assert!(ring[0][1] > 3.0);

        for vertex in &ring {
            let point = Coordinate::new(vertex[1], vertex[0]);
            assert!((center.distance_m(&point) - 500.0).abs() < 0.01);
        }
    }

    #[test]
    fn interpolate_path_includes_both_ends() {
        let start = Coordinate::new(1.0, 100.0);
        let end = Coordinate::new(2.0, 101.0);
        let points = interpolate_path(start, end, 20);
        assert_eq!(points.len(), 21);
        assert_eq!(points[0], start);
        assert_eq!(points[20], end);
        assert!((points[10].lat - 1.5).abs() < 1e-12);
    }

    #[test]
    fn round_to_handles_decimals() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(6.94, 1), 6.9);
    }
}

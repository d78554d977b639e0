//! Terrain clearance analysis along a straight flight path.

use serde::{Deserialize, Serialize};

use crate::models::Coordinate;
use crate::spatial::{interpolate_path, round_to};

/// Number of segments sampled between start and end.
pub const PATH_SEGMENTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationPoint {
    pub distance_km: f64,
    pub elevation_m: f64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationPathAnalysis {
    pub max_obstacle_elevation: Option<f64>,
    pub min_elevation: Option<f64>,
    pub elevation_range: Option<f64>,
    pub obstacles: Vec<ElevationPoint>,
    pub safe: bool,
    pub path_distance_km: f64,
    pub flight_altitude_m: f64,
    pub ground_clearance_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Sample positions for a path, start and end included.
pub fn path_samples(start: Coordinate, end: Coordinate) -> Vec<Coordinate> {
    interpolate_path(start, end, PATH_SEGMENTS)
}

/// Flag samples whose terrain rises into the lower half of the flight altitude.
///
/// `elevations` pairs with `samples`; the first sample is the launch point and
/// the flight altitude is measured above it.
pub fn analyze_path(
    samples: &[Coordinate],
    elevations: &[Option<f64>],
    flight_altitude_m: f64,
) -> ElevationPathAnalysis {
    let (Some(start), Some(end)) = (samples.first(), samples.last()) else {
        return unavailable(0.0, flight_altitude_m);
    };
    let total_km = start.distance_km(end);
    let known: Vec<f64> = elevations.iter().flatten().copied().collect();
    if known.is_empty() {
        return unavailable(total_km, flight_altitude_m);
    }

    let max = known.iter().copied().fold(f64::MIN, f64::max);
    let min = known.iter().copied().fold(f64::MAX, f64::min);
    let launch = elevations.first().copied().flatten().unwrap_or(min);
    let ceiling = launch + flight_altitude_m * 0.5;
    let segments = samples.len().saturating_sub(1).max(1) as f64;

    let obstacles = samples
        .iter()
        .zip(elevations.iter())
        .enumerate()
        .filter_map(|(i, (point, elevation))| {
            let elevation = (*elevation)?;
            (elevation > ceiling).then(|| ElevationPoint {
                distance_km: round_to(i as f64 / segments * total_km, 2),
                elevation_m: round_to(elevation, 1),
                latitude: point.lat,
                longitude: point.lon,
            })
        })
        .collect::<Vec<_>>();

    ElevationPathAnalysis {
        max_obstacle_elevation: Some(round_to(max, 1)),
        min_elevation: Some(round_to(min, 1)),
        elevation_range: Some(round_to(max - min, 1)),
        safe: obstacles.is_empty(),
        obstacles,
        path_distance_km: round_to(total_km, 2),
        flight_altitude_m,
        ground_clearance_m: flight_altitude_m,
        message: None,
    }
}

fn unavailable(total_km: f64, flight_altitude_m: f64) -> ElevationPathAnalysis {
    ElevationPathAnalysis {
        max_obstacle_elevation: None,
        min_elevation: None,
        elevation_range: None,
        obstacles: Vec::new(),
        safe: true,
        path_distance_km: round_to(total_km, 2),
        flight_altitude_m,
        ground_clearance_m: flight_altitude_m,
        message: Some("Elevation data unavailable for path".to_string()),
    }
}

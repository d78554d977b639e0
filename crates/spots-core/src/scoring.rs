//! Safety, accessibility, slope and terrain scoring for enriched spots.

use crate::models::{
    CarAccessibility, Category, Coordinate, RoadSample, SafeArea, SlopeSummary, TerrainType,
    WeatherSnapshot,
};
use crate::rules::{SearchRules, WeatherLimits};
use crate::spatial::{circle_ring, round_to};

/// Whether current conditions allow flying. Missing weather counts as safe.
pub fn is_weather_safe(weather: Option<&WeatherSnapshot>, limits: &WeatherLimits) -> bool {
    let Some(weather) = weather else {
        return true;
    };
    let wind_ok = weather.wind_speed.unwrap_or(0.0) < limits.max_wind_mps;
    let visibility_ok = weather.visibility > limits.min_visibility_m;
    let condition_ok = weather
        .weather_main
        .as_deref()
        .map(|main| !limits.unsafe_conditions.iter().any(|c| c == main))
        .unwrap_or(true);
    wind_ok && visibility_ok && condition_ok
}

/// Inputs of the safety score.
#[derive(Debug, Clone, Default)]
pub struct SafetyInputs<'a> {
    pub no_fly_zones_nearby: usize,
    pub elevation_m: Option<f64>,
    pub max_slope_pct: Option<f64>,
    pub weather: Option<&'a WeatherSnapshot>,
}

/// Safety score from 0 to 10.
pub fn safety_score(inputs: &SafetyInputs<'_>, rules: &SearchRules) -> f64 {
    let mut score: f64 = 10.0;

    score -= 3.0 * inputs.no_fly_zones_nearby as f64;

    if inputs.elevation_m.is_some_and(|e| e > 100.0) {
        score += 1.0;
    }

    if let Some(slope) = inputs.max_slope_pct {
        if slope > 30.0 {
            score -= 3.0;
        } else if slope > 20.0 {
            score -= 1.5;
        } else if slope > 10.0 {
            score -= 0.5;
        }
    }

    if let Some(weather) = inputs.weather {
        let limits = &rules.weather;
        if is_weather_safe(Some(weather), limits) {
            score += 0.5;
        } else {
            let wind = weather.wind_speed.unwrap_or(0.0);
            if wind > limits.max_wind_mps {
                score -= 2.0;
            } else if wind > limits.windy_mps {
                score -= 1.0;
            }
            if weather
                .weather_main
                .as_deref()
                .is_some_and(|main| limits.precipitation.iter().any(|c| c == main))
            {
                score -= 2.0;
            }
            if weather.visibility < limits.min_visibility_m {
                score -= 1.0;
            }
        }
    }

    score.clamp(0.0, 10.0)
}

/// Car accessibility from the nearest road and nearest parking.
pub fn car_accessibility(
    nearest_road: Option<&RoadSample>,
    nearest_parking_m: Option<f64>,
) -> CarAccessibility {
    let Some(road) = nearest_road else {
        return CarAccessibility::no_roads();
    };

    let mut score: f64 = 10.0;
    if road.distance_m > 500.0 {
        score -= 3.0;
    } else if road.distance_m > 200.0 {
        score -= 1.5;
    } else if road.distance_m > 100.0 {
        score -= 0.5;
    }

    match road.highway.as_str() {
        "motorway" | "trunk" | "primary" => score += 1.0,
        "unclassified" | "residential" | "service" => score -= 1.0,
        "track" | "path" => score -= 2.0,
        _ => {}
    }

    if let Some(surface) = road.surface.as_deref().map(str::to_lowercase) {
        if ["unpaved", "dirt", "gravel"].iter().any(|s| surface.contains(s)) {
            score -= 1.5;
        } else if ["paved", "asphalt", "concrete"].iter().any(|s| surface.contains(s)) {
            score += 0.5;
        }
    }

    match nearest_parking_m {
        Some(d) if d < 100.0 => score += 1.5,
        Some(d) if d < 200.0 => score += 1.0,
        Some(d) if d < 300.0 => score += 0.5,
        Some(_) => {}
        None => score -= 0.5,
    }

    CarAccessibility {
        accessible: true,
        score: round_to(score.clamp(0.0, 10.0), 1),
        nearest_road_distance_m: Some(round_to(road.distance_m, 1)),
        road_type: Some(road.highway.clone()),
        road_surface: road.surface.clone(),
        parking_available: nearest_parking_m.is_some(),
        parking_distance_m: nearest_parking_m.map(|d| round_to(d, 1)),
        reason: None,
    }
}

/// Slope summary from the centre elevation and ring samples.
pub fn slope_summary(
    center_m: Option<f64>,
    ring_m: &[Option<f64>],
    radius_m: f64,
    rules: &SearchRules,
) -> SlopeSummary {
    let Some(center) = center_m else {
        return SlopeSummary::unknown(0);
    };
    let samples: Vec<f64> = ring_m.iter().flatten().copied().collect();
    if samples.len() < rules.min_slope_samples || radius_m <= 0.0 {
        return SlopeSummary::unknown(samples.len());
    }

    let max_slope = samples
        .iter()
        .map(|e| (e - center).abs() / radius_m * 100.0)
        .fold(0.0_f64, f64::max);
    let max_slope = round_to(max_slope, 1);

    SlopeSummary {
        max_slope_pct: Some(max_slope),
        is_safe: max_slope < rules.max_safe_slope_pct,
        samples: samples.len(),
    }
}

/// Recommended flying area, only for spots safe enough to warrant one.
pub fn safe_area(center: Coordinate, safety: f64, rules: &SearchRules) -> Option<SafeArea> {
    if safety < rules.safe_area_min_score {
        return None;
    }
    let radius_m = if safety >= 9.0 {
        1000.0
    } else if safety >= 8.0 {
        750.0
    } else {
        500.0
    };
    Some(SafeArea {
        kind: "Polygon".to_string(),
        coordinates: vec![circle_ring(center, radius_m, rules.safe_area_segments)],
        radius_m,
    })
}

pub fn terrain_type(elevation_m: Option<f64>, category: Category) -> TerrainType {
    if category == Category::Beach {
        return TerrainType::Coastal;
    }
    match elevation_m {
        Some(e) if e > 500.0 => TerrainType::Mountainous,
        Some(e) if e > 100.0 => TerrainType::Hilly,
        _ => TerrainType::Flat,
    }
}

//! Tunable thresholds and weights for spot search.

use serde::{Deserialize, Serialize};

/// Configuration for filtering, scoring and ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRules {
    /// Minimum relevance score to keep a candidate
    pub relevance_threshold: f64,
    /// Relaxed relevance threshold inside low-coverage sub-regions
    pub low_coverage_relevance_threshold: f64,
    /// Radius multiplier applied to searches in low-coverage sub-regions
    pub low_coverage_radius_factor: f64,
    /// Fewer candidates than this triggers the broadened fallback query
    pub low_coverage_min_candidates: usize,
    /// Radius floor inside low-coverage sub-regions (km)
    pub low_coverage_min_radius_km: f64,
    /// Radius floor when the query names a whole region (km)
    pub region_query_min_radius_km: f64,
    /// Radius floor for the no-fly-zone lookup (km)
    pub no_fly_min_radius_km: f64,
    pub airport_radius_km: f64,
    pub military_radius_km: f64,
    /// Distance to a reference spot that earns the relevance bonus (km)
    pub reference_spot_radius_km: f64,
    /// Ring radius for slope sampling (m)
    pub slope_radius_m: f64,
    pub slope_samples: usize,
    pub min_slope_samples: usize,
    /// Slopes at or above this percentage are unsafe
    pub max_safe_slope_pct: f64,
    /// Safety score required before a safe-area polygon is drawn
    pub safe_area_min_score: f64,
    pub safe_area_segments: usize,
    pub road_search_radius_m: f64,
    pub parking_search_radius_m: f64,
    pub weather: WeatherLimits,
    pub ranking: RankingWeights,
}

impl Default for SearchRules {
    fn default() -> Self {
        Self {
            relevance_threshold: 5.0,
            low_coverage_relevance_threshold: 3.0,
            low_coverage_radius_factor: 1.5,
            low_coverage_min_candidates: 5,
            low_coverage_min_radius_km: 15.0,
            region_query_min_radius_km: 50.0,
            no_fly_min_radius_km: 50.0,
            airport_radius_km: 5.0,
            military_radius_km: 3.0,
            reference_spot_radius_km: 5.0,
            slope_radius_m: 100.0,
            slope_samples: 8,
            min_slope_samples: 3,
            max_safe_slope_pct: 30.0,
            safe_area_min_score: 7.0,
            safe_area_segments: 32,
            road_search_radius_m: 1000.0,
            parking_search_radius_m: 500.0,
            weather: WeatherLimits::default(),
            ranking: RankingWeights::default(),
        }
    }
}

impl SearchRules {
    pub fn relevance_threshold_for(&self, low_coverage: bool) -> f64 {
        if low_coverage {
            self.low_coverage_relevance_threshold
        } else {
            self.relevance_threshold
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherLimits {
    /// Wind at or above this speed (m/s) is unsafe
    pub max_wind_mps: f64,
    /// Unsafe weather with wind above this (m/s) costs a point
    pub windy_mps: f64,
    /// Visibility must exceed this (m)
    pub min_visibility_m: f64,
    pub unsafe_conditions: Vec<String>,
    /// Conditions that cost extra safety points
    pub precipitation: Vec<String>,
}

impl Default for WeatherLimits {
    fn default() -> Self {
        Self {
            max_wind_mps: 15.0,
            windy_mps: 10.0,
            min_visibility_m: 5_000.0,
            unsafe_conditions: ["Rain", "Snow", "Thunderstorm", "Drizzle"]
                .into_iter()
                .map(String::from)
                .collect(),
            precipitation: ["Rain", "Snow", "Thunderstorm"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Weights of the composite ranking key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub safety: f64,
    pub distance_relevance: f64,
    pub car_access: f64,
    /// Distance relevance drops by this much per kilometer
    pub distance_decay_per_km: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            safety: 4.0,
            distance_relevance: 0.3,
            car_access: 2.0,
            distance_decay_per_km: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overrides_keep_defaults() {
        let rules: SearchRules =
            serde_json::from_str(r#"{"relevance_threshold": 10, "ranking": {"safety": 5}}"#)
                .expect("parse rules");
        assert_eq!(rules.relevance_threshold, 10.0);
        assert_eq!(rules.low_coverage_relevance_threshold, 3.0);
        assert_eq!(rules.ranking.safety, 5.0);
        assert_eq!(rules.ranking.car_access, 2.0);
    }

    #[test]
    fn threshold_depends_on_coverage() {
        let rules = SearchRules::default();
        assert_eq!(rules.relevance_threshold_for(true), 3.0);
        assert_eq!(rules.relevance_threshold_for(false), 5.0);
    }
}

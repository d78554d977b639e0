//! Composite ranking of enriched spots.

use std::cmp::Ordering;

use crate::models::EnrichedSpot;
use crate::rules::RankingWeights;

/// Relevance of a distance on a 0-100 scale.
pub fn distance_relevance(distance_km: f64, weights: &RankingWeights) -> f64 {
    (100.0 - distance_km * weights.distance_decay_per_km).max(0.0)
}

/// Ascending sort key: lower sorts first.
pub fn rank_key(spot: &EnrichedSpot, weights: &RankingWeights) -> [f64; 4] {
    [
        -(spot.safety_score * weights.safety),
        -(distance_relevance(spot.distance_km, weights) * weights.distance_relevance),
        -(spot.car_accessibility.score * weights.car_access),
        spot.distance_km,
    ]
}

fn compare_keys(a: &[f64; 4], b: &[f64; 4]) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.partial_cmp(y).unwrap_or(Ordering::Equal))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Stable sort by the composite key, then truncate.
pub fn rank_spots(
    mut spots: Vec<EnrichedSpot>,
    weights: &RankingWeights,
    max_results: usize,
) -> Vec<EnrichedSpot> {
    spots.sort_by(|a, b| compare_keys(&rank_key(a, weights), &rank_key(b, weights)));
    spots.truncate(max_results);
    spots
}

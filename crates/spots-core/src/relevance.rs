//! Relevance pre-filter score (0-100) for raw candidates.

use crate::classify::COMPANY_INDICATORS;
use crate::models::{Candidate, Coordinate};
use crate::profile::RegionProfile;
use crate::rules::SearchRules;

/// Score assigned to candidates without usable coordinates.
pub const NO_POSITION_SCORE: f64 = 20.0;

/// Score how well a candidate suits drone flying, relative to the query point.
pub fn relevance_score(
    candidate: &Candidate,
    query_point: Coordinate,
    profile: &RegionProfile,
    rules: &SearchRules,
) -> f64 {
    let Some(position) = candidate.position() else {
        return NO_POSITION_SCORE;
    };
    let tags = &candidate.tags;
    let mut score: f64 = 50.0;

    if tags.has("office") || tags.has("industrial") {
        score -= 50.0;
    }
    if tags.is_any("landuse", &["industrial", "commercial"]) {
        score -= 50.0;
    }
    if tags.is_any("amenity", &["office", "company"]) {
        score -= 50.0;
    }
    let name = tags.name().unwrap_or_default().to_lowercase();
    if COMPANY_INDICATORS.iter().any(|keyword| name.contains(keyword)) {
        score -= 40.0;
    }

    let distance_km = position.distance_km(&query_point);
    score += if distance_km < 1.0 {
        30.0
    } else if distance_km < 5.0 {
        20.0
    } else if distance_km < 10.0 {
        10.0
    } else if distance_km > 20.0 {
        -10.0
    } else {
        0.0
    };

    if tags.is("area", "yes") {
        score += 15.0;
    }
    if let Some(hectares) = tags.get("area:ha").and_then(|v| v.trim().parse::<f64>().ok()) {
        if hectares > 10.0 {
            score += 20.0;
        } else if hectares > 5.0 {
            score += 10.0;
        } else if hectares > 1.0 {
            score += 5.0;
        }
    }

    if tags.has("wikipedia") || tags.has("wikidata") {
        score += 10.0;
    }
    if tags.is_any("tourism", &["attraction", "viewpoint"])
        && !tags.has("office")
        && !tags.is("landuse", "industrial")
    {
        score += 15.0;
    }
    if tags.has("historic") {
        score += 10.0;
    }
    if tags.non_empty("name").is_some() {
        score += 5.0;
    }
    if tags.has("name:en") {
        score += 3.0;
    }

    if tags.is_any("access", &["private", "no"]) {
        score -= 20.0;
    }
    if tags.has("barrier") {
        score -= 10.0;
    }

    if tags.is_any(
        "leisure",
        &["park", "recreation_ground", "sports_centre", "stadium"],
    ) {
        score += 15.0;
    }
    if tags.is("natural", "beach") {
        score += 20.0;
    }
    if tags.is("natural", "peak") || tags.is("tourism", "viewpoint") {
        score += 15.0;
    }

    if profile.near_reference_spot(position, rules.reference_spot_radius_km) {
        score += 10.0;
    }

    score.clamp(0.0, 100.0)
}

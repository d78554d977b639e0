//! Road and parking proximity lookup.

use spots_core::{car_accessibility, CarAccessibility, Candidate, Coordinate, RoadSample, SearchRules};
use std::sync::Arc;

use crate::cache::{CoordKey, SignalCaches};
use crate::providers::{
    ProviderError, QueryPurpose, SearchArea, SpatialIndex, SpatialQuery, TagClause,
};

const ROAD_TIMEOUT_S: u64 = 10;
const PARKING_TIMEOUT_S: u64 = 5;

fn nearest(point: Coordinate, elements: &[Candidate]) -> Option<(f64, &Candidate)> {
    elements
        .iter()
        .filter_map(|element| Some((point.distance_m(&element.position()?), element)))
        .min_by(|a, b| a.0.total_cmp(&b.0))
}

#[derive(Clone)]
pub struct AccessibilityLookup {
    spatial: Arc<dyn SpatialIndex>,
    caches: Arc<SignalCaches>,
    rules: Arc<SearchRules>,
}

impl AccessibilityLookup {
    pub fn new(
        spatial: Arc<dyn SpatialIndex>,
        caches: Arc<SignalCaches>,
        rules: Arc<SearchRules>,
    ) -> Self {
        Self {
            spatial,
            caches,
            rules,
        }
    }

    /// Accessibility record for `point`; lookup failures give a neutral default.
    pub async fn check(&self, point: Coordinate) -> CarAccessibility {
        let key = CoordKey::new(point, SignalCaches::CAR_ACCESS_DECIMALS);
        if let Some(cached) = self.caches.car_access.get(&key) {
            return cached;
        }

        let result = match self.lookup(point).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("Error checking car accessibility at {}: {}", point, err);
                CarAccessibility::unknown(format!("accessibility lookup failed: {err}"))
            }
        };
        self.caches.car_access.put(key, result.clone());
        result
    }

    async fn lookup(&self, point: Coordinate) -> Result<CarAccessibility, ProviderError> {
        let roads = self
            .spatial
            .query(&SpatialQuery {
                purpose: QueryPurpose::Roads,
                area: SearchArea::Around {
                    center: point,
                    radius_m: self.rules.road_search_radius_m,
                },
                clauses: vec![TagClause::way_any("highway")],
                timeout_s: ROAD_TIMEOUT_S,
            })
            .await?;

        let Some((distance_m, road)) = nearest(point, &roads) else {
            return Ok(car_accessibility(None, None));
        };
        let road = RoadSample {
            distance_m,
            highway: road.tags.get("highway").unwrap_or("unknown").to_string(),
            surface: road.tags.non_empty("surface").map(str::to_string),
        };

        let parking_m = self.nearest_parking(point).await;
        Ok(car_accessibility(Some(&road), parking_m))
    }

    async fn nearest_parking(&self, point: Coordinate) -> Option<f64> {
        let query = SpatialQuery {
            purpose: QueryPurpose::Parking,
            area: SearchArea::Around {
                center: point,
                radius_m: self.rules.parking_search_radius_m,
            },
            clauses: vec![
                TagClause::node("amenity", "parking"),
                TagClause::way("amenity", "parking"),
            ],
            timeout_s: PARKING_TIMEOUT_S,
        };
        match self.spatial.query(&query).await {
            Ok(lots) => nearest(point, &lots).map(|(d, _)| d),
            Err(err) => {
                tracing::debug!("Parking lookup failed at {}: {}", point, err);
                None
            }
        }
    }
}

//! Airport and military no-fly zones around an area.

use spots_core::{Coordinate, NoFlyZoneSet, SearchRules};
use std::sync::Arc;

use crate::cache::{AreaKey, SignalCaches};
use crate::error::SearchError;
use crate::providers::{
    ElementKind, QueryPurpose, SearchArea, SpatialIndex, SpatialQuery, TagClause,
};

const ELEMENTS: [ElementKind; 3] = [ElementKind::Node, ElementKind::Way, ElementKind::Relation];

fn airport_clauses() -> Vec<TagClause> {
    ELEMENTS
        .iter()
        .flat_map(|element| {
            [
                TagClause::new(*element, "aeroway", Some("aerodrome")),
                TagClause::new(*element, "aeroway", Some("airport")),
            ]
        })
        .collect()
}

fn military_clauses() -> Vec<TagClause> {
    ELEMENTS
        .iter()
        .flat_map(|element| {
            [
                TagClause::new(*element, "military", None),
                TagClause::new(*element, "landuse", Some("military")),
            ]
        })
        .collect()
}

#[derive(Clone)]
pub struct NoFlyLookup {
    spatial: Arc<dyn SpatialIndex>,
    caches: Arc<SignalCaches>,
    rules: Arc<SearchRules>,
    timeout_s: u64,
}

impl NoFlyLookup {
    pub fn new(
        spatial: Arc<dyn SpatialIndex>,
        caches: Arc<SignalCaches>,
        rules: Arc<SearchRules>,
        timeout_s: u64,
    ) -> Self {
        Self {
            spatial,
            caches,
            rules,
            timeout_s,
        }
    }

    /// Every zone within `radius_km` of `center`, served from cache when possible.
    pub async fn zones_for_area(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<NoFlyZoneSet, SearchError> {
        let key = AreaKey::new(center, radius_km);
        if let Some(zones) = self.caches.no_fly.get(&key) {
            tracing::debug!("No-fly cache hit for {} ({}km)", center, radius_km);
            return Ok(zones);
        }

        let area = SearchArea::Around {
            center,
            radius_m: (radius_km * 1000.0).trunc(),
        };
        let airports_query = SpatialQuery {
            purpose: QueryPurpose::Airports,
            area: area.clone(),
            clauses: airport_clauses(),
            timeout_s: self.timeout_s,
        };
        let military_query = SpatialQuery {
            purpose: QueryPurpose::MilitaryAreas,
            area,
            clauses: military_clauses(),
            timeout_s: self.timeout_s,
        };

        let (airports, military) = tokio::try_join!(
            self.spatial.query(&airports_query),
            self.spatial.query(&military_query)
        )
        .map_err(|err| SearchError::unavailable("Overpass", err))?;

        let zones = NoFlyZoneSet::from_elements(&airports, &military, &self.rules);
        tracing::info!(
            "Found {} airports and {} military areas around {}",
            zones.airports.len(),
            zones.military_areas.len(),
            center
        );
        self.caches.no_fly.put(key, zones.clone());
        Ok(zones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{node, FakeSpatialIndex};

    fn lookup(spatial: FakeSpatialIndex) -> (NoFlyLookup, Arc<FakeSpatialIndex>) {
        let spatial = Arc::new(spatial);
        let lookup = NoFlyLookup::new(
            spatial.clone(),
            Arc::new(SignalCaches::default()),
            Arc::new(SearchRules::default()),
            25,
        );
        (lookup, spatial)
    }

    #[tokio::test]
    async fn zones_are_fetched_once_per_area() {
        let spatial = FakeSpatialIndex::default()
            .with(
                QueryPurpose::Airports,
                vec![node(1, 2.7456, 101.7099, &[("aeroway", "aerodrome"), ("name", "KLIA")])],
            )
            .with(
                QueryPurpose::MilitaryAreas,
                vec![node(2, 3.05, 101.55, &[("landuse", "military")])],
            );
        let (lookup, spatial) = lookup(spatial);
        let center = Coordinate::new(3.0, 101.6);

        let zones = lookup.zones_for_area(center, 50.0).await.expect("zones");
        assert_eq!(zones.airports[0].name, "KLIA");
        assert_eq!(zones.military_areas[0].name, "Military Area");

        // Same 2dp cell and integer radius.
        let again = lookup
            .zones_for_area(Coordinate::new(3.001, 101.6004), 50.4)
            .await
            .expect("zones");
        assert_eq!(again, zones);
        assert_eq!(spatial.count(QueryPurpose::Airports), 1);
        assert_eq!(spatial.count(QueryPurpose::MilitaryAreas), 1);
    }

    #[tokio::test]
    async fn either_query_failing_is_unavailable() {
        let (lookup, _) = lookup(FakeSpatialIndex::default().failing(QueryPurpose::MilitaryAreas));
        let err = lookup
            .zones_for_area(Coordinate::new(3.0, 101.6), 50.0)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::ExternalServiceUnavailable { .. }));
    }

    #[test]
    fn clauses_cover_all_element_kinds() {
        assert_eq!(airport_clauses().len(), 6);
        assert!(military_clauses().contains(&TagClause::relation_any("military")));
    }
}

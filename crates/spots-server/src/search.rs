//! Candidate discovery around a resolved point.

use spots_core::{
    classify, is_inappropriate, qualifies_unnamed, relevance_score, Candidate, Category,
    Coordinate, RegionProfile, SearchRules,
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::CoordKey;
use crate::error::SearchError;
use crate::providers::{QueryPurpose, SearchArea, SpatialIndex, SpatialQuery, TagClause};

const DEDUP_DECIMALS: i32 = 4;
const FALLBACK_TIMEOUT_S: u64 = 30;

/// A filtered candidate with its pre-filter score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub category: Category,
    pub relevance: f64,
}

fn category_clauses(category: Category) -> Vec<TagClause> {
    match category {
        Category::OpenField => vec![
            TagClause::node("leisure", "park"),
            TagClause::node("leisure", "recreation_ground"),
            TagClause::node("leisure", "sports_centre"),
            TagClause::node("leisure", "stadium"),
            TagClause::node("leisure", "pitch"),
            TagClause::node("leisure", "playground"),
            TagClause::way("leisure", "park"),
            TagClause::way("leisure", "recreation_ground"),
            TagClause::way("leisure", "sports_centre"),
            TagClause::way("leisure", "stadium"),
            TagClause::way("landuse", "meadow"),
            TagClause::way("landuse", "grass"),
            TagClause::way("natural", "grassland"),
        ],
        Category::Beach => vec![
            TagClause::node("natural", "beach"),
            TagClause::node("leisure", "beach_resort"),
            TagClause::way("natural", "beach"),
            TagClause::way("natural", "coastline"),
            TagClause::node("tourism", "beach"),
        ],
        Category::HillMountain => vec![
            TagClause::node("natural", "peak"),
            TagClause::node("tourism", "viewpoint"),
            TagClause::way("natural", "peak"),
            TagClause::way("natural", "ridge"),
            TagClause::node("natural", "volcano"),
            TagClause::node("attraction", "viewpoint"),
        ],
        Category::ScenicTown => vec![
            TagClause::node("tourism", "attraction"),
            TagClause::node_any("historic"),
            TagClause::way("tourism", "attraction"),
            TagClause::way_any("historic"),
            TagClause::node("historic", "monument"),
            TagClause::node("historic", "memorial"),
            TagClause::node("tourism", "museum"),
            TagClause::node("tourism", "gallery"),
        ],
    }
}

/// Union of tag clauses for the selected categories (all when `None`).
pub fn candidate_clauses(categories: Option<&[Category]>, low_coverage: bool) -> Vec<TagClause> {
    let selected = categories.filter(|c| !c.is_empty()).unwrap_or(&Category::ALL);
    let mut clauses: Vec<TagClause> = Category::ALL
        .iter()
        .filter(|category| selected.contains(category))
        .flat_map(|category| category_clauses(*category))
        .collect();

    clauses.extend([
        TagClause::node("landuse", "recreation_ground"),
        TagClause::way("landuse", "recreation_ground"),
        TagClause::node("amenity", "parking"),
    ]);

    if low_coverage {
        clauses.extend([
            TagClause::node_any("natural"),
            TagClause::way_any("natural"),
            TagClause::node_any("tourism"),
            TagClause::way_any("tourism"),
            TagClause::node_any("leisure"),
            TagClause::way_any("leisure"),
            TagClause::way_any("landuse"),
            TagClause::node_any("name"),
            TagClause::way_any("name"),
        ]);
    }
    clauses
}

fn fallback_clauses() -> Vec<TagClause> {
    vec![
        TagClause::node_any("name"),
        TagClause::way_any("name"),
        TagClause::node_any("tourism"),
        TagClause::way_any("tourism"),
    ]
}

#[derive(Clone)]
pub struct CandidateSearch {
    spatial: Arc<dyn SpatialIndex>,
    profile: Arc<RegionProfile>,
    rules: Arc<SearchRules>,
    timeout_s: u64,
}

impl CandidateSearch {
    pub fn new(
        spatial: Arc<dyn SpatialIndex>,
        profile: Arc<RegionProfile>,
        rules: Arc<SearchRules>,
        timeout_s: u64,
    ) -> Self {
        Self {
            spatial,
            profile,
            rules,
            timeout_s,
        }
    }

    /// Widen the requested radius for sparse areas and whole-region queries.
    pub fn adjust_radius(&self, center: Coordinate, radius_km: f64, region_query: bool) -> f64 {
        let mut radius_km = radius_km;
        if self.profile.in_low_coverage(center) && radius_km < self.rules.low_coverage_min_radius_km {
            radius_km = self.rules.low_coverage_min_radius_km;
            tracing::info!("Low-coverage area - using minimum radius of {}km", radius_km);
        }
        if region_query && radius_km < self.rules.region_query_min_radius_km {
            radius_km = self.rules.region_query_min_radius_km;
            tracing::info!("Region-level query - using minimum radius of {}km", radius_km);
        }
        radius_km
    }

    /// Find, filter and score candidates, best first.
    pub async fn find(
        &self,
        center: Coordinate,
        radius_km: f64,
        categories: Option<&[Category]>,
    ) -> Result<Vec<ScoredCandidate>, SearchError> {
        let low_coverage = self.profile.in_low_coverage(center);
        let radius_m = if low_coverage {
            radius_km * self.rules.low_coverage_radius_factor * 1000.0
        } else {
            radius_km * 1000.0
        };

        let primary = SpatialQuery {
            purpose: QueryPurpose::Candidates,
            area: SearchArea::Around { center, radius_m },
            clauses: candidate_clauses(categories, low_coverage),
            timeout_s: self.timeout_s,
        };
        let raw = self
            .spatial
            .query(&primary)
            .await
            .map_err(|err| SearchError::unavailable("Overpass", err))?;
        let raw_count = raw.len();

        let mut seen = HashSet::new();
        let mut kept = self.filter(raw, low_coverage, &mut seen);

        if low_coverage && kept.len() < self.rules.low_coverage_min_candidates {
            tracing::info!(
                "Only {} candidates in low-coverage area, trying broader fallback search",
                kept.len()
            );
            let fallback = SpatialQuery {
                purpose: QueryPurpose::CandidateFallback,
                area: SearchArea::Around {
                    center,
                    radius_m: radius_m * self.rules.low_coverage_radius_factor,
                },
                clauses: fallback_clauses(),
                timeout_s: FALLBACK_TIMEOUT_S,
            };
            match self.spatial.query(&fallback).await {
                Ok(extra) => {
                    tracing::info!("Fallback search found {} additional elements", extra.len());
                    kept.extend(self.filter(extra, low_coverage, &mut seen));
                }
                Err(err) => tracing::warn!("Fallback candidate search failed: {}", err),
            }
        }

        let threshold = self.rules.relevance_threshold_for(low_coverage);
        let mut scored: Vec<ScoredCandidate> = kept
            .into_iter()
            .map(|candidate| ScoredCandidate {
                relevance: relevance_score(&candidate, center, &self.profile, &self.rules),
                category: classify(&candidate),
                candidate,
            })
            .filter(|scored| scored.relevance >= threshold)
            .collect();
        scored.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

        if scored.is_empty() {
            tracing::warn!(
                "No places found around {} within {}km ({} raw elements)",
                center,
                radius_km,
                raw_count
            );
        } else {
            tracing::debug!(
                "{} of {} raw elements kept around {}",
                scored.len(),
                raw_count,
                center
            );
        }
        Ok(scored)
    }

    /// Dedup, region, name and suitability filters, in that order.
    fn filter(
        &self,
        elements: Vec<Candidate>,
        low_coverage: bool,
        seen: &mut HashSet<CoordKey>,
    ) -> Vec<Candidate> {
        elements
            .into_iter()
            .filter(|candidate| {
                candidate
                    .position()
                    .is_some_and(|p| seen.insert(CoordKey::new(p, DEDUP_DECIMALS)))
            })
            .filter(|candidate| {
                candidate
                    .position()
                    .is_some_and(|p| self.profile.in_operational_region(p))
            })
            .filter(|candidate| {
                candidate.name().is_some() || qualifies_unnamed(&candidate.tags, low_coverage)
            })
            .filter(|candidate| !is_inappropriate(&candidate.tags))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{node, FakeSpatialIndex};
    use crate::providers::ElementKind;

    const KL: Coordinate = Coordinate::new(3.139, 101.6869);
    const KOTA_KINABALU: Coordinate = Coordinate::new(5.9804, 116.0735);

    fn search(spatial: FakeSpatialIndex) -> (CandidateSearch, Arc<FakeSpatialIndex>) {
        let spatial = Arc::new(spatial);
        let search = CandidateSearch::new(
            spatial.clone(),
            Arc::new(RegionProfile::embedded().expect("profile")),
            Arc::new(SearchRules::default()),
            25,
        );
        (search, spatial)
    }

    #[test]
    fn category_filter_shapes_the_union() {
        let beach_only = candidate_clauses(Some(&[Category::Beach]), false);
        assert!(beach_only.contains(&TagClause::node("natural", "beach")));
        assert!(!beach_only.contains(&TagClause::node("leisure", "park")));
        assert!(beach_only.contains(&TagClause::node("amenity", "parking")));

        let everything = candidate_clauses(None, false);
        assert!(everything.len() > beach_only.len());
        assert!(!everything.contains(&TagClause::new(ElementKind::Node, "name", None)));

        let sparse = candidate_clauses(None, true);
        assert!(sparse.contains(&TagClause::way_any("name")));
    }

    #[test]
    fn radius_floors_apply() {
        let (search, _) = search(FakeSpatialIndex::default());
        assert_eq!(search.adjust_radius(KL, 10.0, false), 10.0);
        assert_eq!(search.adjust_radius(KOTA_KINABALU, 10.0, false), 15.0);
        assert_eq!(search.adjust_radius(KL, 10.0, true), 50.0);
        assert_eq!(search.adjust_radius(KL, 80.0, true), 80.0);
    }

    #[tokio::test]
    async fn filters_apply_in_order() {
        let spatial = FakeSpatialIndex::default().with(
            QueryPurpose::Candidates,
            vec![
                node(1, 3.1400, 101.6870, &[("name", "Taman Tasik Perdana"), ("leisure", "park")]),
                node(2, 3.14001, 101.68701, &[("name", "Duplicate Park"), ("leisure", "park")]),
                node(3, 3.1500, 101.7000, &[("name", "Acme Sdn Bhd"), ("office", "company")]),
                node(4, 3.1600, 101.7100, &[("amenity", "bench")]),
                node(5, 3.1700, 101.7200, &[("natural", "peak")]),
                node(6, 13.75, 100.50, &[("name", "Lumphini Park"), ("leisure", "park")]),
            ],
        );
        let (search, spatial) = search(spatial);
        let found = search.find(KL, 10.0, None).await.expect("find");

        let ids: Vec<i64> = found.iter().map(|s| s.candidate.id).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], 1);
        assert!(ids.contains(&5));
        assert_eq!(found[0].category, Category::OpenField);
        assert_eq!(spatial.count(QueryPurpose::CandidateFallback), 0);
    }

    #[tokio::test]
    async fn english_only_names_count_as_names() {
        let spatial = FakeSpatialIndex::default().with(
            QueryPurpose::Candidates,
            vec![
                node(1, 3.1400, 101.6870, &[("name:en", "Acme Technologies Sdn Bhd"), ("leisure", "park")]),
                node(2, 3.1500, 101.6900, &[("name:en", "Titiwangsa Car Park"), ("amenity", "parking")]),
            ],
        );
        let (search, _) = search(spatial);
        let found = search.find(KL, 10.0, None).await.expect("find");

        let ids: Vec<i64> = found.iter().map(|s| s.candidate.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn sparse_area_widens_and_falls_back() {
        let spatial = FakeSpatialIndex::default()
            .with(
                QueryPurpose::Candidates,
                vec![node(1, 5.98, 116.07, &[("name", "Tanjung Aru Beach"), ("natural", "beach")])],
            )
            .with(
                QueryPurpose::CandidateFallback,
                vec![
                    node(1, 5.98, 116.07, &[("name", "Tanjung Aru Beach")]),
                    node(2, 6.00, 116.10, &[("name", "Signal Hill"), ("tourism", "viewpoint")]),
                ],
            );
        let (search, spatial) = search(spatial);
        let found = search.find(KOTA_KINABALU, 15.0, None).await.expect("find");
        assert_eq!(found.len(), 2);

        let primary = spatial.last(QueryPurpose::Candidates).expect("primary");
        assert_eq!(
            primary.area,
            SearchArea::Around {
                center: KOTA_KINABALU,
                radius_m: 22_500.0
            }
        );
        let fallback = spatial.last(QueryPurpose::CandidateFallback).expect("fallback");
        assert_eq!(fallback.timeout_s, FALLBACK_TIMEOUT_S);
    }

    #[tokio::test]
    async fn fallback_failure_is_not_fatal() {
        let spatial = FakeSpatialIndex::default().failing(QueryPurpose::CandidateFallback);
        let (search, _) = search(spatial);
        let found = search.find(KOTA_KINABALU, 15.0, None).await.expect("find");
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn primary_failure_is_surfaced() {
        let spatial = FakeSpatialIndex::default().failing(QueryPurpose::Candidates);
        let (search, _) = search(spatial);
        let err = search.find(KL, 10.0, None).await.unwrap_err();
        assert!(matches!(err, SearchError::ExternalServiceUnavailable { .. }));
    }
}

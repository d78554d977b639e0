//! Turns a free-form location query into one coordinate pair.

use spots_core::{normalize_postal_code, Candidate, Coordinate, RegionProfile, SpotQuery};
use std::sync::Arc;

use crate::error::SearchError;
use crate::providers::{
    ElementKind, GeocodeMatch, Geocoder, QueryPurpose, SearchArea, SpatialIndex, SpatialQuery,
    TagClause,
};

const NAME_SUFFIXES: [&str; 4] = [" Archaeological Museum", " Museum", " Archaeological Site", " Site"];
const GOOD_MATCH_SCORE: u32 = 20;
const MULTI_RESULT_LIMIT: usize = 5;
const NAME_SEARCH_TIMEOUT_S: u64 = 25;
const NAME_MATCH_THRESHOLD: u32 = 50;

/// Where a query resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub point: Coordinate,
    /// `false` only when the best geocoder match lies outside the operational region.
    pub in_region: bool,
}

impl Resolution {
    fn inside(point: Coordinate) -> Self {
        Self {
            point,
            in_region: true,
        }
    }
}

#[derive(Clone)]
pub struct QueryResolver {
    geocoder: Arc<dyn Geocoder>,
    spatial: Arc<dyn SpatialIndex>,
    profile: Arc<RegionProfile>,
}

/// Borrowed text fields of a query, trimmed and with empties removed.
#[derive(Clone, Copy)]
struct Locator<'a> {
    address: Option<&'a str>,
    region: Option<&'a str>,
    district: Option<&'a str>,
    postal: Option<&'a str>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn join(parts: &[Option<&str>]) -> String {
    parts.iter().flatten().copied().collect::<Vec<_>>().join(", ")
}

impl QueryResolver {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        spatial: Arc<dyn SpatialIndex>,
        profile: Arc<RegionProfile>,
    ) -> Self {
        Self {
            geocoder,
            spatial,
            profile,
        }
    }

    pub async fn resolve(&self, query: &SpotQuery) -> Result<Resolution, SearchError> {
        if let Some(point) = query.coordinates() {
            return Ok(Resolution {
                point,
                in_region: self.profile.in_operational_region(point),
            });
        }

        let mut locator = Locator {
            address: present(&query.address),
            region: present(&query.state),
            district: present(&query.district),
            postal: present(&query.postal_code),
        };
        if locator.address.is_none()
            && locator.region.is_none()
            && locator.district.is_none()
            && locator.postal.is_none()
        {
            return Err(SearchError::InvalidRequest(
                "Must provide coordinates, address, state, district, or postal code".to_string(),
            ));
        }

        let mut postal_region = None;
        if let Some(raw) = locator.postal {
            match normalize_postal_code(raw) {
                Some(code) => {
                    postal_region = self.profile.postal_region(&code).map(str::to_string);
                    if let Some(point) = self.geocode_postal(&code, postal_region.as_deref()).await {
                        return Ok(Resolution::inside(point));
                    }
                }
                None => tracing::warn!("Invalid postal code format: {} (expected 5 digits)", raw),
            }
        }
        if locator.region.is_none() {
            locator.region = postal_region.as_deref();
        }

        if let Some(point) = self.known_place(&locator) {
            return Ok(Resolution::inside(point));
        }

        let variants = self.variants(&locator);
        if let Some(resolution) = self.geocode_variants(&variants, &locator).await {
            return Ok(resolution);
        }

        if let Some(address) = locator.address {
            if let Some(point) = self.name_search(address).await {
                return Ok(Resolution::inside(point));
            }
        }

        Err(SearchError::LocationNotFound {
            query: join(&[locator.address, locator.district, locator.region, locator.postal]),
            attempts: variants.len().max(1),
        })
    }

    async fn geocode_postal(&self, code: &str, region: Option<&str>) -> Option<Coordinate> {
        let country = self.profile.country.as_str();
        let query = join(&[Some(code), region, Some(country)]);
        match self.geocoder.geocode(&query, 1).await {
            Ok(hits) => {
                let hit = hits.into_iter().next()?;
                if self.profile.in_operational_region(hit.position) {
                    tracing::info!("Postal code {} resolved to {}", code, hit.position);
                    Some(hit.position)
                } else {
                    tracing::warn!(
                        "Postal code {} geocoded outside {}: {}",
                        code,
                        country,
                        hit.display_name
                    );
                    None
                }
            }
            Err(err) => {
                tracing::warn!("Postal code geocoding failed: {}", err);
                None
            }
        }
    }

    fn known_place(&self, locator: &Locator<'_>) -> Option<Coordinate> {
        let name = locator.address.or(locator.region)?;
        let point = self.profile.known_place(name)?;
        tracing::info!("Found known location for '{}': {}", name, point);
        Some(point)
    }

    /// Geocoder query strings in priority order, de-duplicated.
    fn variants(&self, locator: &Locator<'_>) -> Vec<String> {
        let country = Some(self.profile.country.as_str());
        let Locator {
            address,
            region,
            district,
            postal,
        } = *locator;
        let mut variants = Vec::new();

        if address.is_some() {
            variants.push(join(&[address, country]));
        }
        if region.is_some() || district.is_some() {
            variants.push(join(&[address, district, region, country]));
        }
        variants.push(join(&[address, district, region, postal, country]));
        variants.push(join(&[address, district, region, postal]));
        if let Some(address) = address {
            variants.push(address.to_string());

            if let Some(simplified) = NAME_SUFFIXES
                .iter()
                .find_map(|suffix| address.strip_suffix(suffix))
                .map(str::trim)
                .filter(|s| !s.is_empty())
            {
                variants.push(join(&[Some(simplified), country]));
                if region.is_some() {
                    variants.push(join(&[Some(simplified), region, country]));
                }
            }

            if region.is_some() || district.is_some() {
                let first = address.split(',').next().unwrap_or(address).trim();
                if region.is_some() {
                    variants.push(join(&[Some(first), region, country]));
                }
                if district.is_some() {
                    variants.push(join(&[Some(first), district, country]));
                }
            }
        }

        let mut seen = std::collections::HashSet::new();
        variants.retain(|v| !v.is_empty() && seen.insert(v.clone()));
        variants
    }

    fn match_score(&self, hit: &GeocodeMatch, variant: &str, locator: &Locator<'_>) -> u32 {
        let found = hit.display_name.to_lowercase();
        let mentions = |text: Option<&str>| text.is_some_and(|t| found.contains(&t.to_lowercase()));

        let mut score = 0;
        if mentions(Some(self.profile.country.as_str())) {
            score += 10;
        }
        if mentions(locator.region) {
            score += 15;
        }
        if mentions(locator.district) {
            score += 10;
        }
        if mentions(locator.address) {
            score += 20;
        }
        if mentions(Some(variant)) {
            score += 5;
        }
        score
    }

    async fn collect_matches(
        &self,
        variants: &[String],
        locator: &Locator<'_>,
        limit: usize,
        pool: &mut Vec<(u32, GeocodeMatch)>,
    ) {
        for variant in variants {
            match self.geocoder.geocode(variant, limit).await {
                Ok(hits) => {
                    for hit in hits.into_iter().take(limit) {
                        let score = self.match_score(&hit, variant, locator);
                        pool.push((score, hit));
                    }
                }
                Err(err) => tracing::debug!("Geocoding '{}' failed: {}", variant, err),
            }
        }
    }

    async fn geocode_variants(
        &self,
        variants: &[String],
        locator: &Locator<'_>,
    ) -> Option<Resolution> {
        let mut pool = Vec::new();
        self.collect_matches(variants, locator, 1, &mut pool).await;

        let best = pool.iter().map(|(score, _)| *score).max().unwrap_or(0);
        if best < GOOD_MATCH_SCORE {
            self.collect_matches(variants, locator, MULTI_RESULT_LIMIT, &mut pool)
                .await;
        }

        pool.sort_by(|a, b| b.0.cmp(&a.0));
        if let Some((_, hit)) = pool
            .iter()
            .find(|(_, hit)| self.profile.in_operational_region(hit.position))
        {
            return Some(Resolution::inside(hit.position));
        }

        let (_, top) = pool.first()?;
        tracing::warn!(
            "Best geocoding match is outside {}: {}",
            self.profile.country,
            top.display_name
        );
        Some(Resolution {
            point: top.position,
            in_region: false,
        })
    }

    async fn name_search(&self, address: &str) -> Option<Coordinate> {
        let clauses = [ElementKind::Node, ElementKind::Way, ElementKind::Relation]
            .into_iter()
            .flat_map(|element| {
                [
                    TagClause::new(element, "tourism", Some("museum")),
                    TagClause::new(element, "historic", None),
                ]
            })
            .collect();
        let query = SpatialQuery {
            purpose: QueryPurpose::NameSearch,
            area: SearchArea::Within(self.profile.name_search_bounds.clone()),
            clauses,
            timeout_s: NAME_SEARCH_TIMEOUT_S,
        };

        let elements = match self.spatial.query(&query).await {
            Ok(elements) => elements,
            Err(err) => {
                tracing::warn!("Name search for '{}' failed: {}", address, err);
                return None;
            }
        };

        let (point, name, score) = best_name_match(address, &elements)?;
        tracing::info!("Name search matched '{}' to '{}' (score {})", address, name, score);
        Some(point)
    }
}

/// How well a feature name matches the searched text; 0 when unrelated.
pub fn name_match_score(query: &str, name: &str) -> u32 {
    let query = query.trim().to_lowercase();
    let name = name.to_lowercase();
    if query == name {
        return 100;
    }
    if name.contains(&query) {
        return 80;
    }

    let words: Vec<&str> = query.split_whitespace().filter(|w| w.len() > 3).collect();
    let matched = words.iter().filter(|w| name.contains(*w)).count() as u32;
    if words.len() >= 2 {
        if matched >= 2 {
            60 + matched * 10
        } else {
            0
        }
    } else if matched > 0 {
        40 + matched * 10
    } else {
        0
    }
}

fn best_name_match<'a>(query: &str, elements: &'a [Candidate]) -> Option<(Coordinate, &'a str, u32)> {
    let mut best: Option<(Coordinate, &str, u32)> = None;
    for element in elements {
        let Some(name) = element.name() else {
            continue;
        };
        let score = name_match_score(query, name);
        if score < NAME_MATCH_THRESHOLD || best.is_some_and(|(_, _, s)| score <= s) {
            continue;
        }
        if let Some(point) = element.position() {
            best = Some((point, name, score));
        }
    }
    best
}

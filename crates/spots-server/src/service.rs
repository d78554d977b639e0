//! The spot-search pipeline: resolve, discover, enrich, rank.

use futures::future::join_all;
use spots_core::{
    analyze_path, path_samples, rank_spots, Coordinate, ElevationPathAnalysis, NoFlyZoneSet,
    QueryLocation, RegionProfile, SearchResponse, SearchRules, SpotQuery,
};
use std::sync::Arc;

use crate::cache::SignalCaches;
use crate::config::Config;
use crate::enrichment::Enricher;
use crate::error::SearchError;
use crate::nofly::NoFlyLookup;
use crate::providers::Providers;
use crate::resolver::QueryResolver;
use crate::search::CandidateSearch;

pub struct SpotSearch {
    profile: Arc<RegionProfile>,
    rules: Arc<SearchRules>,
    resolver: QueryResolver,
    candidates: CandidateSearch,
    no_fly: NoFlyLookup,
    enricher: Enricher,
}

impl SpotSearch {
    pub fn new(
        providers: Providers,
        profile: RegionProfile,
        rules: SearchRules,
        config: &Config,
    ) -> Self {
        let profile = Arc::new(profile);
        let rules = Arc::new(rules);
        let caches = Arc::new(SignalCaches::new(&config.cache_limits));
        let timeout_s = config.overpass_timeout_s;

        Self {
            resolver: QueryResolver::new(
                providers.geocoder.clone(),
                providers.spatial.clone(),
                profile.clone(),
            ),
            candidates: CandidateSearch::new(
                providers.spatial.clone(),
                profile.clone(),
                rules.clone(),
                timeout_s,
            ),
            no_fly: NoFlyLookup::new(
                providers.spatial.clone(),
                caches.clone(),
                rules.clone(),
                timeout_s,
            ),
            enricher: Enricher::new(
                providers,
                caches,
                rules.clone(),
                config.enrichment_limits(),
            ),
            profile,
            rules,
        }
    }

    pub fn profile(&self) -> &RegionProfile {
        &self.profile
    }

    pub async fn search(&self, query: &SpotQuery) -> Result<SearchResponse, SearchError> {
        let resolution = self.resolver.resolve(query).await?;
        let origin = resolution.point;
        if !resolution.in_region {
            return Err(SearchError::OutOfRegion {
                lat: origin.lat,
                lon: origin.lon,
                region: self.profile.country.clone(),
            });
        }

        let textual = query
            .address
            .as_deref()
            .or(query.state.as_deref())
            .unwrap_or_default();
        let region_query = self.profile.region_named(textual).is_some();
        let radius_km = self
            .candidates
            .adjust_radius(origin, query.radius_km, region_query);

        let mut found = self
            .candidates
            .find(origin, radius_km, query.spot_types.as_deref())
            .await?;
        found.truncate(query.max_results);

        let zones = self
            .no_fly
            .zones_for_area(origin, radius_km.max(self.rules.no_fly_min_radius_km))
            .await?;

        tracing::info!(
            "Enriching {} candidates around {} ({}km)",
            found.len(),
            origin,
            radius_km
        );
        let spots = self
            .enricher
            .enrich_all(found, origin, Arc::new(zones), query.car_accessible_only)
            .await;
        let spots = rank_spots(spots, &self.rules.ranking, query.max_results);

        Ok(SearchResponse {
            query_location: QueryLocation {
                latitude: origin.lat,
                longitude: origin.lon,
                address: Some(query.address.clone().unwrap_or_else(|| origin.to_string())),
                state: query.state.clone(),
                district: query.district.clone(),
                postal_code: query.postal_code.clone(),
            },
            total_spots_found: spots.len(),
            spots,
            search_radius_km: radius_km,
        })
    }

    pub async fn no_fly_zones(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<NoFlyZoneSet, SearchError> {
        self.no_fly.zones_for_area(center, radius_km).await
    }

    /// Terrain along a straight flight path, sampled through the elevation cache.
    pub async fn elevation_path(
        &self,
        start: Coordinate,
        end: Coordinate,
        flight_altitude_m: f64,
    ) -> ElevationPathAnalysis {
        let samples = path_samples(start, end);
        let elevations = join_all(samples.iter().map(|p| self.enricher.elevation_at(*p))).await;
        analyze_path(&samples, &elevations, flight_altitude_m)
    }
}

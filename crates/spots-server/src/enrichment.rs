//! Per-candidate signal gathering and scoring.
//!
//! Each candidate runs its lookups concurrently; candidates run as tasks
//! gated by a semaphore and report back over a channel until the batch
//! deadline.

use futures::future::join_all;
use spots_core::spatial::{ring_points, round_to};
use spots_core::{
    display_name, is_weather_safe, safe_area, safety_score, slope_summary, terrain_type,
    Coordinate, EnrichedSpot, NoFlyZoneSet, SafetyInputs, SearchRules, SlopeSummary,
    WeatherReport, WeatherSnapshot,
};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};

use crate::accessibility::AccessibilityLookup;
use crate::cache::{CoordKey, RouteKey, SignalCaches};
use crate::config::EnrichmentLimits;
use crate::providers::Providers;
use crate::search::ScoredCandidate;

#[derive(Clone)]
pub struct Enricher {
    providers: Providers,
    caches: Arc<SignalCaches>,
    rules: Arc<SearchRules>,
    access: AccessibilityLookup,
    limits: EnrichmentLimits,
}

impl Enricher {
    pub fn new(
        providers: Providers,
        caches: Arc<SignalCaches>,
        rules: Arc<SearchRules>,
        limits: EnrichmentLimits,
    ) -> Self {
        let access =
            AccessibilityLookup::new(providers.spatial.clone(), caches.clone(), rules.clone());
        Self {
            providers,
            caches,
            rules,
            access,
            limits,
        }
    }

    /// Terrain height, cached at 3 decimals. Only successful lookups are cached.
    pub async fn elevation_at(&self, point: Coordinate) -> Option<f64> {
        let key = CoordKey::new(point, SignalCaches::ELEVATION_DECIMALS);
        if let Some(elevation) = self.caches.elevation.get(&key) {
            return Some(elevation);
        }
        match self.providers.elevation.elevation(point).await {
            Ok(elevation) => {
                self.caches.elevation.put(key, elevation);
                Some(elevation)
            }
            Err(err) => {
                tracing::debug!("Elevation lookup failed at {}: {}", point, err);
                None
            }
        }
    }

    pub async fn weather_at(&self, point: Coordinate) -> Option<WeatherSnapshot> {
        let key = CoordKey::new(point, SignalCaches::WEATHER_DECIMALS);
        if let Some(weather) = self.caches.weather.get(&key) {
            return Some(weather);
        }
        match self.providers.weather.current(point).await {
            Ok(weather) => {
                self.caches.weather.put(key, weather.clone());
                Some(weather)
            }
            Err(err) => {
                tracing::debug!("Weather lookup failed at {}: {}", point, err);
                None
            }
        }
    }

    /// Driving distance when routing is available, geodesic otherwise.
    pub async fn road_distance_km(&self, from: Coordinate, to: Coordinate) -> f64 {
        let fallback = from.distance_km(&to);
        let Some(routing) = self.providers.routing.as_ref() else {
            return fallback;
        };

        let key = RouteKey::new(from, to);
        if let Some(distance_km) = self.caches.road_distance.get(&key) {
            return distance_km;
        }
        match routing.road_distance_m(from, to).await {
            Ok(distance_m) => {
                let distance_km = distance_m / 1000.0;
                self.caches.road_distance.put(key, distance_km);
                self.caches.road_distance.put(key.reversed(), distance_km);
                distance_km
            }
            Err(err) => {
                tracing::debug!("Routing failed {} -> {}: {}", from, to, err);
                fallback
            }
        }
    }

    pub async fn slope_at(&self, center: Coordinate) -> SlopeSummary {
        let radius_m = self.rules.slope_radius_m;
        let ring = ring_points(center, radius_m, self.rules.slope_samples);
        let (center_m, ring_m) = tokio::join!(
            self.elevation_at(center),
            join_all(ring.into_iter().map(|point| self.elevation_at(point)))
        );
        slope_summary(center_m, &ring_m, radius_m, &self.rules)
    }

    async fn address_at(&self, point: Coordinate) -> String {
        match self.providers.geocoder.reverse(point).await {
            Ok(address) => address,
            Err(err) => {
                tracing::debug!("Reverse geocoding failed at {}: {}", point, err);
                point.to_string()
            }
        }
    }

    /// Enrich one candidate; `None` when it has no position or is filtered out.
    pub async fn enrich_one(
        &self,
        scored: &ScoredCandidate,
        origin: Coordinate,
        zones: &NoFlyZoneSet,
        car_accessible_only: bool,
    ) -> Option<EnrichedSpot> {
        let point = scored.candidate.position()?;

        let (distance_km, elevation_m, weather, slope, access, address) = tokio::join!(
            self.road_distance_km(origin, point),
            self.elevation_at(point),
            self.weather_at(point),
            self.slope_at(point),
            self.access.check(point),
            self.address_at(point),
        );

        if car_accessible_only && !access.accessible {
            return None;
        }

        let nearby = zones.nearby(point);
        let safety = safety_score(
            &SafetyInputs {
                no_fly_zones_nearby: nearby.len(),
                elevation_m,
                max_slope_pct: slope.max_slope_pct,
                weather: weather.as_ref(),
            },
            &self.rules,
        );
        let category = scored.category;

        Some(EnrichedSpot {
            name: display_name(&scored.candidate.tags, Some(&address), Some(category)),
            latitude: point.lat,
            longitude: point.lon,
            address,
            spot_type: category,
            distance_km: round_to(distance_km, 2),
            car_accessible: access.accessible,
            car_accessibility: access,
            elevation_m: elevation_m.map(|e| round_to(e, 1)),
            terrain_type: terrain_type(elevation_m, category),
            slope,
            weather: weather.map(|conditions| weather_report(conditions, &self.rules)),
            safety_score: round_to(safety, 1),
            no_fly_zones_nearby: nearby,
            safe_area_polygon: safe_area(point, safety, &self.rules),
            description: format!("{} location suitable for drone flying", category.title()),
            google_maps_url: format!("https://www.google.com/maps?q={},{}", point.lat, point.lon),
            openstreetmap_url: format!(
                "https://www.openstreetmap.org/?mlat={}&mlon={}&zoom=15",
                point.lat, point.lon
            ),
        })
    }

    /// Enrich candidates concurrently, keeping input order.
    ///
    /// Candidates that time out are skipped; when the batch deadline passes,
    /// whatever has completed is returned and the rest are aborted.
    pub async fn enrich_all(
        &self,
        candidates: Vec<ScoredCandidate>,
        origin: Coordinate,
        zones: Arc<NoFlyZoneSet>,
        car_accessible_only: bool,
    ) -> Vec<EnrichedSpot> {
        let total = candidates.len();
        if total == 0 {
            return Vec::new();
        }
        let deadline = Instant::now() + self.limits.batch_timeout;
        let semaphore = Arc::new(Semaphore::new(self.limits.max_concurrent));
        let (tx, mut rx) = mpsc::channel(total);
        let mut tasks = JoinSet::new();

        for (index, scored) in candidates.into_iter().enumerate() {
            let enricher = self.clone();
            let semaphore = semaphore.clone();
            let zones = zones.clone();
            let tx = tx.clone();
            let budget = self.limits.candidate_timeout;

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let work = enricher.enrich_one(&scored, origin, &zones, car_accessible_only);
                match timeout(budget, work).await {
                    Ok(Some(spot)) => {
                        let _ = tx.send((index, spot)).await;
                    }
                    Ok(None) => {}
                    Err(_) => tracing::warn!(
                        "Timeout processing candidate {} ({})",
                        index,
                        scored.candidate.id
                    ),
                }
            });
        }
        drop(tx);

        let mut finished = Vec::with_capacity(total);
        loop {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some(done)) => finished.push(done),
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "Enrichment batch timed out with {} of {} candidates done",
                        finished.len(),
                        total
                    );
                    break;
                }
            }
        }
        tasks.abort_all();

        finished.sort_by_key(|(index, _)| *index);
        finished.into_iter().map(|(_, spot)| spot).collect()
    }
}

fn weather_report(conditions: WeatherSnapshot, rules: &SearchRules) -> WeatherReport {
    WeatherReport {
        is_safe: is_weather_safe(Some(&conditions), &rules.weather),
        description: conditions.summary(),
        conditions,
    }
}

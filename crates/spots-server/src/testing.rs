//! In-memory providers for unit and router tests.

use async_trait::async_trait;
use spots_core::{Candidate, Coordinate, Tags, WeatherSnapshot};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{CacheLimits, Config};
use crate::providers::{
    ElevationService, GeocodeMatch, Geocoder, ProviderError, Providers, QueryPurpose,
    RoutingService, SpatialIndex, SpatialQuery, WeatherService,
};

pub fn node(id: i64, lat: f64, lon: f64, tags: &[(&str, &str)]) -> Candidate {
    Candidate::node(id, lat, lon, tags.iter().copied().collect::<Tags>())
}

#[derive(Default)]
pub struct FakeGeocoder {
    hits: HashMap<String, Vec<GeocodeMatch>>,
    pub reverse_address: Option<String>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl FakeGeocoder {
    pub fn with_hit(mut self, query: &str, lat: f64, lon: f64, display_name: &str) -> Self {
        self.hits
            .entry(query.to_string())
            .or_default()
            .push(GeocodeMatch {
                position: Coordinate::new(lat, lon),
                display_name: display_name.to_string(),
            });
        self
    }

    pub fn queried(&self) -> Vec<(String, usize)> {
        self.queries.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, query: &str, limit: usize) -> Result<Vec<GeocodeMatch>, ProviderError> {
        self.queries
            .lock()
            .expect("lock")
            .push((query.to_string(), limit));
        Ok(self
            .hits
            .get(query)
            .map(|hits| hits.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn reverse(&self, _point: Coordinate) -> Result<String, ProviderError> {
        self.reverse_address.clone().ok_or(ProviderError::NoResult)
    }
}

#[derive(Default)]
pub struct FakeSpatialIndex {
    responses: HashMap<QueryPurpose, Vec<Candidate>>,
    failing: HashSet<QueryPurpose>,
    pub queries: Mutex<Vec<SpatialQuery>>,
}

impl FakeSpatialIndex {
    pub fn with(mut self, purpose: QueryPurpose, elements: Vec<Candidate>) -> Self {
        self.responses.insert(purpose, elements);
        self
    }

    pub fn failing(mut self, purpose: QueryPurpose) -> Self {
        self.failing.insert(purpose);
        self
    }

    pub fn count(&self, purpose: QueryPurpose) -> usize {
        self.queries
            .lock()
            .expect("lock")
            .iter()
            .filter(|q| q.purpose == purpose)
            .count()
    }

    pub fn last(&self, purpose: QueryPurpose) -> Option<SpatialQuery> {
        self.queries
            .lock()
            .expect("lock")
            .iter()
            .rev()
            .find(|q| q.purpose == purpose)
            .cloned()
    }
}

#[async_trait]
impl SpatialIndex for FakeSpatialIndex {
    async fn query(&self, query: &SpatialQuery) -> Result<Vec<Candidate>, ProviderError> {
        self.queries.lock().expect("lock").push(query.clone());
        if self.failing.contains(&query.purpose) {
            return Err(ProviderError::Status(504));
        }
        Ok(self
            .responses
            .get(&query.purpose)
            .cloned()
            .unwrap_or_default())
    }
}

type ElevationFn = Box<dyn Fn(Coordinate) -> Option<f64> + Send + Sync>;

pub struct FakeElevation {
    surface: ElevationFn,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl FakeElevation {
    pub fn flat(height_m: f64) -> Self {
        Self::from_fn(move |_| Some(height_m))
    }

    pub fn unavailable() -> Self {
        Self::from_fn(|_| None)
    }

    pub fn from_fn(surface: impl Fn(Coordinate) -> Option<f64> + Send + Sync + 'static) -> Self {
        Self {
            surface: Box::new(surface),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ElevationService for FakeElevation {
    async fn elevation(&self, point: Coordinate) -> Result<f64, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.surface)(point).ok_or(ProviderError::NoResult)
    }
}

pub struct FakeWeather {
    snapshot: Option<WeatherSnapshot>,
    pub calls: AtomicUsize,
}

impl FakeWeather {
    pub fn reporting(snapshot: WeatherSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            snapshot: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherService for FakeWeather {
    async fn current(&self, _point: Coordinate) -> Result<WeatherSnapshot, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .clone()
            .ok_or(ProviderError::NotConfigured("weather"))
    }
}

pub struct FakeRouting {
    /// Multiplier applied to the straight-line distance; `None` fails every call.
    detour_factor: Option<f64>,
    pub calls: AtomicUsize,
}

impl FakeRouting {
    pub fn detour(factor: f64) -> Self {
        Self {
            detour_factor: Some(factor),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn broken() -> Self {
        Self {
            detour_factor: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingService for FakeRouting {
    async fn road_distance_m(&self, from: Coordinate, to: Coordinate) -> Result<f64, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let factor = self.detour_factor.ok_or(ProviderError::Status(503))?;
        Ok(from.distance_m(&to) * factor)
    }
}

/// Handles to the fakes behind a `Providers` bundle.
pub struct FakeProviders {
    pub geocoder: Arc<FakeGeocoder>,
    pub spatial: Arc<FakeSpatialIndex>,
    pub elevation: Arc<FakeElevation>,
    pub weather: Arc<FakeWeather>,
    pub routing: Arc<FakeRouting>,
}

impl FakeProviders {
    pub fn new(geocoder: FakeGeocoder, spatial: FakeSpatialIndex) -> Self {
        Self {
            geocoder: Arc::new(geocoder),
            spatial: Arc::new(spatial),
            elevation: Arc::new(FakeElevation::flat(40.0)),
            weather: Arc::new(FakeWeather::reporting(WeatherSnapshot::calm())),
            routing: Arc::new(FakeRouting::detour(1.3)),
        }
    }

    pub fn with_elevation(mut self, elevation: FakeElevation) -> Self {
        self.elevation = Arc::new(elevation);
        self
    }

    pub fn with_weather(mut self, weather: FakeWeather) -> Self {
        self.weather = Arc::new(weather);
        self
    }

    pub fn with_routing(mut self, routing: FakeRouting) -> Self {
        self.routing = Arc::new(routing);
        self
    }

    pub fn providers(&self) -> Providers {
        Providers {
            geocoder: self.geocoder.clone(),
            spatial: self.spatial.clone(),
            elevation: self.elevation.clone(),
            weather: self.weather.clone(),
            routing: Some(self.routing.clone()),
        }
    }
}

/// Fixed configuration so tests never depend on the caller's environment.
pub fn test_config() -> Config {
    Config {
        server_port: 0,
        user_agent: "spots-server-tests".to_string(),
        http_timeout_s: 5,
        nominatim_url: "http://nominatim.invalid".to_string(),
        overpass_url: "http://overpass.invalid/api/interpreter".to_string(),
        overpass_timeout_s: 25,
        overpass_retries: 0,
        overpass_retry_backoff_ms: 0,
        elevation_url: "http://elevation.invalid/v1/elevation".to_string(),
        weather_url: "http://weather.invalid/data/2.5/weather".to_string(),
        weather_api_key: None,
        osrm_url: "http://osrm.invalid".to_string(),
        use_osrm: true,
        candidate_timeout_s: 30,
        batch_timeout_s: 60,
        max_concurrent_candidates: 10,
        cache_limits: CacheLimits::default(),
        region_profile_path: None,
        rules_path: None,
    }
}

//! External data providers behind async traits.
//!
//! - `nominatim`: forward and reverse geocoding
//! - `overpass`: spatial index of tagged map features
//! - `elevation`: terrain height (Open-Meteo)
//! - `weather`: current conditions (OpenWeatherMap)
//! - `osrm`: driving distance

pub mod elevation;
pub mod nominatim;
pub mod osrm;
pub mod overpass;
pub mod weather;

use async_trait::async_trait;
use spots_core::{BoundingBox, Candidate, Coordinate, WeatherSnapshot};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("no result")]
    NoResult,
}

/// One geocoder hit.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub position: Coordinate,
    pub display_name: String,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward lookup returning at most `limit` matches, best first.
    async fn geocode(&self, query: &str, limit: usize) -> Result<Vec<GeocodeMatch>, ProviderError>;

    async fn reverse(&self, point: Coordinate) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

/// A single tag filter, e.g. `node["leisure"="park"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagClause {
    pub element: ElementKind,
    pub key: String,
    /// Exact value to match; `None` matches any value.
    pub value: Option<String>,
}

impl TagClause {
    pub fn node(key: &str, value: &str) -> Self {
        Self::new(ElementKind::Node, key, Some(value))
    }

    pub fn way(key: &str, value: &str) -> Self {
        Self::new(ElementKind::Way, key, Some(value))
    }

    pub fn node_any(key: &str) -> Self {
        Self::new(ElementKind::Node, key, None)
    }

    pub fn way_any(key: &str) -> Self {
        Self::new(ElementKind::Way, key, None)
    }

    pub fn relation_any(key: &str) -> Self {
        Self::new(ElementKind::Relation, key, None)
    }

    pub fn new(element: ElementKind, key: &str, value: Option<&str>) -> Self {
        Self {
            element,
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchArea {
    Around { center: Coordinate, radius_m: f64 },
    Within(BoundingBox),
}

/// Why a spatial query is issued; used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryPurpose {
    Candidates,
    CandidateFallback,
    Airports,
    MilitaryAreas,
    Roads,
    Parking,
    NameSearch,
}

impl fmt::Display for QueryPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Candidates => "candidates",
            Self::CandidateFallback => "candidate fallback",
            Self::Airports => "airports",
            Self::MilitaryAreas => "military areas",
            Self::Roads => "roads",
            Self::Parking => "parking",
            Self::NameSearch => "name search",
        };
        f.write_str(label)
    }
}

/// A union of tag clauses evaluated over one area.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialQuery {
    pub purpose: QueryPurpose,
    pub area: SearchArea,
    pub clauses: Vec<TagClause>,
    pub timeout_s: u64,
}

#[async_trait]
pub trait SpatialIndex: Send + Sync {
    async fn query(&self, query: &SpatialQuery) -> Result<Vec<Candidate>, ProviderError>;
}

#[async_trait]
pub trait ElevationService: Send + Sync {
    /// Terrain height in meters.
    async fn elevation(&self, point: Coordinate) -> Result<f64, ProviderError>;
}

#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn current(&self, point: Coordinate) -> Result<WeatherSnapshot, ProviderError>;
}

#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Driving distance in meters.
    async fn road_distance_m(&self, from: Coordinate, to: Coordinate) -> Result<f64, ProviderError>;
}

/// Every outbound collaborator used by a search.
#[derive(Clone)]
pub struct Providers {
    pub geocoder: Arc<dyn Geocoder>,
    pub spatial: Arc<dyn SpatialIndex>,
    pub elevation: Arc<dyn ElevationService>,
    pub weather: Arc<dyn WeatherService>,
    /// `None` falls back to geodesic distance.
    pub routing: Option<Arc<dyn RoutingService>>,
}

impl Providers {
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(std::time::Duration::from_secs(config.http_timeout_s.max(1)))
            .pool_max_idle_per_host(20)
            .build()?;

        let routing: Option<Arc<dyn RoutingService>> = if config.use_osrm {
            Some(Arc::new(osrm::OsrmRouter::new(client.clone(), &config.osrm_url)))
        } else {
            None
        };

        Ok(Self {
            geocoder: Arc::new(nominatim::NominatimGeocoder::new(
                client.clone(),
                &config.nominatim_url,
            )),
            spatial: Arc::new(overpass::OverpassIndex::new(client.clone(), config)),
            elevation: Arc::new(elevation::OpenMeteoElevation::new(
                client.clone(),
                &config.elevation_url,
            )),
            weather: Arc::new(weather::OpenWeatherMap::new(
                client,
                &config.weather_url,
                config.weather_api_key.clone(),
            )),
            routing,
        })
    }
}

//! Core data models for drone spot discovery.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::spatial::haversine_distance;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        haversine_distance(self.lat, self.lon, other.lat, other.lon)
    }

    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        self.distance_m(other) / 1000.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// Key/value tags attached to a spatial-index element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Tag value, treating empty strings as absent.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }

    /// `name`, falling back to `name:en`.
    pub fn name(&self) -> Option<&str> {
        self.non_empty("name").or_else(|| self.non_empty("name:en"))
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    pub fn is_any(&self, key: &str, values: &[&str]) -> bool {
        self.get(key).is_some_and(|v| values.contains(&v))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Raw element returned by the spatial index, before enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Representative point for ways and relations.
    #[serde(default)]
    pub center: Option<Coordinate>,
    #[serde(default)]
    pub tags: Tags,
}

impl Candidate {
    pub fn node(id: i64, lat: f64, lon: f64, tags: Tags) -> Self {
        Self {
            id,
            lat: Some(lat),
            lon: Some(lon),
            center: None,
            tags,
        }
    }

    /// Point coordinates if present, else the area center.
    pub fn position(&self) -> Option<Coordinate> {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            return Some(Coordinate::new(lat, lon));
        }
        self.center
    }

    pub fn name(&self) -> Option<&str> {
        self.tags.name()
    }
}

/// Spot category used for both query shaping and classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    OpenField,
    Beach,
    HillMountain,
    ScenicTown,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::OpenField,
        Category::Beach,
        Category::HillMountain,
        Category::ScenicTown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenField => "open_field",
            Self::Beach => "beach",
            Self::HillMountain => "hill_mountain",
            Self::ScenicTown => "scenic_town",
        }
    }

    /// Human-readable title, e.g. "Hill Mountain".
    pub fn title(self) -> &'static str {
        match self {
            Self::OpenField => "Open Field",
            Self::Beach => "Beach",
            Self::HillMountain => "Hill Mountain",
            Self::ScenicTown => "Scenic Town",
        }
    }

    /// Label used as a display name when nothing better is known.
    pub fn fallback_label(self) -> &'static str {
        match self {
            Self::OpenField => "Open Field",
            Self::Beach => "Beach Area",
            Self::HillMountain => "Scenic Viewpoint",
            Self::ScenicTown => "Scenic Location",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::OpenField => "Open fields, parks, sports complexes - great for beginners",
            Self::Beach => "Coastal areas and beaches - expansive views and sunset potential",
            Self::HillMountain => {
                "Hilly and mountainous regions - excellent elevation and dramatic scenery"
            }
            Self::ScenicTown => "Scenic towns and heritage areas - unique urban/heritage shots",
        }
    }

    pub fn examples(self) -> &'static str {
        match self {
            Self::OpenField => "Local sports fields, large empty grounds, parks",
            Self::Beach => "Kuala Kedah beaches, coastal stretches",
            Self::HillMountain => "Gunung Jerai, hills around Kedah",
            Self::ScenicTown => "George Town, historical areas",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown spot type '{}' (expected one of: open_field, beach, hill_mountain, scenic_town)",
            self.0
        )
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| UnknownCategory(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainType {
    Flat,
    Hilly,
    Mountainous,
    Coastal,
}

/// Current conditions at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Wind speed in m/s
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    /// Temperature in Celsius
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    /// Visibility in meters
    pub visibility: f64,
    /// Condition group, e.g. "Rain" or "Clear"
    pub weather_main: Option<String>,
    pub weather_description: Option<String>,
    pub clouds: Option<f64>,
}

impl WeatherSnapshot {
    pub const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

    pub fn calm() -> Self {
        Self {
            wind_speed: Some(0.0),
            wind_direction: None,
            temperature: None,
            humidity: None,
            visibility: Self::DEFAULT_VISIBILITY_M,
            weather_main: Some("Clear".to_string()),
            weather_description: None,
            clouds: None,
        }
    }

    pub fn summary(&self) -> String {
        let wind = self
            .wind_speed
            .map(|w| w.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let temp = self
            .temperature
            .map(|t| t.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let main = self.weather_main.as_deref().unwrap_or("N/A");
        format!("Wind: {wind} m/s, Temp: {temp}°C, {main}")
    }
}

/// Weather attached to a result spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    #[serde(flatten)]
    pub conditions: WeatherSnapshot,
    pub is_safe: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlopeSummary {
    /// Steepest gradient in percent, rounded to 0.1
    pub max_slope_pct: Option<f64>,
    pub is_safe: bool,
    pub samples: usize,
}

impl SlopeSummary {
    pub fn unknown(samples: usize) -> Self {
        Self {
            max_slope_pct: None,
            is_safe: true,
            samples,
        }
    }
}

/// Nearest road as reported by the spatial index.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSample {
    pub distance_m: f64,
    pub highway: String,
    pub surface: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarAccessibility {
    pub accessible: bool,
    /// Score from 0 to 10
    pub score: f64,
    pub nearest_road_distance_m: Option<f64>,
    pub road_type: Option<String>,
    pub road_surface: Option<String>,
    pub parking_available: bool,
    pub parking_distance_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CarAccessibility {
    pub fn no_roads() -> Self {
        Self {
            accessible: false,
            score: 0.0,
            nearest_road_distance_m: None,
            road_type: None,
            road_surface: None,
            parking_available: false,
            parking_distance_m: None,
            reason: Some("No roads found within 1km".to_string()),
        }
    }

    /// Assumed accessibility when the lookup itself failed.
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            accessible: true,
            score: 5.0,
            nearest_road_distance_m: None,
            road_type: None,
            road_surface: None,
            parking_available: false,
            parking_distance_m: None,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Airport,
    Military,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoFlyZone {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
    #[serde(rename = "type")]
    pub kind: ZoneKind,
}

/// GeoJSON polygon describing the recommended flying area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeArea {
    #[serde(rename = "type")]
    pub kind: String,
    /// One closed ring of `[lon, lat]` pairs
    pub coordinates: Vec<Vec<[f64; 2]>>,
    pub radius_m: f64,
}

/// A candidate after enrichment and scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSpot {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub spot_type: Category,
    pub distance_km: f64,
    pub car_accessible: bool,
    pub car_accessibility: CarAccessibility,
    pub elevation_m: Option<f64>,
    pub terrain_type: TerrainType,
    pub slope: SlopeSummary,
    pub weather: Option<WeatherReport>,
    pub safety_score: f64,
    pub no_fly_zones_nearby: Vec<String>,
    pub safe_area_polygon: Option<SafeArea>,
    pub description: String,
    pub google_maps_url: String,
    pub openstreetmap_url: String,
}

/// A search request after parsing and defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub postal_code: Option<String>,
    pub radius_km: f64,
    pub spot_types: Option<Vec<Category>>,
    pub max_results: usize,
    pub car_accessible_only: bool,
}

impl Default for SpotQuery {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            address: None,
            state: None,
            district: None,
            postal_code: None,
            radius_km: 10.0,
            spot_types: None,
            max_results: 20,
            car_accessible_only: false,
        }
    }
}

impl SpotQuery {
    pub fn coordinates(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query_location: QueryLocation,
    pub total_spots_found: usize,
    pub spots: Vec<EnrichedSpot>,
    pub search_radius_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_prefers_point_over_center() {
        let mut candidate = Candidate::node(1, 5.0, 100.0, Tags::new());
        candidate.center = Some(Coordinate::new(6.0, 101.0));
        assert_eq!(candidate.position(), Some(Coordinate::new(5.0, 100.0)));

        candidate.lat = None;
        assert_eq!(candidate.position(), Some(Coordinate::new(6.0, 101.0)));
    }

    #[test]
    fn empty_name_is_treated_as_missing() {
        let tags: Tags = [("name", "  ")].into_iter().collect();
        let candidate = Candidate::node(1, 5.0, 100.0, tags);
        assert_eq!(candidate.name(), None);

        let tags: Tags = [("name", ""), ("name:en", "Bujang Valley")].into_iter().collect();
        assert_eq!(tags.name(), Some("Bujang Valley"));
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Beach".parse::<Category>(), Ok(Category::Beach));
        assert_eq!(" hill_mountain ".parse::<Category>(), Ok(Category::HillMountain));
        assert!("volcano".parse::<Category>().is_err());
    }

    #[test]
    fn candidate_deserializes_from_index_payload() {
        let raw = r#"{"id": 42, "center": {"lat": 3.1, "lon": 101.6}, "tags": {"leisure": "park"}}"#;
        let candidate: Candidate = serde_json::from_str(raw).expect("parse");
        assert_eq!(candidate.position(), Some(Coordinate::new(3.1, 101.6)));
        assert!(candidate.tags.is("leisure", "park"));
    }

    #[test]
    fn weather_summary_formats_missing_fields() {
        let mut weather = WeatherSnapshot::calm();
        weather.temperature = Some(30.5);
        assert_eq!(weather.summary(), "Wind: 0 m/s, Temp: 30.5°C, Clear");

        weather.wind_speed = None;
        weather.weather_main = None;
        assert_eq!(weather.summary(), "Wind: N/A m/s, Temp: 30.5°C, N/A");
    }
}

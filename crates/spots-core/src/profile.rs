//! Regional reference tables: operational bounds, postal directory and known places.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::Coordinate;

const EMBEDDED_PROFILE: &str = include_str!("../data/malaysia.json");

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid region profile JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("region profile has no operational bounds")]
    NoBounds,
    #[error("invalid bounding box '{0}'")]
    InvalidBounds(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(default)]
    pub name: String,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: Coordinate) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }

    fn is_valid(&self) -> bool {
        [self.min_lat, self.max_lat, self.min_lon, self.max_lon]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lat <= self.max_lat
            && self.min_lon <= self.max_lon
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostalRange {
    pub start: u32,
    pub end: u32,
    pub region: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostalDirectory {
    #[serde(default)]
    pub codes: BTreeMap<String, String>,
    #[serde(default)]
    pub ranges: Vec<PostalRange>,
}

impl PostalDirectory {
    /// Owning region for a normalized 5-digit code, exact entries first.
    pub fn region_for(&self, code: &str) -> Option<&str> {
        if let Some(region) = self.codes.get(code) {
            return Some(region);
        }
        let numeric: u32 = code.parse().ok()?;
        self.ranges
            .iter()
            .find(|range| numeric >= range.start && numeric <= range.end)
            .map(|range| range.region.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSpot {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl ReferenceSpot {
    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Read-only lookup tables for one operating country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionProfile {
    pub country: String,
    pub operational_bounds: Vec<BoundingBox>,
    #[serde(default)]
    pub low_coverage_bounds: Vec<BoundingBox>,
    pub name_search_bounds: BoundingBox,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub known_places: BTreeMap<String, Coordinate>,
    #[serde(default)]
    pub postal: PostalDirectory,
    #[serde(default)]
    pub reference_spots: Vec<ReferenceSpot>,
}

impl RegionProfile {
    pub fn from_json_str(raw: &str) -> Result<Self, ProfileError> {
        let mut profile: RegionProfile = serde_json::from_str(raw)?;
        if profile.operational_bounds.is_empty() {
            return Err(ProfileError::NoBounds);
        }
        for bounds in profile
            .operational_bounds
            .iter()
            .chain(profile.low_coverage_bounds.iter())
            .chain(std::iter::once(&profile.name_search_bounds))
        {
            if !bounds.is_valid() {
                return Err(ProfileError::InvalidBounds(bounds.name.clone()));
            }
        }
        profile.known_places = profile
            .known_places
            .into_iter()
            .map(|(name, coord)| (name.trim().to_lowercase(), coord))
            .collect();
        Ok(profile)
    }

    /// The profile compiled into the crate.
    pub fn embedded() -> Result<Self, ProfileError> {
        Self::from_json_str(EMBEDDED_PROFILE)
    }

    pub fn in_operational_region(&self, point: Coordinate) -> bool {
        point.is_finite() && self.operational_bounds.iter().any(|b| b.contains(point))
    }

    pub fn in_low_coverage(&self, point: Coordinate) -> bool {
        point.is_finite() && self.low_coverage_bounds.iter().any(|b| b.contains(point))
    }

    pub fn known_place(&self, name: &str) -> Option<Coordinate> {
        self.known_places.get(&name.trim().to_lowercase()).copied()
    }

    /// Canonical region name if `text` names a whole region (state).
    pub fn region_named(&self, text: &str) -> Option<&str> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.regions
            .iter()
            .find(|region| region.to_lowercase() == needle)
            .map(String::as_str)
    }

    pub fn postal_region(&self, code: &str) -> Option<&str> {
        self.postal.region_for(code)
    }

    pub fn near_reference_spot(&self, point: Coordinate, radius_km: f64) -> bool {
        self.reference_spots
            .iter()
            .any(|spot| spot.position().distance_km(&point) < radius_km)
    }
}

/// Strip spaces and dashes; `None` unless the result is exactly 5 digits.
pub fn normalize_postal_code(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    (cleaned.len() == 5 && cleaned.chars().all(|c| c.is_ascii_digit())).then_some(cleaned)
}

//! No-fly-zone sets and proximity checks.

use serde::{Deserialize, Serialize};

use crate::models::{Candidate, Coordinate, NoFlyZone, ZoneKind};
use crate::rules::SearchRules;

pub const DEFAULT_AIRPORT_NAME: &str = "Unknown Airport";
pub const DEFAULT_MILITARY_NAME: &str = "Military Area";

/// Zones found around one search area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoFlyZoneSet {
    pub airports: Vec<NoFlyZone>,
    pub military_areas: Vec<NoFlyZone>,
}

impl NoFlyZoneSet {
    pub fn from_elements(
        airports: &[Candidate],
        military: &[Candidate],
        rules: &SearchRules,
    ) -> Self {
        Self {
            airports: zones_from(airports, ZoneKind::Airport, rules.airport_radius_km),
            military_areas: zones_from(military, ZoneKind::Military, rules.military_radius_km),
        }
    }

    pub fn len(&self) -> usize {
        self.airports.len() + self.military_areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptions of every zone whose exclusion radius covers `point`.
    pub fn nearby(&self, point: Coordinate) -> Vec<String> {
        self.airports
            .iter()
            .chain(self.military_areas.iter())
            .filter_map(|zone| {
                let distance_km = point.distance_km(&Coordinate::new(zone.lat, zone.lon));
                (distance_km <= zone.radius_km).then(|| describe(zone, distance_km))
            })
            .collect()
    }
}

fn zones_from(elements: &[Candidate], kind: ZoneKind, radius_km: f64) -> Vec<NoFlyZone> {
    let default_name = match kind {
        ZoneKind::Airport => DEFAULT_AIRPORT_NAME,
        ZoneKind::Military => DEFAULT_MILITARY_NAME,
    };
    elements
        .iter()
        .filter_map(|element| {
            let position = element.position()?;
            Some(NoFlyZone {
                name: element.name().unwrap_or(default_name).to_string(),
                lat: position.lat,
                lon: position.lon,
                radius_km,
                kind,
            })
        })
        .collect()
}

fn describe(zone: &NoFlyZone, distance_km: f64) -> String {
    let label = match zone.kind {
        ZoneKind::Airport => "Airport",
        ZoneKind::Military => "Military Area",
    };
    format!("{} ({}, {:.1}km away)", zone.name, label, distance_km)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tags;

    fn element(id: i64, lat: f64, lon: f64, name: Option<&str>) -> Candidate {
        let mut tags = Tags::new();
        if let Some(name) = name {
            tags.insert("name", name);
        }
        Candidate::node(id, lat, lon, tags)
    }

    #[test]
    fn elements_become_zones_with_default_names() {
        let rules = SearchRules::default();
        let set = NoFlyZoneSet::from_elements(
            &[element(1, 6.1897, 100.3981, Some("Sultan Abdul Halim Airport"))],
            &[element(2, 6.0, 100.5, None)],
            &rules,
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.airports[0].radius_km, 5.0);
        assert_eq!(set.military_areas[0].name, "Military Area");
        assert_eq!(set.military_areas[0].radius_km, 3.0);
    }

    #[test]
    fn english_names_label_zones() {
        let mut tags = Tags::new();
        tags.insert("name:en", "Butterworth Air Base");
        let set = NoFlyZoneSet::from_elements(
            &[],
            &[Candidate::node(3, 5.4659, 100.3911, tags)],
            &SearchRules::default(),
        );
        assert_eq!(set.military_areas[0].name, "Butterworth Air Base");
    }

    #[test]
    fn nearby_only_reports_covering_zones() {
        let rules = SearchRules::default();
        let set = NoFlyZoneSet::from_elements(
            &[element(1, 6.1897, 100.3981, Some("Alor Setar"))],
            &[],
            &rules,
        );
        let inside = Coordinate::new(6.20, 100.40);
        let hits = set.nearby(inside);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].starts_with("Alor Setar (Airport, "));
        assert!(hits[0].ends_with("km away)"));

        let outside = Coordinate::new(6.40, 100.40);
        assert!(set.nearby(outside).is_empty());
    }
}

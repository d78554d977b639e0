//! In-memory signal caches keyed by rounded coordinates.

use dashmap::DashMap;
use spots_core::{CarAccessibility, Coordinate, NoFlyZoneSet, WeatherSnapshot};
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::CacheLimits;

#[derive(Debug, Clone)]
struct Cached<V> {
    fetched_at: Instant,
    value: V,
}

/// Bounded map with an optional time-to-live.
///
/// Stale entries read as absent but stay in the map until pruned.
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, Cached<V>>,
    ttl: Option<Duration>,
    max_entries: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Option<Duration>, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn permanent(max_entries: usize) -> Self {
        Self::new(None, max_entries)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.entries.get(key)?;
        if let Some(ttl) = self.ttl {
            if entry.fetched_at.elapsed() > ttl {
                return None;
            }
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Cached {
                fetched_at: Instant::now(),
                value,
            },
        );
        if self.entries.len() > self.max_entries {
            self.prune();
        }
    }

    /// Drop expired entries, then the oldest until within bound.
    fn prune(&self) {
        if let Some(ttl) = self.ttl {
            self.entries.retain(|_, entry| entry.fetched_at.elapsed() <= ttl);
        }
        let excess = self.entries.len().saturating_sub(self.max_entries);
        if excess == 0 {
            return;
        }

        let mut by_age: Vec<(K, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().fetched_at))
            .collect();
        by_age.sort_by_key(|(_, fetched_at)| *fetched_at);
        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Coordinates scaled to a fixed number of decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    lat: i64,
    lon: i64,
}

impl CoordKey {
    pub fn new(point: Coordinate, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        Self {
            lat: (point.lat * factor).round() as i64,
            lon: (point.lon * factor).round() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AreaKey {
    center: CoordKey,
    radius_km: i64,
}

impl AreaKey {
    pub fn new(center: Coordinate, radius_km: f64) -> Self {
        Self {
            center: CoordKey::new(center, 2),
            radius_km: radius_km.trunc() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    from: CoordKey,
    to: CoordKey,
}

impl RouteKey {
    pub fn new(from: Coordinate, to: Coordinate) -> Self {
        Self {
            from: CoordKey::new(from, 4),
            to: CoordKey::new(to, 4),
        }
    }

    pub fn reversed(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}

/// The independent caches shared by every search.
#[derive(Debug)]
pub struct SignalCaches {
    pub no_fly: TtlCache<AreaKey, NoFlyZoneSet>,
    pub weather: TtlCache<CoordKey, WeatherSnapshot>,
    pub elevation: TtlCache<CoordKey, f64>,
    pub car_access: TtlCache<CoordKey, CarAccessibility>,
    /// Road distance in kilometers
    pub road_distance: TtlCache<RouteKey, f64>,
}

impl SignalCaches {
    pub const WEATHER_DECIMALS: i32 = 2;
    pub const ELEVATION_DECIMALS: i32 = 3;
    pub const CAR_ACCESS_DECIMALS: i32 = 4;

    pub fn new(limits: &CacheLimits) -> Self {
        Self {
            no_fly: TtlCache::permanent(limits.no_fly_max_entries),
            weather: TtlCache::new(
                Some(Duration::from_secs(limits.weather_ttl_s)),
                limits.weather_max_entries,
            ),
            elevation: TtlCache::permanent(limits.elevation_max_entries),
            car_access: TtlCache::new(
                Some(Duration::from_secs(limits.car_access_ttl_s)),
                limits.car_access_max_entries,
            ),
            road_distance: TtlCache::new(
                Some(Duration::from_secs(limits.road_distance_ttl_s)),
                limits.road_distance_max_entries,
            ),
        }
    }

    pub fn clear(&self) {
        self.no_fly.clear();
        self.weather.clear();
        self.elevation.clear();
        self.car_access.clear();
        self.road_distance.clear();
    }
}

impl Default for SignalCaches {
    fn default() -> Self {
        Self::new(&CacheLimits::default())
    }
}

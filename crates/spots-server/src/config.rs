//! Server configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub user_agent: String,
    pub http_timeout_s: u64,
    pub nominatim_url: String,
    pub overpass_url: String,
    pub overpass_timeout_s: u64,
    pub overpass_retries: u32,
    pub overpass_retry_backoff_ms: u64,
    pub elevation_url: String,
    pub weather_url: String,
    pub weather_api_key: Option<String>,
    pub osrm_url: String,
    pub use_osrm: bool,
    /// Per-candidate enrichment budget
    pub candidate_timeout_s: u64,
    /// Whole-batch enrichment budget
    pub batch_timeout_s: u64,
    pub max_concurrent_candidates: usize,
    pub cache_limits: CacheLimits,
    /// Optional JSON file replacing the embedded region profile
    pub region_profile_path: Option<String>,
    /// Optional JSON file overriding scoring rules
    pub rules_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CacheLimits {
    pub no_fly_max_entries: usize,
    pub weather_max_entries: usize,
    pub weather_ttl_s: u64,
    pub elevation_max_entries: usize,
    pub car_access_max_entries: usize,
    pub car_access_ttl_s: u64,
    pub road_distance_max_entries: usize,
    pub road_distance_ttl_s: u64,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            no_fly_max_entries: 256,
            weather_max_entries: 4096,
            weather_ttl_s: 3600,
            elevation_max_entries: 65_536,
            car_access_max_entries: 8192,
            car_access_ttl_s: 86_400,
            road_distance_max_entries: 16_384,
            road_distance_ttl_s: 86_400,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = CacheLimits::default();
        Self {
            server_port: parse_env("SPOTS_PORT", 8000),
            user_agent: env::var("SPOTS_USER_AGENT")
                .unwrap_or_else(|_| "drone-spots-api/0.2 (spot search)".to_string()),
            http_timeout_s: parse_env("SPOTS_HTTP_TIMEOUT_S", 30),
            nominatim_url: env::var("SPOTS_NOMINATIM_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            overpass_url: env::var("SPOTS_OVERPASS_URL")
                .unwrap_or_else(|_| "https://overpass-api.de/api/interpreter".to_string()),
            overpass_timeout_s: parse_env("SPOTS_OVERPASS_TIMEOUT_S", 25),
            overpass_retries: parse_env("SPOTS_OVERPASS_RETRIES", 1),
            overpass_retry_backoff_ms: parse_env("SPOTS_OVERPASS_RETRY_BACKOFF_MS", 500),
            elevation_url: env::var("SPOTS_ELEVATION_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com/v1/elevation".to_string()),
            weather_url: env::var("SPOTS_WEATHER_URL").unwrap_or_else(|_| {
                "https://api.openweathermap.org/data/2.5/weather".to_string()
            }),
            weather_api_key: optional_env("OPENWEATHER_API_KEY"),
            osrm_url: env::var("SPOTS_OSRM_URL")
                .unwrap_or_else(|_| "https://router.project-osrm.org".to_string()),
            use_osrm: env::var("SPOTS_USE_OSRM")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
            candidate_timeout_s: parse_env("SPOTS_CANDIDATE_TIMEOUT_S", 30),
            batch_timeout_s: parse_env("SPOTS_BATCH_TIMEOUT_S", 60),
            max_concurrent_candidates: parse_env("SPOTS_MAX_CONCURRENT_CANDIDATES", 10),
            cache_limits: CacheLimits {
                no_fly_max_entries: parse_env(
                    "SPOTS_NO_FLY_CACHE_MAX_ENTRIES",
                    defaults.no_fly_max_entries,
                ),
                weather_max_entries: parse_env(
                    "SPOTS_WEATHER_CACHE_MAX_ENTRIES",
                    defaults.weather_max_entries,
                ),
                weather_ttl_s: parse_env("SPOTS_WEATHER_CACHE_TTL_S", defaults.weather_ttl_s),
                elevation_max_entries: parse_env(
                    "SPOTS_ELEVATION_CACHE_MAX_ENTRIES",
                    defaults.elevation_max_entries,
                ),
                car_access_max_entries: parse_env(
                    "SPOTS_CAR_ACCESS_CACHE_MAX_ENTRIES",
                    defaults.car_access_max_entries,
                ),
                car_access_ttl_s: parse_env(
                    "SPOTS_CAR_ACCESS_CACHE_TTL_S",
                    defaults.car_access_ttl_s,
                ),
                road_distance_max_entries: parse_env(
                    "SPOTS_ROAD_DISTANCE_CACHE_MAX_ENTRIES",
                    defaults.road_distance_max_entries,
                ),
                road_distance_ttl_s: parse_env(
                    "SPOTS_ROAD_DISTANCE_CACHE_TTL_S",
                    defaults.road_distance_ttl_s,
                ),
            },
            region_profile_path: optional_env("SPOTS_REGION_PROFILE"),
            rules_path: optional_env("SPOTS_RULES"),
        }
    }

    pub fn enrichment_limits(&self) -> EnrichmentLimits {
        EnrichmentLimits {
            candidate_timeout: Duration::from_secs(self.candidate_timeout_s.max(1)),
            batch_timeout: Duration::from_secs(self.batch_timeout_s.max(1)),
            max_concurrent: self.max_concurrent_candidates.max(1),
        }
    }
}

/// Time and concurrency budget for one enrichment batch.
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentLimits {
    pub candidate_timeout: Duration,
    pub batch_timeout: Duration,
    pub max_concurrent: usize,
}

impl Default for EnrichmentLimits {
    fn default() -> Self {
        Self {
            candidate_timeout: Duration::from_secs(30),
            batch_timeout: Duration::from_secs(60),
            max_concurrent: 10,
        }
    }
}

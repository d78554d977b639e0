pub mod classify;
pub mod models;
pub mod path;
pub mod profile;
pub mod ranking;
pub mod relevance;
pub mod rules;
pub mod scoring;
pub mod spatial;
pub mod zones;

pub use classify::{classify, display_name, is_inappropriate, qualifies_unnamed};
pub use models::{
    Candidate, CarAccessibility, Category, Coordinate, EnrichedSpot, NoFlyZone, QueryLocation,
    RoadSample, SafeArea, SearchResponse, SlopeSummary, SpotQuery, Tags, TerrainType,
    WeatherReport, WeatherSnapshot, ZoneKind,
};
pub use path::{analyze_path, path_samples, ElevationPathAnalysis, ElevationPoint};
pub use profile::{normalize_postal_code, BoundingBox, ProfileError, RegionProfile};
pub use ranking::rank_spots;
pub use relevance::relevance_score;
pub use rules::{RankingWeights, SearchRules, WeatherLimits};
pub use scoring::{
    car_accessibility, is_weather_safe, safe_area, safety_score, slope_summary, terrain_type,
    SafetyInputs,
};
pub use spatial::haversine_distance;
pub use zones::NoFlyZoneSet;

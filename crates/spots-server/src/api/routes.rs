//! REST API routes.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use spots_core::{Category, Coordinate, ElevationPathAnalysis, NoFlyZoneSet, SpotQuery};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::api::request_id;
use crate::error::SearchError;
use crate::state::AppState;

const MAX_RADIUS_KM: f64 = 200.0;
const MAX_RESULTS: usize = 100;
const NO_FLY_NOTE: &str =
    "Data fetched from OpenStreetMap. Always check with local aviation authorities before flying.";

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    with_middleware(
        Router::new()
            .route("/", get(service_info))
            .route("/health", get(|| async { "OK" }))
            .route("/search", get(search_spots))
            .route("/no-fly-zones", get(get_no_fly_zones))
            .route("/spot-types", get(get_spot_types))
            .route("/elevation-path", get(get_elevation_path)),
    )
}

/// Panic recovery, tracing and request ids, outermost last.
pub(crate) fn with_middleware(router: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::ensure_request_id))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    SearchError::Internal(format!("handler panicked: {detail}")).into_response()
}

// === Request/Response types ===

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub postal_code: Option<String>,
    pub radius_km: Option<f64>,
    /// Comma-separated category names
    pub spot_types: Option<String>,
    pub max_results: Option<usize>,
    pub car_accessible_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct NoFlyParams {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ElevationPathParams {
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub end_latitude: f64,
    pub end_longitude: f64,
    pub flight_altitude_m: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AreaLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

#[derive(Debug, Serialize)]
pub struct NoFlyZonesResponse {
    pub query_location: AreaLocation,
    pub no_fly_zones: NoFlyZoneSet,
    pub total_airports: usize,
    pub total_military_areas: usize,
    pub note: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PointLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct ElevationPathResponse {
    pub start_location: PointLocation,
    pub end_location: PointLocation,
    pub path_analysis: ElevationPathAnalysis,
}

// === Validation ===

fn params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, SearchError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| SearchError::InvalidRequest(rejection.body_text()))
}

fn validate_point(lat: f64, lon: f64, label: &str) -> Result<Coordinate, SearchError> {
    if !(lat.is_finite() && (-90.0..=90.0).contains(&lat)) {
        return Err(SearchError::InvalidRequest(format!(
            "{label} latitude must be between -90 and 90"
        )));
    }
    if !(lon.is_finite() && (-180.0..=180.0).contains(&lon)) {
        return Err(SearchError::InvalidRequest(format!(
            "{label} longitude must be between -180 and 180"
        )));
    }
    Ok(Coordinate::new(lat, lon))
}

fn validate_radius(radius_km: f64) -> Result<f64, SearchError> {
    if radius_km.is_finite() && radius_km > 0.0 && radius_km <= MAX_RADIUS_KM {
        Ok(radius_km)
    } else {
        Err(SearchError::InvalidRequest(format!(
            "radius_km must be greater than 0 and at most {MAX_RADIUS_KM}"
        )))
    }
}

fn parse_spot_types(raw: &str) -> Result<Option<Vec<Category>>, SearchError> {
    let mut categories = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let category = part
            .parse::<Category>()
            .map_err(|err| SearchError::InvalidRequest(err.to_string()))?;
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    Ok((!categories.is_empty()).then_some(categories))
}

impl SearchParams {
    pub fn into_query(self) -> Result<SpotQuery, SearchError> {
        let defaults = SpotQuery::default();

        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            validate_point(lat, lon, "Query")?;
        }
        let radius_km = validate_radius(self.radius_km.unwrap_or(defaults.radius_km))?;
        let max_results = self.max_results.unwrap_or(defaults.max_results);
        if !(1..=MAX_RESULTS).contains(&max_results) {
            return Err(SearchError::InvalidRequest(format!(
                "max_results must be between 1 and {MAX_RESULTS}"
            )));
        }
        let spot_types = match self.spot_types.as_deref() {
            Some(raw) => parse_spot_types(raw)?,
            None => None,
        };

        Ok(SpotQuery {
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address,
            state: self.state,
            district: self.district,
            postal_code: self.postal_code,
            radius_km,
            spot_types,
            max_results,
            car_accessible_only: self.car_accessible_only.unwrap_or(false),
        })
    }
}

// === Handlers ===

async fn service_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let country = &state.search().profile().country;
    Json(json!({
        "service": format!("{country} Drone Spots API"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": format!("Find the best drone flying locations in {country}"),
        "weather_configured": state.config().weather_api_key.is_some(),
        "endpoints": {
            "/search": "Search for drone spots",
            "/no-fly-zones": "Airports and military areas near a location",
            "/spot-types": "Available spot types",
            "/elevation-path": "Terrain obstacles along a flight path",
            "/health": "Liveness probe"
        }
    }))
}

async fn search_spots(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<impl IntoResponse, SearchError> {
    let query = params(query)?.into_query()?;
    let response = state.search().search(&query).await?;
    tracing::info!(
        "Search returned {} spots within {}km",
        response.total_spots_found,
        response.search_radius_km
    );
    Ok(Json(response))
}

async fn get_no_fly_zones(
    State(state): State<Arc<AppState>>,
    query: Result<Query<NoFlyParams>, QueryRejection>,
) -> Result<impl IntoResponse, SearchError> {
    let query = params(query)?;
    let center = validate_point(query.latitude, query.longitude, "Query")?;
    let radius_km = validate_radius(query.radius_km.unwrap_or(50.0))?;

    let zones = state.search().no_fly_zones(center, radius_km).await?;
    Ok(Json(NoFlyZonesResponse {
        query_location: AreaLocation {
            latitude: center.lat,
            longitude: center.lon,
            radius_km,
        },
        total_airports: zones.airports.len(),
        total_military_areas: zones.military_areas.len(),
        no_fly_zones: zones,
        note: NO_FLY_NOTE,
    }))
}

async fn get_spot_types() -> impl IntoResponse {
    let spot_types: Map<String, Value> = Category::ALL
        .iter()
        .map(|category| {
            (
                category.as_str().to_string(),
                json!({
                    "description": category.description(),
                    "examples": category.examples(),
                }),
            )
        })
        .collect();
    Json(json!({ "spot_types": spot_types }))
}

async fn get_elevation_path(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ElevationPathParams>, QueryRejection>,
) -> Result<impl IntoResponse, SearchError> {
    let query = params(query)?;
    let start = validate_point(query.start_latitude, query.start_longitude, "Start")?;
    let end = validate_point(query.end_latitude, query.end_longitude, "End")?;
    let flight_altitude_m = query.flight_altitude_m.unwrap_or(50.0);
    if !(flight_altitude_m.is_finite() && flight_altitude_m > 0.0) {
        return Err(SearchError::InvalidRequest(
            "flight_altitude_m must be a positive number".to_string(),
        ));
    }

    let path_analysis = state
        .search()
        .elevation_path(start, end, flight_altitude_m)
        .await;
    Ok(Json(ElevationPathResponse {
        start_location: PointLocation {
            latitude: start.lat,
            longitude: start.lon,
        },
        end_location: PointLocation {
            latitude: end.lat,
            longitude: end.lon,
        },
        path_analysis,
    }))
}

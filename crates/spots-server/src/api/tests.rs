use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use spots_core::{RegionProfile, SearchRules};
use std::sync::Arc;
use tower::ServiceExt;

use crate::api::request_id::REQUEST_ID_HEADER;
use crate::api::routes::with_middleware;
use crate::config::Config;
use crate::providers::QueryPurpose;
use crate::service::SpotSearch;
use crate::testing::{node, test_config, FakeGeocoder, FakeProviders, FakeSpatialIndex};
use crate::{api, state::AppState};

fn kl_index() -> FakeSpatialIndex {
    FakeSpatialIndex::default()
        .with(
            QueryPurpose::Candidates,
            vec![
                node(1, 3.1550, 101.7050, &[("name", "Taman Tasik Titiwangsa"), ("leisure", "park")]),
                node(2, 3.1420, 101.6880, &[("name", "Padang Merbok"), ("leisure", "park")]),
            ],
        )
        .with(
            QueryPurpose::Airports,
            vec![node(10, 3.1300, 101.5490, &[("aeroway", "aerodrome"), ("name", "Subang")])],
        )
        .with(
            QueryPurpose::Roads,
            vec![node(90, 3.1420, 101.6880, &[("highway", "secondary")])],
        )
}

fn app_state(fakes: &FakeProviders, config: Config) -> Arc<AppState> {
    let search = SpotSearch::new(
        fakes.providers(),
        RegionProfile::embedded().expect("profile"),
        SearchRules::default(),
        &config,
    );
    Arc::new(AppState::new(config, search))
}

fn setup_app(fakes: &FakeProviders) -> axum::Router {
    api::routes().with_state(app_state(fakes, test_config()))
}

async fn get(app: axum::Router, uri: &str) -> axum::response::Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_and_service_info() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let app = setup_app(&fakes);

    let health = get(app.clone(), "/health").await;
    assert_eq!(health.status(), StatusCode::OK);

    let info = read_json(get(app, "/").await).await;
    assert_eq!(info["service"], "Malaysia Drone Spots API");
    assert_eq!(info["weather_configured"], false);
    assert!(info["endpoints"]["/search"].is_string());
}

#[tokio::test]
async fn spot_types_lists_every_category() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let body = read_json(get(setup_app(&fakes), "/spot-types").await).await;
    let types = body["spot_types"].as_object().expect("object");
    assert_eq!(types.len(), 4);
    assert!(types["beach"]["description"].is_string());
    assert!(types["hill_mountain"]["examples"].is_string());
}

#[tokio::test]
async fn search_by_coordinates() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let response = get(
        setup_app(&fakes),
        "/search?latitude=3.139&longitude=101.6869&radius_km=10&spot_types=open_field",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let spots = body["spots"].as_array().expect("spots");
    assert_eq!(body["total_spots_found"].as_u64(), Some(spots.len() as u64));
    assert!(!spots.is_empty());
    assert_eq!(body["query_location"]["latitude"], 3.139);
    assert!(spots[0]["google_maps_url"].as_str().unwrap().contains("3."));
}

#[tokio::test]
async fn invalid_radius_is_rejected() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let app = setup_app(&fakes);

    for uri in [
        "/search?latitude=3.1&longitude=101.6&radius_km=0",
        "/search?latitude=3.1&longitude=101.6&radius_km=500",
        "/search?latitude=3.1&longitude=101.6&max_results=0",
        "/search?latitude=3.1&longitude=101.6&radius_km=abc",
    ] {
        let response = get(app.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
    assert_eq!(fakes.spatial.count(QueryPurpose::Candidates), 0);
}

#[tokio::test]
async fn unknown_spot_type_is_rejected() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let response = get(
        setup_app(&fakes),
        "/search?latitude=3.1&longitude=101.6&spot_types=beach,volcano",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "InvalidRequest");
    assert!(body["message"].as_str().unwrap().contains("volcano"));
}

#[tokio::test]
async fn coordinates_outside_the_country_are_rejected() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let response = get(setup_app(&fakes), "/search?latitude=13.75&longitude=100.5").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "OutOfRegion");
}

#[tokio::test]
async fn unknown_address_is_not_found() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let response = get(setup_app(&fakes), "/search?address=Atlantis").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["error"], "LocationNotFound");
}

#[tokio::test]
async fn spatial_index_outage_is_unavailable() {
    let fakes = FakeProviders::new(
        FakeGeocoder::default(),
        kl_index().failing(QueryPurpose::Candidates),
    );
    let response = get(setup_app(&fakes), "/search?latitude=3.139&longitude=101.6869").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json(response).await;
    assert_eq!(body["error"], "ExternalServiceUnavailable");
    assert_eq!(
        body["message"],
        "Overpass is temporarily unavailable. Please try again later."
    );
}

#[tokio::test]
async fn no_fly_zones_report_totals() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let response = get(
        setup_app(&fakes),
        "/no-fly-zones?latitude=3.139&longitude=101.6869",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["query_location"]["radius_km"], 50.0);
    assert_eq!(body["total_airports"], 1);
    assert_eq!(body["total_military_areas"], 0);
    assert_eq!(body["no_fly_zones"]["airports"][0]["name"], "Subang");
    assert!(body["note"].as_str().unwrap().contains("aviation authorities"));
}

#[tokio::test]
async fn elevation_path_over_flat_ground_is_safe() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let response = get(
        setup_app(&fakes),
        "/elevation-path?start_latitude=3.1&start_longitude=101.6&end_latitude=3.2&end_longitude=101.7",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["start_location"]["latitude"], 3.1);
    assert_eq!(body["path_analysis"]["safe"], true);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "trace-me")
        .body(Body::empty())
        .unwrap();
    let response = setup_app(&fakes).oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "trace-me"
    );

    let generated = get(setup_app(&fakes), "/health").await;
    assert!(generated.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn service_info_reflects_configuration() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let mut config = test_config();
    config.weather_api_key = Some("owm-key".to_string());
    let app = api::routes().with_state(app_state(&fakes, config));

    let info = read_json(get(app, "/").await).await;
    assert_eq!(info["weather_configured"], true);
}

async fn explode() -> &'static str {
    panic!("elevation grid index out of bounds")
}

#[tokio::test]
async fn handler_panics_become_internal_errors() {
    let fakes = FakeProviders::new(FakeGeocoder::default(), kl_index());
    let app = with_middleware(
        axum::Router::new().route(
            "/explode",
            axum::routing::get(explode),
        ),
    )
    .with_state(app_state(&fakes, test_config()));

    let response = get(app, "/explode").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let body = read_json(response).await;
    assert_eq!(body["error"], "InternalError");
    assert!(!body["message"].as_str().unwrap().contains("out of bounds"));
}

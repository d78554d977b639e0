//! Spots Server - finds, enriches and ranks drone flying spots

use anyhow::{Context, Result};
use spots_core::{RegionProfile, SearchRules};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spots_server::config::Config;
use spots_server::providers::Providers;
use spots_server::service::SpotSearch;
use spots_server::state::AppState;
use spots_server::api;

fn load_profile(config: &Config) -> Result<RegionProfile> {
    match &config.region_profile_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading region profile {path}"))?;
            RegionProfile::from_json_str(&raw)
                .with_context(|| format!("parsing region profile {path}"))
        }
        None => RegionProfile::embedded().context("loading embedded region profile"),
    }
}

fn load_rules(config: &Config) -> Result<SearchRules> {
    match &config.rules_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading search rules {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing search rules {path}"))
        }
        None => Ok(SearchRules::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("spots_server=debug".parse()?))
        .init();

    tracing::info!("Starting Spots Server...");

    let config = Config::from_env();
    let port = config.server_port;
    let profile = load_profile(&config)?;
    let rules = load_rules(&config)?;
    if config.weather_api_key.is_none() {
        tracing::warn!("OPENWEATHER_API_KEY not set; weather lookups are disabled");
    }
    tracing::info!("Serving spots for {}", profile.country);

    let providers = Providers::from_config(&config).context("building HTTP providers")?;
    let search = SpotSearch::new(providers, profile, rules, &config);
    let state = Arc::new(AppState::new(config, search));

    // Build the app
    let app = api::routes()
        .with_state(state)
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

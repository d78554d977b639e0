//! OSRM driving-distance client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use spots_core::Coordinate;

use super::{ProviderError, RoutingService};

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    distance: f64,
}

pub struct OsrmRouter {
    client: Client,
    base_url: String,
}

impl OsrmRouter {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn route_distance(payload: RouteResponse) -> Result<f64, ProviderError> {
    if payload.code != "Ok" {
        return Err(ProviderError::Decode(format!("OSRM code {}", payload.code)));
    }
    payload
        .routes
        .first()
        .map(|route| route.distance)
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or(ProviderError::NoResult)
}

#[async_trait]
impl RoutingService for OsrmRouter {
    async fn road_distance_m(&self, from: Coordinate, to: Coordinate) -> Result<f64, ProviderError> {
        // OSRM expects lon,lat order.
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, from.lon, from.lat, to.lon, to.lat
        );
        let response = self
            .client
            .get(url)
            .query(&[
                ("overview", "false"),
                ("alternatives", "false"),
                ("steps", "false"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let payload: RouteResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Decode(err.to_string()))?;
        route_distance(payload)
    }
}

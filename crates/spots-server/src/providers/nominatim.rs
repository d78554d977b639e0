//! Nominatim geocoding client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use spots_core::Coordinate;

use super::{GeocodeMatch, Geocoder, ProviderError};

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ReverseHit {
    display_name: Option<String>,
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn parse_hit(hit: SearchHit) -> Option<GeocodeMatch> {
    let lat: f64 = hit.lat.trim().parse().ok()?;
    let lon: f64 = hit.lon.trim().parse().ok()?;
    let position = Coordinate::new(lat, lon);
    position.is_finite().then(|| GeocodeMatch {
        position,
        display_name: hit.display_name,
    })
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str, limit: usize) -> Result<Vec<GeocodeMatch>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query.to_string()),
                ("format", "json".to_string()),
                ("limit", limit.max(1).to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|err| ProviderError::Decode(err.to_string()))?;
        Ok(hits.into_iter().filter_map(parse_hit).collect())
    }

    async fn reverse(&self, point: Coordinate) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", point.lat.to_string()),
                ("lon", point.lon.to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let hit: ReverseHit = response
            .json()
            .await
            .map_err(|err| ProviderError::Decode(err.to_string()))?;
        hit.display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or(ProviderError::NoResult)
    }
}

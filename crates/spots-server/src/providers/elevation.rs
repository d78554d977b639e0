//! Open-Meteo elevation client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use spots_core::Coordinate;

use super::{ElevationService, ProviderError};

#[derive(Debug, Deserialize)]
struct OpenMeteoElevationResponse {
    elevation: Option<Vec<f64>>,
}

pub struct OpenMeteoElevation {
    client: Client,
    url: String,
}

impl OpenMeteoElevation {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl ElevationService for OpenMeteoElevation {
    async fn elevation(&self, point: Coordinate) -> Result<f64, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("latitude", format!("{:.6}", point.lat)),
                ("longitude", format!("{:.6}", point.lon)),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let payload: OpenMeteoElevationResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Decode(err.to_string()))?;
        first_elevation(payload)
    }
}

fn first_elevation(payload: OpenMeteoElevationResponse) -> Result<f64, ProviderError> {
    payload
        .elevation
        .and_then(|values| values.into_iter().next())
        .filter(|value| value.is_finite())
        .ok_or(ProviderError::NoResult)
}

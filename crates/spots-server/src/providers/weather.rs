//! OpenWeatherMap current-conditions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use spots_core::{Coordinate, WeatherSnapshot};

use super::{ProviderError, WeatherService};

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    #[serde(default)]
    wind: Option<Wind>,
    #[serde(default)]
    main: Option<MainBlock>,
    visibility: Option<f64>,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    clouds: Option<Clouds>,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Clouds {
    all: Option<f64>,
}

impl From<CurrentWeather> for WeatherSnapshot {
    fn from(payload: CurrentWeather) -> Self {
        let condition = payload.weather.into_iter().next();
        WeatherSnapshot {
            wind_speed: payload.wind.as_ref().and_then(|w| w.speed),
            wind_direction: payload.wind.as_ref().and_then(|w| w.deg),
            temperature: payload.main.as_ref().and_then(|m| m.temp),
            humidity: payload.main.as_ref().and_then(|m| m.humidity),
            visibility: payload
                .visibility
                .unwrap_or(WeatherSnapshot::DEFAULT_VISIBILITY_M),
            weather_main: condition.as_ref().and_then(|c| c.main.clone()),
            weather_description: condition.and_then(|c| c.description),
            clouds: payload.clouds.and_then(|c| c.all),
        }
    }
}

pub struct OpenWeatherMap {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl OpenWeatherMap {
    pub fn new(client: Client, url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            url: url.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl WeatherService for OpenWeatherMap {
    async fn current(&self, point: Coordinate) -> Result<WeatherSnapshot, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("OpenWeatherMap API key"))?;

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("lat", point.lat.to_string()),
                ("lon", point.lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let payload: CurrentWeather = response
            .json()
            .await
            .map_err(|err| ProviderError::Decode(err.to_string()))?;
        Ok(payload.into())
    }
}

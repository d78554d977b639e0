//! Search errors and their HTTP representation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Location not found: {query}. Tried {attempts} different query formats, known places and a map name search.")]
    LocationNotFound { query: String, attempts: usize },
    #[error("Coordinates ({lat}, {lon}) are outside {region}. Please provide a location within {region}.")]
    OutOfRegion { lat: f64, lon: f64, region: String },
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{service} unavailable: {message}")]
    ExternalServiceUnavailable {
        service: &'static str,
        message: String,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl SearchError {
    pub fn unavailable(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::ExternalServiceUnavailable {
            service,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::LocationNotFound { .. } => "LocationNotFound",
            Self::OutOfRegion { .. } => "OutOfRegion",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::ExternalServiceUnavailable { .. } => "ExternalServiceUnavailable",
            Self::Internal(_) => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::LocationNotFound { .. } => StatusCode::NOT_FOUND,
            Self::OutOfRegion { .. } | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ExternalServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "An unexpected error occurred while processing the request".to_string()
            }
            Self::ExternalServiceUnavailable { service, .. } => {
                tracing::warn!("{}", self);
                format!("{service} is temporarily unavailable. Please try again later.")
            }
            _ => self.to_string(),
        };
        (
            self.status(),
            Json(json!({ "error": self.kind(), "message": message })),
        )
            .into_response()
    }
}

//! HTTP API for the spot-search service.

pub mod request_id;
pub(crate) mod routes;

use axum::Router;

pub fn routes() -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;

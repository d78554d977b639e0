//! Overpass API client for tagged map features.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use spots_core::{Candidate, Coordinate, Tags};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;

use super::{ProviderError, SearchArea, SpatialIndex, SpatialQuery, TagClause};
use crate::config::Config;

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenter>,
    tags: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

impl From<OverpassElement> for Candidate {
    fn from(element: OverpassElement) -> Self {
        Candidate {
            id: element.id,
            lat: element.lat,
            lon: element.lon,
            center: element.center.map(|c| Coordinate::new(c.lat, c.lon)),
            tags: element
                .tags
                .map(|tags| tags.into_iter().collect::<Tags>())
                .unwrap_or_default(),
        }
    }
}

pub struct OverpassIndex {
    client: Client,
    url: String,
    max_attempts: u32,
    backoff_base_ms: u64,
}

impl OverpassIndex {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            url: config.overpass_url.clone(),
            max_attempts: config.overpass_retries.saturating_add(1),
            backoff_base_ms: config.overpass_retry_backoff_ms.max(1),
        }
    }
}

#[async_trait]
impl SpatialIndex for OverpassIndex {
    async fn query(&self, query: &SpatialQuery) -> Result<Vec<Candidate>, ProviderError> {
        let body = render_query(query);
        // Leave headroom over the server-side timeout for transfer.
        let request_timeout = Duration::from_secs(query.timeout_s.max(5) + 5);
        let mut last_err = ProviderError::NoResult;

        for attempt in 0..self.max_attempts {
            let response = self
                .client
                .post(&self.url)
                .header("Content-Type", "text/plain")
                .timeout(request_timeout)
                .body(body.clone())
                .send()
                .await;

            match response {
                Ok(response) if !response.status().is_success() => {
                    last_err = ProviderError::Status(response.status().as_u16());
                }
                Ok(response) => match response.json::<OverpassResponse>().await {
                    Ok(parsed) => {
                        tracing::debug!(
                            purpose = %query.purpose,
                            elements = parsed.elements.len(),
                            "Overpass query complete"
                        );
                        return Ok(parsed.elements.into_iter().map(Candidate::from).collect());
                    }
                    Err(err) => last_err = ProviderError::Decode(err.to_string()),
                },
                Err(err) => last_err = ProviderError::Http(err),
            }

            if attempt + 1 < self.max_attempts {
                tracing::warn!(
                    purpose = %query.purpose,
                    attempt = attempt + 1,
                    "Overpass query failed, retrying: {}",
                    last_err
                );
                let delay_ms = self
                    .backoff_base_ms
                    .saturating_mul(u64::from(attempt.saturating_add(1)));
                sleep(Duration::from_millis(delay_ms)).await;
            }
        }

        Err(last_err)
    }
}

/// Render a query as Overpass QL.
pub fn render_query(query: &SpatialQuery) -> String {
    let area = match &query.area {
        SearchArea::Around { center, radius_m } => {
            format!("around:{:.0},{},{}", radius_m, center.lat, center.lon)
        }
        SearchArea::Within(bounds) => format!(
            "{},{},{},{}",
            bounds.min_lat, bounds.min_lon, bounds.max_lat, bounds.max_lon
        ),
    };
    let mut out = format!("[out:json][timeout:{}];\n(\n", query.timeout_s);
    for clause in &query.clauses {
        out.push_str("  ");
        out.push_str(&render_clause(clause, &area));
        out.push('\n');
    }
    out.push_str(");\nout center tags;");
    out
}

fn render_clause(clause: &TagClause, area: &str) -> String {
    let key = escape(&clause.key);
    match &clause.value {
        Some(value) => format!(
            "{}[\"{}\"=\"{}\"]({});",
            clause.element.as_str(),
            key,
            escape(value),
            area
        ),
        None => format!("{}[\"{}\"]({});", clause.element.as_str(), key, area),
    }
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::QueryPurpose;
    use spots_core::BoundingBox;

    #[test]
    fn renders_around_queries() {
        let query = SpatialQuery {
            purpose: QueryPurpose::Candidates,
            area: SearchArea::Around {
                center: Coordinate::new(5.5, 100.4),
                radius_m: 10_000.0,
            },
            clauses: vec![TagClause::node("leisure", "park"), TagClause::way_any("historic")],
            timeout_s: 25,
        };
        let rendered = render_query(&query);
        assert!(rendered.starts_with("[out:json][timeout:25];"));
        assert!(rendered.contains("node[\"leisure\"=\"park\"](around:10000,5.5,100.4);"));
        assert!(rendered.contains("way[\"historic\"](around:10000,5.5,100.4);"));
        assert!(rendered.ends_with("out center tags;"));
    }

    #[test]
    fn renders_bbox_queries_and_escapes_quotes() {
        let query = SpatialQuery {
            purpose: QueryPurpose::NameSearch,
            area: SearchArea::Within(BoundingBox {
                name: String::new(),
                min_lat: 5.0,
                max_lat: 6.5,
                min_lon: 99.5,
                max_lon: 101.0,
            }),
            clauses: vec![TagClause::node("name", "Say \"hi\"")],
            timeout_s: 25,
        };
        let rendered = render_query(&query);
        assert!(rendered.contains("node[\"name\"=\"Say \\\"hi\\\"\"](5,99.5,6.5,101);"));
    }

    #[test]
    fn elements_convert_to_candidates() {
        let raw = r#"{"elements": [
            {"type": "way", "id": 7, "center": {"lat": 5.1, "lon": 100.2}, "tags": {"leisure": "park"}},
            {"type": "node", "id": 8, "lat": 5.2, "lon": 100.3}
        ]}"#;
        let parsed: OverpassResponse = serde_json::from_str(raw).expect("parse");
        let candidates: Vec<Candidate> = parsed.elements.into_iter().map(Candidate::from).collect();
        assert_eq!(candidates[0].position(), Some(Coordinate::new(5.1, 100.2)));
        assert!(candidates[0].tags.is("leisure", "park"));
        assert!(candidates[1].tags.is_empty());
    }
}

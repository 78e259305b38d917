//! Elasticsearch `_search` gateway for the destinations index

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{IndexHit, SearchMode, SearchQuery},
    services::providers::SearchGateway,
};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_source", default)]
    source: Value,
}

#[derive(Clone)]
pub struct ElasticsearchGateway {
    http_client: HttpClient,
    base_url: String,
    index: String,
    api_key: Option<String>,
    size: usize,
    mode: SearchMode,
}

impl ElasticsearchGateway {
    pub fn new(
        base_url: String,
        index: String,
        api_key: Option<String>,
        size: usize,
        mode: SearchMode,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index,
            api_key,
            size,
            mode,
        })
    }

    /// Query DSL body for the configured mode
    fn build_body(&self, query: &SearchQuery) -> Value {
        let field = query.effective_field().as_str();
        let clause = match self.mode {
            SearchMode::Semantic => json!({
                "semantic": {
                    "field": field,
                    "query": query.term,
                }
            }),
            SearchMode::Match => json!({
                "match": {
                    field: { "query": query.term }
                }
            }),
        };

        json!({
            "size": self.size,
            "query": clause,
        })
    }

    fn convert_response(response: SearchResponse) -> Vec<IndexHit> {
        response
            .hits
            .hits
            .iter()
            .map(|hit| IndexHit::from_source(&hit.source))
            .collect()
    }
}

#[async_trait::async_trait]
impl SearchGateway for ElasticsearchGateway {
    async fn search(&self, query: &SearchQuery) -> AppResult<Vec<IndexHit>> {
        let url = format!("{}/{}/_search", self.base_url, self.index);

        let mut request = self.http_client.post(&url).json(&self.build_body(query));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("ApiKey {}", key));
        }

        let response = request.send().await.map_err(|e| {
            let kind = if e.is_timeout() { "timed out" } else { "failed" };
            AppError::SearchUnavailable(format!("Search request {}: {}", kind, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, index = %self.index, "Search index returned an error");
            return Err(AppError::SearchUnavailable(format!(
                "Search index returned status {}: {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            AppError::SearchUnavailable(format!("Unreadable search response: {}", e))
        })?;
        let hits = Self::convert_response(parsed);

        tracing::info!(
            index = %self.index,
            field = %query.effective_field(),
            term = %query.term,
            results = hits.len(),
            provider = self.name(),
            "Destination search completed"
        );

        Ok(hits)
    }

    fn name(&self) -> &'static str {
        "elasticsearch"
    }
}

//! Thin passthrough to the upstream housing-search service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("no search API key configured")]
    MissingCredentials,
    #[error("search request failed: {0}")]
    Transport(String),
    #[error("search service returned status {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// Upstream search response, passed through to the caller largely as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub response_time: f64,
}

/// Seam for the upstream search service.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResponse, SearchError>;
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
    time_range: &'a str,
    include_answer: &'a str,
    include_images: bool,
    include_raw_content: &'a str,
    country: &'a str,
}

impl<'a> TavilyRequest<'a> {
    fn advanced(query: &'a str) -> Self {
        Self {
            query,
            search_depth: "advanced",
            max_results: 7,
            time_range: "week",
            include_answer: "advanced",
            include_images: true,
            include_raw_content: "text",
            country: "canada",
        }
    }
}

/// Client for the Tavily search API.
pub struct TavilyClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl TavilyClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, TAVILY_URL)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SearchGateway for TavilyClient {
    async fn search(&self, query: &str) -> Result<SearchResponse, SearchError> {
        let key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(SearchError::MissingCredentials)?;

        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(key)
            .json(&TavilyRequest::advanced(query))
            .send()
            .await
            .map_err(|err| SearchError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|err| SearchError::Transport(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::net::SocketAddr;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub serves");
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let client = TavilyClient::new(None);
        let err = client.search("lofts in ottawa").await.expect_err("no key");
        assert!(matches!(err, SearchError::MissingCredentials));
    }

    #[tokio::test]
    async fn passes_through_answer_and_results() {
        let router = Router::new().route(
            "/",
            post(|| async {
                Json(json!({
                    "answer": "Two listings match.",
                    "results": [{ "title": "Loft A" }, { "title": "Loft B" }],
                    "query": "lofts in ottawa",
                    "response_time": 1.42
                }))
            }),
        );
        let base = spawn_stub(router).await;
        let client = TavilyClient::with_base_url(Some("key".to_string()), base);

        let response = client.search("lofts in ottawa").await.expect("search ok");
        assert_eq!(response.answer.as_deref(), Some("Two listings match."));
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.query, "lofts in ottawa");
        assert!((response.response_time - 1.42).abs() < f64::EPSILON);
    }
}

//! Passage retrieval for grounded answers.
//!
//! The index itself lives in an external search service; this module only
//! defines the seam and an HTTP client for it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QaError;

/// Fetches the passages most relevant to a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, QaError>;
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    passages: Vec<String>,
}

/// Retriever backed by a search endpoint.
///
/// Sends `POST {url}` with `{"query": .., "k": ..}` and expects
/// `{"passages": ["..", ..]}` back.
pub struct HttpRetriever {
    client: reqwest::Client,
    url: String,
}

impl HttpRetriever {
    pub fn new(url: impl Into<String>) -> Result<Self, QaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| QaError::Retrieval(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, QaError> {
        let response = self
            .client
            .post(&self.url)
            .json(&SearchRequest { query, k })
            .send()
            .await
            .map_err(|e| QaError::Retrieval(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QaError::Retrieval(format!(
                "search service returned HTTP {status}"
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| QaError::Retrieval(format!("invalid search response: {e}")))?;
        debug!(url = %self.url, passages = body.passages.len(), "Retrieved passages");

        let mut passages = body.passages;
        passages.truncate(k);
        Ok(passages)
    }
}

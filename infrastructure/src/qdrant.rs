//! Retrieval against a Qdrant collection over its REST API.

use anyhow::Context;
use async_trait::async_trait;
use domain::models::RetrievedChunk;
use domain::ports::VectorIndex;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::types::Result;
use tracing::warn;

use crate::config::Config;

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    score_threshold: Option<f32>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

pub struct QdrantIndex {
    client: Client,
    base_url: Url,
    payload_field: String,
    score_threshold: Option<f32>,
}

impl QdrantIndex {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid Qdrant URL '{base_url}'"))?;
        Ok(Self {
            client: Client::new(),
            base_url,
            payload_field: "text".to_string(),
            score_threshold: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(&config.qdrant_url)?
            .with_payload_field(&config.payload_field)
            .with_score_threshold(config.score_threshold))
    }

    pub fn with_payload_field(mut self, field: impl Into<String>) -> Self {
        self.payload_field = field.into();
        self
    }

    pub fn with_score_threshold(mut self, threshold: Option<f32>) -> Self {
        self.score_threshold = threshold;
        self
    }

    fn search_url(&self, collection: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Qdrant URL '{}' cannot be a base", self.base_url))?
            .pop_if_empty()
            .extend(["collections", collection, "points", "search"]);
        Ok(url)
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let url = self.search_url(collection)?;
        let request = SearchRequest {
            vector: query,
            limit,
            with_payload: true,
            score_threshold: self.score_threshold,
        };
        let response = self
            .client
            .post(url.clone())
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Qdrant search at {url} failed"))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!(collection, "collection not found; treating as empty");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Qdrant search error {}: {}", status, body));
        }

        let reply: SearchResponse = response
            .json()
            .await
            .context("malformed Qdrant search reply")?;
        Ok(reply
            .result
            .into_iter()
            .filter_map(|point| {
                let text = point
                    .payload
                    .as_ref()?
                    .get(&self.payload_field)?
                    .as_str()?
                    .to_string();
                Some(RetrievedChunk {
                    text,
                    score: point.score,
                })
            })
            .collect())
    }
}

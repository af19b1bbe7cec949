use anyhow::Context;
use async_trait::async_trait;
use domain::ports::{GenerationReply, Generator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::types::Result;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    /// Ollama's name for the output length cap.
    pub num_predict: u32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            num_predict: 512,
        }
    }
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Arc<Client>,
    base_url: String,
    model: String,
    embedding_model: String,
    options: SamplingOptions,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            client: Arc::new(Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            embedding_model: model.clone(),
            model,
            options: SamplingOptions::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.ollama_base_url, &config.ollama_model)
            .with_embedding_model(&config.embedding_model)
            .with_options(SamplingOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
            })
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn with_options(mut self, options: SamplingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("embedding request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Ollama embeddings error {}: {}", status, body));
        }
        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .context("malformed embeddings reply")?;
        Ok(embedding_response.embedding)
    }

    /// Single non-streaming call to `/api/generate`.
    ///
    /// A non-success status is reported as [`GenerationReply::Rejected`]
    /// rather than an error; transport and decoding failures are errors.
    pub async fn generate_response(&self, prompt: &str) -> Result<GenerationReply> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.options,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("generation request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "Ollama generate rejected");
            return Ok(GenerationReply::Rejected {
                status: status.as_u16(),
            });
        }
        let reply: Value = response
            .json()
            .await
            .context("malformed generate reply")?;
        Ok(GenerationReply::Completed {
            response: reply
                .get("response")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<GenerationReply> {
        self.generate_response(prompt).await
    }
}

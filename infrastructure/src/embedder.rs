use super::ollama_client::OllamaClient;
use async_trait::async_trait;
use domain::ports::Embedder;
use shared::types::Result;

pub struct OllamaEmbedder {
    client: OllamaClient,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.client.generate_embedding(text).await?;
        if vector.is_empty() {
            anyhow::bail!("embedding model returned an empty vector");
        }
        Ok(vector)
    }
}

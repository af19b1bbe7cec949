//! Seams to the three external services the relay talks to.
//!
//! Implementations live in `infrastructure`; tests substitute in-memory fakes.

use async_trait::async_trait;
use shared::types::Result;

use crate::models::RetrievedChunk;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Up to `limit` chunks of `collection`, most similar first.
    ///
    /// An empty or missing collection yields an empty list, not an error.
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>>;
}

/// Outcome of one non-streaming generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationReply {
    /// The service answered with a success status. `response` is `None` when
    /// the reply carried no text field.
    Completed { response: Option<String> },
    /// The service answered with a non-success HTTP status.
    Rejected { status: u16 },
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GenerationReply>;
}

use std::sync::Arc;

use domain::models::{ChatMessage, ChatRequest, ChatResponse, RetrievedChunk, Usage};
use domain::ports::{Embedder, GenerationReply, Generator, VectorIndex};
use shared::utils::word_count;
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::prompt::compose_prompt;

/// Answer used when the generation service succeeds without a text field.
pub const MISSING_ANSWER_PLACEHOLDER: &str = "Ответ не получен";

pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone)]
pub struct RagSettings {
    pub collection: String,
    pub top_k: usize,
    pub system_prompt: String,
}

pub struct RagService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn Generator>,
    settings: RagSettings,
}

impl RagService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
        settings: RagSettings,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, RelayError> {
        let question = request
            .last_user_message()
            .ok_or(RelayError::MissingUserMessage)?;
        self.query(question).await
    }

    pub async fn query(&self, question: &str) -> Result<ChatResponse, RelayError> {
        debug!(question_len = question.len(), "relaying question");

        let chunks = self.retrieve(question).await?;
        info!(
            collection = %self.settings.collection,
            chunks = chunks.len(),
            "retrieved context"
        );

        let prompt = compose_prompt(&self.settings.system_prompt, &chunks, question);
        let answer = self.generate(&prompt).await?;

        let usage = Usage::new(word_count(&prompt), word_count(&answer));
        info!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "answer generated"
        );

        Ok(ChatResponse {
            message: ChatMessage::assistant(answer),
            usage,
        })
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>, RelayError> {
        let query_embedding = self
            .embedder
            .embed(question)
            .await
            .map_err(RelayError::Embedding)?;
        self.index
            .search(
                &self.settings.collection,
                &query_embedding,
                self.settings.top_k,
            )
            .await
            .map_err(RelayError::Retrieval)
    }

    async fn generate(&self, prompt: &str) -> Result<String, RelayError> {
        match self
            .generator
            .generate(prompt)
            .await
            .map_err(RelayError::Generation)?
        {
            GenerationReply::Completed {
                response: Some(text),
            } => Ok(text),
            GenerationReply::Completed { response: None } => {
                warn!("generation reply had no response field");
                Ok(MISSING_ANSWER_PLACEHOLDER.to_string())
            }
            GenerationReply::Rejected { status } => {
                warn!(status, "generation service rejected the request");
                Err(RelayError::UpstreamStatus { status })
            }
        }
    }
}

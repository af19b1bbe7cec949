use thiserror::Error;

/// Adapter causes are rendered inline in the message, not exposed as `source`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no user message in request")]
    MissingUserMessage,

    #[error("embedding failed: {0:#}")]
    Embedding(anyhow::Error),

    #[error("retrieval failed: {0:#}")]
    Retrieval(anyhow::Error),

    #[error("generation service returned status {status}")]
    UpstreamStatus { status: u16 },

    #[error("generation request failed: {0:#}")]
    Generation(anyhow::Error),
}

impl RelayError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, RelayError::MissingUserMessage)
    }
}

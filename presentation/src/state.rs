use std::sync::Arc;

use application::rag_service::RagService;

/// Handles shared by every request. Built once at start-up and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub rag: Arc<RagService>,
}

impl AppState {
    pub fn new(rag: RagService) -> Self {
        Self { rag: Arc::new(rag) }
    }
}

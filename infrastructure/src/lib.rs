pub mod config;
pub mod embedder;
pub mod embedding_storage;
pub mod ollama_client;
pub mod qdrant;
pub mod search;

use std::sync::Arc;

use domain::ports::VectorIndex;
use shared::types::Result;

use config::{Config, VectorBackend};
use embedding_storage::EmbeddingStorage;
use qdrant::QdrantIndex;

pub fn open_vector_index(config: &Config) -> Result<Arc<dyn VectorIndex>> {
    let index: Arc<dyn VectorIndex> = match config.vector_backend {
        VectorBackend::Qdrant => Arc::new(QdrantIndex::from_config(config)?),
        VectorBackend::Sqlite => Arc::new(
            EmbeddingStorage::new(&config.db_path)?.with_score_threshold(config.score_threshold),
        ),
    };
    Ok(index)
}

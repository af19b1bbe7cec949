use anyhow::Context;
use async_trait::async_trait;
use domain::models::{RetrievedChunk, StoredEmbedding};
use domain::ports::VectorIndex;
use rusqlite::{params, Connection, Result as SqlResult};
use shared::types::Result;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::search::SearchEngine;

/// Local vector index kept in SQLite and searched by brute force.
///
/// Rows are written by the ingestion process; the relay only reads them.
#[derive(Clone)]
pub struct EmbeddingStorage {
    conn: Arc<Mutex<Connection>>,
    score_threshold: Option<f32>,
}

impl EmbeddingStorage {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::setup_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            score_threshold: None,
        })
    }

    pub fn with_score_threshold(mut self, threshold: Option<f32>) -> Self {
        self.score_threshold = threshold;
        self
    }

    fn setup_db(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            "
            PRAGMA temp_store=MEMORY;
            CREATE TABLE IF NOT EXISTS embeddings (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                vector BLOB NOT NULL,
                text TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_embeddings_collection ON embeddings(collection);
        ",
        )
    }

    pub fn get_collection_embeddings(&self, collection: &str) -> Result<Vec<StoredEmbedding>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("embedding store lock poisoned"))?;
        let mut stmt =
            conn.prepare("SELECT id, vector, text FROM embeddings WHERE collection = ?1")?;
        let mut rows = stmt.query(params![collection])?;
        let mut embeddings = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let vector_bytes: Vec<u8> = row.get(1)?;
            let text: String = row.get(2)?;
            let vector: Vec<f32> = serde_json::from_slice(&vector_bytes)
                .with_context(|| format!("embedding {id} has a malformed vector"))?;
            embeddings.push(StoredEmbedding {
                id,
                collection: collection.to_string(),
                vector,
                text,
            });
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl VectorIndex for EmbeddingStorage {
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let store = self.clone();
        let collection = collection.to_string();
        let query = query.to_vec();
        tokio::task::spawn_blocking(move || -> Result<Vec<RetrievedChunk>> {
            let rows = store.get_collection_embeddings(&collection)?;
            Ok(SearchEngine::find_relevant_chunks(
                &query,
                &rows,
                limit,
                store.score_threshold,
            ))
        })
        .await
        .context("embedding search task failed")?
    }
}

use domain::models::{RetrievedChunk, StoredEmbedding};
use rayon::prelude::*;

pub struct SearchEngine;

impl SearchEngine {
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot_product / (norm_a * norm_b)
    }

    pub fn find_relevant_chunks(
        query_embedding: &[f32],
        embeddings: &[StoredEmbedding],
        top_k: usize,
        threshold: Option<f32>,
    ) -> Vec<RetrievedChunk> {
        let mut similarities: Vec<(f32, &str)> = embeddings
            .par_iter()
            .filter(|emb| emb.vector.len() == query_embedding.len())
            .map(|emb| {
                (
                    Self::cosine_similarity(query_embedding, &emb.vector),
                    &emb.text[..],
                )
            })
            .filter(|(score, _)| !score.is_nan() && threshold.map_or(true, |t| *score >= t))
            .collect();

        similarities.sort_by(|a, b| b.0.total_cmp(&a.0));
        similarities
            .into_iter()
            .take(top_k)
            .map(|(score, text)| RetrievedChunk {
                text: text.to_string(),
                score,
            })
            .collect()
    }
}

use ragprobe_core::traits::VectorRetriever;
use ragprobe_core::types::{Chunk, RetrievedChunk};

use crate::similarity::cosine_similarity;

/// Exhaustive cosine ranking. Chunks without a vector are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct CosineSearch;

impl CosineSearch {
    pub fn new() -> Self { Self }
}

impl VectorRetriever for CosineSearch {
    fn search_vec(&self, query_vec: &[f32], chunks: &[Chunk], k: usize) -> Vec<RetrievedChunk> {
        let mut hits: Vec<RetrievedChunk> = chunks
            .iter()
            .filter_map(|c| {
                let v = c.vector.as_deref().filter(|v| !v.is_empty())?;
                Some(RetrievedChunk::new(c.clone(), cosine_similarity(query_vec, v)))
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        tracing::debug!(candidates = chunks.len(), hits = hits.len(), "semantic search");
        hits
    }
}

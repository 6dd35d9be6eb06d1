//! Strategy dispatch for retrieval: semantic, keyword, or both fused with RRF.

use ragprobe_core::traits::{TextRetriever, VectorRetriever};
use ragprobe_core::types::{Chunk, RetrievedChunk, SearchType};
use ragprobe_text::KeywordSearch;
use ragprobe_vector::CosineSearch;

pub mod fusion;

pub use fusion::{reciprocal_rank_fusion, RRF_K};

pub struct HybridRetriever<TI, VI> where TI: TextRetriever, VI: VectorRetriever {
    text: TI,
    vector: VI,
}

impl<TI, VI> HybridRetriever<TI, VI> where TI: TextRetriever, VI: VectorRetriever {
    pub fn new(text: TI, vector: VI) -> Self { Self { text, vector } }

    /// Rank `chunks` for `query` and keep at most `top_k`, best first.
    ///
    /// Hybrid pulls `2 * top_k` candidates from each side before fusing, and
    /// its scores are RRF sums rather than similarities.
    pub fn retrieve(
        &self,
        query: &str,
        query_vec: &[f32],
        chunks: &[Chunk],
        search_type: SearchType,
        top_k: usize,
    ) -> Vec<RetrievedChunk> {
        let hits = match search_type {
            SearchType::Semantic => self.vector.search_vec(query_vec, chunks, top_k),
            SearchType::Keyword => self.text.search(query, chunks, top_k),
            SearchType::Hybrid => {
                let dense = self.vector.search_vec(query_vec, chunks, top_k * 2);
                let sparse = self.text.search(query, chunks, top_k * 2);
                reciprocal_rank_fusion(&[&dense, &sparse], RRF_K, top_k)
            }
        };
        tracing::debug!(%search_type, top_k, hits = hits.len(), top_score = hits.first().map(|h| h.score), "retrieved");
        hits
    }
}

impl Default for HybridRetriever<KeywordSearch, CosineSearch> {
    fn default() -> Self { Self::new(KeywordSearch::new(), CosineSearch::new()) }
}

/// Retrieve with the built-in keyword and cosine searchers.
pub fn retrieve(
    query: &str,
    query_vec: &[f32],
    chunks: &[Chunk],
    search_type: SearchType,
    top_k: usize,
) -> Vec<RetrievedChunk> {
    HybridRetriever::default().retrieve(query, query_vec, chunks, search_type, top_k)
}

use ragprobe_core::traits::Vectorizer;
use ragprobe_core::types::Chunk;

/// Fill in `vector` for every chunk, in one batch.
pub fn embed_chunks(vectorizer: &dyn Vectorizer, chunks: Vec<Chunk>) -> Vec<Chunk> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = vectorizer.embed_batch(&texts);
    debug_assert!(vectors.iter().all(|v| v.len() == vectorizer.dim()));
    tracing::debug!(chunks = chunks.len(), dim = vectorizer.dim(), "embedded chunks");
    chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| Chunk { vector: Some(vector), ..chunk })
        .collect()
}

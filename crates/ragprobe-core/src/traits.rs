use crate::error::OracleError;
use crate::types::{AnswerResult, Chunk, RetrievedChunk};

/// Text to fixed-length vector. Outputs of one implementation must be
/// cosine-comparable with each other.
pub trait Vectorizer: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;
    fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

pub trait TextRetriever: Send + Sync {
    fn search(&self, query: &str, chunks: &[Chunk], k: usize) -> Vec<RetrievedChunk>;
}

pub trait VectorRetriever: Send + Sync {
    fn search_vec(&self, query_vec: &[f32], chunks: &[Chunk], k: usize) -> Vec<RetrievedChunk>;
}

/// What the answering step is given for one question.
#[derive(Debug, Clone, Copy)]
pub struct OracleRequest<'a> {
    pub question: &'a str,
    pub chunks: &'a [RetrievedChunk],
    pub strict_citations: bool,
    pub abstain_threshold: f32,
}

/// Produces an answer from a question and its ranked context.
///
/// Implementations must keep citations within `1..=chunks.len()` and fold any
/// refusal phrasing into `abstained`.
pub trait AnsweringOracle: Send + Sync {
    fn name(&self) -> &str;
    fn answer(&self, request: &OracleRequest<'_>) -> Result<AnswerResult, OracleError>;
}

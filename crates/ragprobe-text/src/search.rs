use ragprobe_core::traits::TextRetriever;
use ragprobe_core::types::{Chunk, RetrievedChunk};

/// Lowercased whitespace tokens longer than two characters.
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Share of `terms` that occur as a substring of `text` (case-insensitive).
/// Zero when there are no terms.
pub fn keyword_score(terms: &[String], text: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let haystack = text.to_lowercase();
    let matched = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
    matched as f32 / terms.len() as f32
}

/// Substring keyword matching over in-memory chunks.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordSearch;

impl KeywordSearch {
    pub fn new() -> Self { Self }
}

impl TextRetriever for KeywordSearch {
    fn search(&self, query: &str, chunks: &[Chunk], k: usize) -> Vec<RetrievedChunk> {
        let terms = query_terms(query);
        let mut hits: Vec<RetrievedChunk> = chunks
            .iter()
            .map(|c| RetrievedChunk::new(c.clone(), keyword_score(&terms, &c.text)))
            .collect();
        // Stable: equal scores keep chunk order.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        tracing::debug!(terms = terms.len(), hits = hits.len(), "keyword search");
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_terms_are_dropped() {
        assert_eq!(query_terms("What is an LLM agent?"), ["what", "llm", "agent?"]);
        assert!(query_terms("a is of").is_empty());
    }

    #[test]
    fn score_is_fraction_of_matched_terms() {
        let terms = query_terms("neural network pruning");
        assert_eq!(keyword_score(&terms, "Pruning a NEURAL model"), 2.0 / 3.0);
        assert_eq!(keyword_score(&terms, "unrelated"), 0.0);
        assert_eq!(keyword_score(&[], "anything"), 0.0);
    }

    #[test]
    fn substring_matches_count() {
        let terms = query_terms("data");
        assert_eq!(keyword_score(&terms, "metadata fields"), 1.0);
    }
}

//! ragprobe-text
//!
//! Keyword retrieval: the fraction of query terms found in each chunk.
pub mod search;

pub use search::{keyword_score, query_terms, KeywordSearch};

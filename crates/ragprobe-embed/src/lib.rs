#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Deterministic text vectorizers.
//!
//! Both implementations are cheap placeholders for a learned embedding model;
//! anything implementing [`Vectorizer`] can take their place.

use std::collections::HashMap;
use std::hash::Hasher;

use ragprobe_core::config::{EmbeddingBackend, EmbeddingSettings};
use ragprobe_core::traits::Vectorizer;
use twox_hash::XxHash64;

pub mod pool;
pub mod tokenize;

pub use pool::l2_normalize;
pub use tokenize::tokenize;

/// Common English function words followed by a small research-document lexicon.
pub const VOCABULARY: [&str; 65] = [
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i",
    "it", "for", "not", "on", "with", "he", "as", "you", "do", "at",
    "this", "but", "his", "by", "from", "they", "we", "say", "her", "she",
    "or", "an", "will", "my", "one", "all", "would", "there", "their", "what",
    "data", "analysis", "method", "result", "study", "research", "system",
    "model", "process", "approach", "information", "technology", "development",
    "performance", "quality", "application", "design", "implementation", "evaluation",
    "conclusion", "findings", "methodology", "limitations", "future", "work",
];

/// Term counts over [`VOCABULARY`], L2-normalized. Out-of-vocabulary tokens
/// are dropped, so components are never negative.
pub struct BagOfWordsVectorizer {
    slots: HashMap<&'static str, usize>,
}

impl BagOfWordsVectorizer {
    pub fn new() -> Self {
        let slots = VOCABULARY.iter().enumerate().map(|(i, w)| (*w, i)).collect();
        Self { slots }
    }
}

impl Default for BagOfWordsVectorizer {
    fn default() -> Self { Self::new() }
}

impl Vectorizer for BagOfWordsVectorizer {
    fn dim(&self) -> usize { VOCABULARY.len() }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; VOCABULARY.len()];
        for token in tokenize(text) {
            if let Some(&slot) = self.slots.get(token.as_str()) {
                v[slot] += 1.0;
            }
        }
        l2_normalize(&mut v);
        v
    }
}

/// Feature hashing of tokens into `dim` buckets with XxHash64 (seed 0).
/// Open vocabulary, same contract as the bag-of-words vectorizer.
pub struct HashingVectorizer {
    dim: usize,
}

impl HashingVectorizer {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(token.as_bytes());
        (hasher.finish() % self.dim as u64) as usize
    }
}

impl Vectorizer for HashingVectorizer {
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokenize(text) {
            v[self.bucket(&token)] += 1.0;
        }
        l2_normalize(&mut v);
        v
    }
}

pub fn get_default_vectorizer(settings: &EmbeddingSettings) -> Box<dyn Vectorizer> {
    match settings.backend {
        EmbeddingBackend::BagOfWords => {
            tracing::debug!(dim = VOCABULARY.len(), "using bag-of-words vectorizer");
            Box::new(BagOfWordsVectorizer::new())
        }
        EmbeddingBackend::Hashing => {
            tracing::debug!(dim = settings.dimension, "using hashing vectorizer");
            Box::new(HashingVectorizer::new(settings.dimension))
        }
    }
}

//! Domain types shared by the chunker, retrievers, oracle and evaluator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

pub type ChunkId = String;

/// A decoded source document as handed over by ingestion.
///
/// `size` is the original byte length of the upload, not of `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub text: String,
    pub size: usize,
}

impl Document {
    pub fn new(id: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let size = text.len();
        Self { id: id.into(), name: name.into(), text, size }
    }
}

/// A contiguous span of a document used as a retrieval unit.
///
/// - `id`: `{doc_id}-{ordinal}`, ordinals dense and zero-based per document
/// - `doc_id`/`doc_name`: copied from the owning document for display
/// - `start`/`end`: character offsets into the document text (end exclusive)
/// - `vector`: filled in by the vectorizer; chunks without one are invisible to semantic search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub doc_id: String,
    pub doc_name: String,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

/// A chunk scored against one query. Higher is always better; the scale
/// depends on the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub score: f32,
}

impl RetrievedChunk {
    pub fn new(chunk: Chunk, score: f32) -> Self { Self { chunk, score } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Semantic,
    Keyword,
    Hybrid,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Semantic => "semantic",
            SearchType::Keyword => "keyword",
            SearchType::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl std::str::FromStr for SearchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "semantic" => Ok(SearchType::Semantic),
            "keyword" => Ok(SearchType::Keyword),
            "hybrid" => Ok(SearchType::Hybrid),
            other => Err(Error::InvalidConfig(format!("unknown search type '{other}'"))),
        }
    }
}

pub const CHUNK_SIZES: [usize; 4] = [300, 500, 800, 1200];
pub const TOP_K_VALUES: [usize; 3] = [3, 5, 8];

/// Knobs of one RAG pipeline run.
///
/// `chunk_overlap` is a percentage of `chunk_size`; see [`RagConfig::overlap_chars`].
/// Missing fields fall back to the baseline. Snake-case aliases let config
/// files and `RAGPROBE_RAG__*` variables use the same names as the Rust fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RagConfig {
    #[serde(alias = "chunk_size")]
    pub chunk_size: usize,
    #[serde(alias = "chunk_overlap")]
    pub chunk_overlap: u32,
    #[serde(alias = "search_type")]
    pub search_type: SearchType,
    #[serde(alias = "top_k")]
    pub top_k: usize,
    #[serde(alias = "abstain_threshold")]
    pub abstain_threshold: f32,
    #[serde(alias = "strict_citations")]
    pub strict_citations: bool,
}

impl RagConfig {
    /// The fixed configuration every evaluation is compared against.
    pub const fn baseline() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 20,
            search_type: SearchType::Semantic,
            top_k: 5,
            abstain_threshold: 0.5,
            strict_citations: true,
        }
    }

    /// Character overlap between consecutive chunks.
    pub fn overlap_chars(&self) -> usize {
        (self.chunk_size as f64 * f64::from(self.chunk_overlap) / 100.0).round() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if !CHUNK_SIZES.contains(&self.chunk_size) {
            return Err(Error::InvalidConfig(format!(
                "chunkSize must be one of {:?}, got {}", CHUNK_SIZES, self.chunk_size
            )));
        }
        if !TOP_K_VALUES.contains(&self.top_k) {
            return Err(Error::InvalidConfig(format!(
                "topK must be one of {:?}, got {}", TOP_K_VALUES, self.top_k
            )));
        }
        if !(0.0..=1.0).contains(&self.abstain_threshold) {
            return Err(Error::InvalidConfig(format!(
                "abstainThreshold must be within [0, 1], got {}", self.abstain_threshold
            )));
        }
        if self.chunk_overlap >= 100 {
            return Err(Error::InvalidConfig(format!(
                "chunkOverlap is a percentage below 100, got {}", self.chunk_overlap
            )));
        }
        Ok(())
    }
}

impl Default for RagConfig {
    fn default() -> Self { Self::baseline() }
}

/// Why an answer is unsatisfactory, or `Perfect` when it is not.
///
/// Variant order is the canonical reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    RetrievalMiss,
    ContextDilution,
    Hallucination,
    OverAbstain,
    Perfect,
}

impl FailureMode {
    pub const ALL: [FailureMode; 5] = [
        FailureMode::RetrievalMiss,
        FailureMode::ContextDilution,
        FailureMode::Hallucination,
        FailureMode::OverAbstain,
        FailureMode::Perfect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FailureMode::RetrievalMiss => "retrieval_miss",
            FailureMode::ContextDilution => "context_dilution",
            FailureMode::Hallucination => "hallucination",
            FailureMode::OverAbstain => "over_abstain",
            FailureMode::Perfect => "perfect",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FailureMode::RetrievalMiss => "Retrieval Miss",
            FailureMode::ContextDilution => "Context Dilution",
            FailureMode::Hallucination => "Hallucination",
            FailureMode::OverAbstain => "Over-abstain",
            FailureMode::Perfect => "Perfect Answer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FailureMode::RetrievalMiss => "Relevant information not found",
            FailureMode::ContextDilution => "Too much irrelevant context",
            FailureMode::Hallucination => "Answer without evidence",
            FailureMode::OverAbstain => "Refused when evidence existed",
            FailureMode::Perfect => "Grounded and correctly cited",
        }
    }
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Histogram over every [`FailureMode`]; all five keys are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureCounts(BTreeMap<FailureMode, usize>);

impl FailureCounts {
    pub fn new() -> Self {
        Self(FailureMode::ALL.iter().map(|m| (*m, 0)).collect())
    }

    pub fn get(&self, mode: FailureMode) -> usize { self.0.get(&mode).copied().unwrap_or(0) }

    pub fn increment(&mut self, mode: FailureMode) { *self.0.entry(mode).or_insert(0) += 1; }

    pub fn total(&self) -> usize { self.0.values().sum() }

    pub fn iter(&self) -> impl Iterator<Item = (FailureMode, usize)> + '_ {
        self.0.iter().map(|(m, c)| (*m, *c))
    }
}

impl Default for FailureCounts {
    fn default() -> Self { Self::new() }
}

impl FromIterator<FailureMode> for FailureCounts {
    fn from_iter<I: IntoIterator<Item = FailureMode>>(iter: I) -> Self {
        let mut counts = Self::new();
        for mode in iter { counts.increment(mode); }
        counts
    }
}

/// Structured output of the answering step.
///
/// `citations` are 1-based positions into the ranked context, unique, in
/// order of first appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub abstained: bool,
    pub confidence: f32,
    pub citations: Vec<usize>,
}

impl AnswerResult {
    pub const NO_CONTEXT_ANSWER: &'static str = "I don't have enough information to answer this question.";

    /// The answer given when nothing was retrieved.
    pub fn no_context() -> Self {
        Self { answer: Self::NO_CONTEXT_ANSWER.to_string(), abstained: true, confidence: 0.0, citations: Vec::new() }
    }
}

/// One evaluated question under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub question: String,
    pub answer: String,
    pub abstained: bool,
    pub confidence: f32,
    pub citations: Vec<usize>,
    /// Top three retrieved chunks, kept for display and cost estimation.
    pub retrieved_chunks: Vec<RetrievedChunk>,
    pub failure_mode: FailureMode,
    /// Seconds spent on retrieval and answering.
    pub latency: f64,
    /// Set only when the oracle failed and the run records errors instead of aborting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub quality: u32,
    pub groundedness: u32,
    pub avg_cost: f64,
    pub avg_latency: f64,
    pub failure_counts: FailureCounts,
}

impl Metrics {
    pub fn zeroed() -> Self {
        Self { quality: 0, groundedness: 0, avg_cost: 0.0, avg_latency: 0.0, failure_counts: FailureCounts::new() }
    }
}

/// Advice for one failure mode: what went wrong, what to change, what it costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub problem: String,
    pub fixes: Vec<String>,
    pub tradeoff: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub documents: Vec<Document>,
    pub questions: Vec<String>,
    pub config: RagConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub results: Vec<EvaluationResult>,
    pub metrics: Metrics,
    pub baseline_metrics: Metrics,
    pub recommendations: Vec<Recommendation>,
}

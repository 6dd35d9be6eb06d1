//! Prompt assembly and the post-processing every text-producing backend shares:
//! citation extraction, confidence, and folding refusals into abstention.

use ragprobe_core::types::{AnswerResult, RetrievedChunk};

pub const REFUSAL_ANSWER: &str = "I don't have enough information to answer this reliably.";

/// Lowercase phrases that mark an answer as a refusal.
pub const ABSTAIN_PHRASES: [&str; 5] = [
    "don't have enough information",
    "cannot answer",
    "not enough context",
    "no information available",
    "unable to determine",
];

const STRICT_INSTRUCTION: &str = "You MUST cite sources using [N] format for every claim. If the evidence is insufficient, respond with 'I don't have enough information to answer this reliably.'";
const LENIENT_INSTRUCTION: &str = "Cite sources using [N] format when possible.";

/// `[i] (doc name): text` blocks, 1-based, separated by blank lines.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[{}] ({}): {}", i + 1, c.chunk.doc_name, c.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn system_prompt(strict_citations: bool) -> String {
    let instruction = if strict_citations { STRICT_INSTRUCTION } else { LENIENT_INSTRUCTION };
    format!(
        "You are a helpful assistant that answers questions based on the provided context.\n{instruction}\nOnly use information from the provided context. Do not make up information."
    )
}

pub fn user_prompt(question: &str, chunks: &[RetrievedChunk]) -> String {
    format!("Context:\n{}\n\nQuestion: {}\n\nAnswer:", format_context(chunks), question)
}

/// Unique `[N]` markers with `1 <= N <= max`, in order of first appearance.
pub fn extract_citations(answer: &str, max: usize) -> Vec<usize> {
    let mut citations = Vec::new();
    let mut rest = answer;
    while let Some(open) = rest.find('[') {
        rest = &rest[open + 1..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && rest.as_bytes().get(digits) == Some(&b']') {
            if let Ok(n) = rest[..digits].parse::<usize>() {
                if (1..=max).contains(&n) && !citations.contains(&n) {
                    citations.push(n);
                }
            }
        }
    }
    citations
}

/// Half citation coverage (against at most three sources), half the mean
/// retrieval score of the top three slots. Missing slots count as zero.
pub fn confidence(citation_count: usize, chunks: &[RetrievedChunk]) -> f32 {
    if chunks.is_empty() {
        return 0.0;
    }
    let coverage = citation_count as f32 / chunks.len().min(3) as f32;
    let top_three: f32 = chunks.iter().take(3).map(|c| c.score).sum::<f32>() / 3.0;
    (coverage * 0.5 + top_three * 0.5).clamp(0.0, 1.0)
}

pub fn is_refusal(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    ABSTAIN_PHRASES.iter().any(|p| lower.contains(p))
}

/// Turn raw model text into an [`AnswerResult`].
///
/// Refusals and answers below `abstain_threshold` become the canonical
/// refusal with no citations; the computed confidence is kept.
pub fn finalize(raw_answer: &str, chunks: &[RetrievedChunk], abstain_threshold: f32) -> AnswerResult {
    let citations = extract_citations(raw_answer, chunks.len());
    let confidence = confidence(citations.len(), chunks);

    if is_refusal(raw_answer) || confidence < abstain_threshold {
        return AnswerResult { answer: REFUSAL_ANSWER.to_string(), abstained: true, confidence, citations: Vec::new() };
    }
    AnswerResult { answer: raw_answer.to_string(), abstained: false, confidence, citations }
}

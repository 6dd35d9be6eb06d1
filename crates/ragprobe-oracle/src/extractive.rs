use ragprobe_core::error::OracleError;
use ragprobe_core::traits::{AnsweringOracle, OracleRequest};
use ragprobe_core::types::AnswerResult;
use ragprobe_text::{keyword_score, query_terms};

use crate::grounding::finalize;

const MAX_CITED: usize = 3;
const MAX_SENTENCE_CHARS: usize = 200;
const NO_MATCH_ANSWER: &str = "I cannot answer this from the provided context.";

/// Offline oracle: quotes the leading sentence of each retrieved chunk that
/// shares a query term, citing up to three of them. Runs through the same
/// post-processing as hosted backends, so thresholds apply identically.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractiveOracle;

impl ExtractiveOracle {
    pub fn new() -> Self { Self }
}

impl AnsweringOracle for ExtractiveOracle {
    fn name(&self) -> &str { "extractive" }

    fn answer(&self, request: &OracleRequest<'_>) -> Result<AnswerResult, OracleError> {
        let terms = query_terms(request.question);
        let quoted: Vec<String> = request
            .chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| keyword_score(&terms, &c.chunk.text) > 0.0)
            .take(MAX_CITED)
            .map(|(i, c)| format!("{} [{}]", first_sentence(&c.chunk.text), i + 1))
            .collect();

        let raw = if quoted.is_empty() { NO_MATCH_ANSWER.to_string() } else { quoted.join(" ") };
        Ok(finalize(&raw, request.chunks, request.abstain_threshold))
    }
}

fn first_sentence(text: &str) -> String {
    let trimmed = text.trim();
    let sentence = match trimmed.find('.') {
        Some(dot) => &trimmed[..=dot],
        None => trimmed,
    };
    sentence.chars().take(MAX_SENTENCE_CHARS).collect()
}

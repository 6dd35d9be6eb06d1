use ragprobe_core::types::{AnswerResult, FailureMode, RetrievedChunk};

const OVER_ABSTAIN_SCORE: f32 = 0.5;
const HALLUCINATION_MIN_CHARS: usize = 50;
const MISS_SCORE: f32 = 0.3;
const DILUTION_MIN_CHUNKS: usize = 5;
const DILUTION_TAIL_SCORE: f32 = 0.4;
const PERFECT_SCORE: f32 = 0.4;

/// Label one answer. Rules are checked in order and the first match wins;
/// anything unmatched is a retrieval miss.
///
/// `retrieved` is the full ranked list the oracle saw, best first.
pub fn classify(answer: &AnswerResult, retrieved: &[RetrievedChunk]) -> FailureMode {
    let top_score = retrieved.first().map_or(0.0, |c| c.score);
    let cited = !answer.citations.is_empty();

    if answer.abstained && !retrieved.is_empty() && top_score > OVER_ABSTAIN_SCORE {
        return FailureMode::OverAbstain;
    }
    if !answer.abstained && !cited && answer.answer.chars().count() > HALLUCINATION_MIN_CHARS {
        return FailureMode::Hallucination;
    }
    if top_score < MISS_SCORE {
        return FailureMode::RetrievalMiss;
    }
    if retrieved.len() >= DILUTION_MIN_CHUNKS {
        let weak_tail = retrieved[2..].iter().filter(|c| c.score < DILUTION_TAIL_SCORE).count();
        if weak_tail >= retrieved.len() - 2 {
            return FailureMode::ContextDilution;
        }
    }
    if cited && top_score > PERFECT_SCORE && !answer.abstained {
        return FailureMode::Perfect;
    }
    FailureMode::RetrievalMiss
}

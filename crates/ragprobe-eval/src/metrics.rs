//! Batch metrics and the current-versus-baseline comparison.

use serde::{Deserialize, Serialize};

use ragprobe_core::types::{EvaluationResult, Metrics};

/// Blended price per million tokens, in dollars.
pub const COST_PER_MILLION_TOKENS: f64 = 0.10;
const TOKENS_PER_WORD: f64 = 1.3;

/// Rough token count: 1.3 per whitespace-separated word. Empty text counts as one word.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count().max(1);
    (words as f64 * TOKENS_PER_WORD).ceil() as usize
}

fn result_tokens(result: &EvaluationResult) -> usize {
    let context: usize = result.retrieved_chunks.iter().map(|c| estimate_tokens(&c.chunk.text)).sum();
    context + estimate_tokens(&result.answer)
}

fn percent(count: usize, total: usize) -> u32 {
    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Reduce a batch to summary metrics. An empty batch gives [`Metrics::zeroed`].
pub fn aggregate(results: &[EvaluationResult]) -> Metrics {
    if results.is_empty() {
        return Metrics::zeroed();
    }
    let total = results.len();
    let answered_and_cited = results.iter().filter(|r| !r.abstained && !r.citations.is_empty()).count();
    let cited = results.iter().filter(|r| !r.citations.is_empty()).count();
    let avg_tokens = results.iter().map(result_tokens).sum::<usize>() as f64 / total as f64;

    Metrics {
        quality: percent(answered_and_cited, total),
        groundedness: percent(cited, total),
        avg_cost: avg_tokens / 1_000_000.0 * COST_PER_MILLION_TOKENS,
        avg_latency: results.iter().map(|r| r.latency).sum::<f64>() / total as f64,
        failure_counts: results.iter().map(|r| r.failure_mode).collect(),
    }
}

/// One metric next to its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub value: f64,
    pub diff: f64,
    pub better: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsComparison {
    pub quality: MetricDelta,
    pub groundedness: MetricDelta,
    /// `diff` is a relative change in percent; zero when the baseline cost is zero.
    pub avg_cost: MetricDelta,
    pub avg_latency: MetricDelta,
}

/// Compare `current` with `baseline`. Higher quality and groundedness are
/// better, lower cost and latency are better; ties count as better.
pub fn compare(current: &Metrics, baseline: &Metrics) -> MetricsComparison {
    let cost_diff = if baseline.avg_cost == 0.0 {
        0.0
    } else {
        (current.avg_cost - baseline.avg_cost) / baseline.avg_cost * 100.0
    };
    MetricsComparison {
        quality: MetricDelta {
            value: f64::from(current.quality),
            diff: f64::from(current.quality) - f64::from(baseline.quality),
            better: current.quality >= baseline.quality,
        },
        groundedness: MetricDelta {
            value: f64::from(current.groundedness),
            diff: f64::from(current.groundedness) - f64::from(baseline.groundedness),
            better: current.groundedness >= baseline.groundedness,
        },
        avg_cost: MetricDelta { value: current.avg_cost, diff: cost_diff, better: current.avg_cost <= baseline.avg_cost },
        avg_latency: MetricDelta {
            value: current.avg_latency,
            diff: current.avg_latency - baseline.avg_latency,
            better: current.avg_latency <= baseline.avg_latency,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_tokens("one two three"), 4);
        assert_eq!(estimate_tokens("ten"), 2);
        assert_eq!(estimate_tokens(""), 2);
    }

    #[test]
    fn empty_batch_is_zeroed() {
        let m = aggregate(&[]);
        assert_eq!(m, Metrics::zeroed());
        assert_eq!(m.failure_counts.total(), 0);
        assert_eq!(m.failure_counts.iter().count(), 5);
    }

    #[test]
    fn cost_diff_is_relative() {
        let mut current = Metrics::zeroed();
        let mut baseline = Metrics::zeroed();
        current.avg_cost = 3.0;
        baseline.avg_cost = 2.0;
        current.quality = 40;
        baseline.quality = 60;
        let cmp = compare(&current, &baseline);
        assert_eq!(cmp.avg_cost.diff, 50.0);
        assert!(!cmp.avg_cost.better);
        assert_eq!(cmp.quality.diff, -20.0);
        assert!(!cmp.quality.better);
        assert!(cmp.avg_latency.better, "equal latency counts as better");
    }

    #[test]
    fn zero_baseline_cost_has_no_relative_change() {
        let mut current = Metrics::zeroed();
        current.avg_cost = 1.0;
        assert_eq!(compare(&current, &Metrics::zeroed()).avg_cost.diff, 0.0);
    }
}

//! Human-readable and JSON renderings of command output.

use std::fmt;

use serde::Serialize;

use ragprobe_core::types::{Chunk, EvaluationResponse, FailureMode, RagConfig, RetrievedChunk, SearchType};
use ragprobe_eval::{MetricDelta, MetricsComparison};

const PREVIEW_CHARS: usize = 160;

/// Everything `evaluate` reports.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    pub config: &'a RagConfig,
    pub comparison: MetricsComparison,
    #[serde(flatten)]
    pub response: &'a EvaluationResponse,
}

fn preview(text: &str) -> String {
    let mut short: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        short.push_str("...");
    }
    short
}

fn mark(delta: &MetricDelta) -> &'static str {
    if delta.better { "✅" } else { "⚠️" }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.config;
        let m = &self.response.metrics;
        let b = &self.response.baseline_metrics;
        let cmp = &self.comparison;

        writeln!(f, "📊 RAG evaluation")?;
        writeln!(
            f,
            "Config: chunk {} chars ({}% overlap), {} search, top-{}, abstain < {}, strict citations {}",
            c.chunk_size,
            c.chunk_overlap,
            c.search_type,
            c.top_k,
            c.abstain_threshold,
            if c.strict_citations { "on" } else { "off" }
        )?;
        writeln!(f)?;
        writeln!(f, "{:<14} {:>12} {:>12} {:>12}", "metric", "yours", "baseline", "diff")?;
        writeln!(f, "{:<14} {:>11}% {:>11}% {:>+12.0} {}", "quality", m.quality, b.quality, cmp.quality.diff, mark(&cmp.quality))?;
        writeln!(
            f,
            "{:<14} {:>11}% {:>11}% {:>+12.0} {}",
            "groundedness", m.groundedness, b.groundedness, cmp.groundedness.diff, mark(&cmp.groundedness)
        )?;
        writeln!(
            f,
            "{:<14} {:>12.8} {:>12.8} {:>+11.1}% {}",
            "avg cost ($)", m.avg_cost, b.avg_cost, cmp.avg_cost.diff, mark(&cmp.avg_cost)
        )?;
        writeln!(
            f,
            "{:<14} {:>11.2}s {:>11.2}s {:>+11.2}s {}",
            "avg latency", m.avg_latency, b.avg_latency, cmp.avg_latency.diff, mark(&cmp.avg_latency)
        )?;

        writeln!(f, "\nFailure modes:")?;
        for mode in FailureMode::ALL {
            writeln!(
                f,
                "  {:<18} {:>3}  (baseline {:>3})  {}",
                mode.label(),
                m.failure_counts.get(mode),
                b.failure_counts.get(mode),
                mode.description()
            )?;
        }

        if self.response.recommendations.is_empty() {
            writeln!(f, "\n✅ No recommendations")?;
        } else {
            writeln!(f, "\n💡 Recommendations:")?;
            for rec in &self.response.recommendations {
                writeln!(f, "  ⚠️  {}", rec.problem)?;
                for fix in &rec.fixes {
                    writeln!(f, "     - {fix}")?;
                }
                writeln!(f, "     tradeoff: {}", rec.tradeoff)?;
            }
        }

        writeln!(f, "\nQuestions:")?;
        for (i, r) in self.response.results.iter().enumerate() {
            writeln!(
                f,
                "\n  {}. [{}] {}  (confidence {:.2}, {:.2}s)",
                i + 1,
                r.failure_mode,
                r.question,
                r.confidence,
                r.latency
            )?;
            writeln!(f, "     📝 {}", preview(&r.answer))?;
            if !r.citations.is_empty() {
                let cited: Vec<String> = r.citations.iter().map(|n| format!("[{n}]")).collect();
                writeln!(f, "     cites {}", cited.join(" "))?;
            }
            if let Some(err) = &r.error {
                writeln!(f, "     ❌ {err}")?;
            }
        }
        Ok(())
    }
}

/// Text listing for `chunk`.
pub struct ChunkListing<'a>(pub &'a [Chunk]);

impl fmt::Display for ChunkListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.0 {
            writeln!(f, "{}  {}..{}  ({} chars)", chunk.id, chunk.start, chunk.end, chunk.text.chars().count())?;
            writeln!(f, "  {}", preview(&chunk.text))?;
        }
        write!(f, "📊 {} chunks", self.0.len())
    }
}

/// Text listing for `search`.
pub struct HitListing<'a> {
    pub query: &'a str,
    pub search_type: SearchType,
    pub hits: &'a [RetrievedChunk],
}

impl fmt::Display for HitListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "🔍 Found {} results for \"{}\" ({} search)", self.hits.len(), self.query, self.search_type)?;
        for (i, hit) in self.hits.iter().enumerate() {
            writeln!(f, "\n  {}. score={:.4}  id={}  doc={}", i + 1, hit.score, hit.chunk.id, hit.chunk.doc_name)?;
            writeln!(f, "     📝 {}", preview(&hit.chunk.text))?;
        }
        Ok(())
    }
}

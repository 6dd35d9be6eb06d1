use ragprobe_core::types::{FailureCounts, FailureMode, RagConfig, Recommendation, SearchType};

const MAX_TOP_K: usize = 8;
const MIN_TOP_K: usize = 3;
const OVER_ABSTAIN_TOP_K: usize = 5;
const SMALL_CHUNK_SIZE: usize = 500;
const STRICT_THRESHOLD: f32 = 0.6;
const RELAXED_THRESHOLD: f32 = 0.4;

fn plural(count: usize, singular: &str, suffix: &str) -> String {
    if count > 1 {
        format!("{count} {singular}{suffix}")
    } else {
        format!("{count} {singular}")
    }
}

fn retrieval_miss_fixes(config: &RagConfig) -> Vec<String> {
    let mut fixes = Vec::new();
    match config.search_type {
        SearchType::Semantic => fixes.push("Switch to Hybrid search (combines semantic + keyword)".to_string()),
        SearchType::Keyword => {
            fixes.push("Switch to Hybrid or Semantic search for better context understanding".to_string())
        }
        SearchType::Hybrid => {}
    }
    if config.top_k < MAX_TOP_K {
        fixes.push(format!("Increase Top-K from {} to {MAX_TOP_K} to retrieve more chunks", config.top_k));
    }
    if config.chunk_size > SMALL_CHUNK_SIZE {
        fixes.push("Reduce chunk size to capture more specific context".to_string());
    }
    fixes
}

fn context_dilution_fixes(config: &RagConfig) -> Vec<String> {
    let mut fixes = Vec::new();
    if config.chunk_size > SMALL_CHUNK_SIZE {
        fixes.push(format!("Reduce chunk size from {} to {SMALL_CHUNK_SIZE} chars", config.chunk_size));
    }
    if config.top_k > MIN_TOP_K {
        fixes.push(format!("Decrease Top-K from {} to {MIN_TOP_K} chunks", config.top_k));
    }
    if config.search_type != SearchType::Semantic {
        fixes.push("Use pure Semantic search (more precise)".to_string());
    }
    fixes
}

fn hallucination_fixes(config: &RagConfig) -> Vec<String> {
    let mut fixes = Vec::new();
    if !config.strict_citations {
        fixes.push("Enable Strict Citations mode".to_string());
    }
    if config.abstain_threshold < STRICT_THRESHOLD {
        fixes.push(format!("Increase Abstain Threshold from {} to {STRICT_THRESHOLD}", config.abstain_threshold));
    }
    if config.search_type != SearchType::Hybrid {
        fixes.push("Use Hybrid search for better grounding".to_string());
    }
    fixes
}

fn over_abstain_fixes(config: &RagConfig) -> Vec<String> {
    let mut fixes = Vec::new();
    if config.abstain_threshold > RELAXED_THRESHOLD {
        fixes.push(format!("Lower Abstain Threshold from {} to {RELAXED_THRESHOLD}", config.abstain_threshold));
    }
    if config.top_k < OVER_ABSTAIN_TOP_K {
        fixes.push("Increase Top-K to provide more evidence".to_string());
    }
    if config.search_type != SearchType::Hybrid {
        fixes.push("Switch to Hybrid search for better recall".to_string());
    }
    fixes
}

struct Rule {
    mode: FailureMode,
    noun: &'static str,
    plural_suffix: &'static str,
    fixes: fn(&RagConfig) -> Vec<String>,
    tradeoff: &'static str,
}

const RULES: [Rule; 4] = [
    Rule {
        mode: FailureMode::RetrievalMiss,
        noun: "retrieval miss",
        plural_suffix: "es",
        fixes: retrieval_miss_fixes,
        tradeoff: "Higher Top-K = +50% cost, +0.3s latency",
    },
    Rule {
        mode: FailureMode::ContextDilution,
        noun: "context dilution issue",
        plural_suffix: "s",
        fixes: context_dilution_fixes,
        tradeoff: "Smaller chunks = may miss context across boundaries",
    },
    Rule {
        mode: FailureMode::Hallucination,
        noun: "hallucination",
        plural_suffix: "s",
        fixes: hallucination_fixes,
        tradeoff: "Higher threshold = more \"I don't know\" answers",
    },
    Rule {
        mode: FailureMode::OverAbstain,
        noun: "over-abstention",
        plural_suffix: "s",
        fixes: over_abstain_fixes,
        tradeoff: "Lower threshold = risk of less confident answers",
    },
];

/// Suggest configuration changes for each failure mode that occurred.
///
/// Modes are visited in the order retrieval miss, context dilution,
/// hallucination, over-abstain. A mode with no applicable fix for `config`
/// produces nothing.
pub fn recommend(counts: &FailureCounts, config: &RagConfig) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    for rule in &RULES {
        let count = counts.get(rule.mode);
        if count == 0 {
            continue;
        }
        let fixes = (rule.fixes)(config);
        if fixes.is_empty() {
            tracing::debug!(mode = %rule.mode, count, "no applicable fix");
            continue;
        }
        recommendations.push(Recommendation {
            problem: plural(count, rule.noun, rule.plural_suffix),
            fixes,
            tradeoff: rule.tradeoff.to_string(),
        });
    }
    recommendations
}

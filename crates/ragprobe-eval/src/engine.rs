//! The evaluation pipeline: chunk, embed, retrieve, answer and classify each
//! question, once with the requested configuration and once with the baseline.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use ragprobe_core::chunker::chunk_documents;
use ragprobe_core::config::{EvalSettings, OracleErrorPolicy};
use ragprobe_core::error::{Error, Result};
use ragprobe_core::traits::{AnsweringOracle, OracleRequest, Vectorizer};
use ragprobe_core::types::{
    AnswerResult, Document, EvaluationRequest, EvaluationResponse, EvaluationResult, FailureCounts, FailureMode,
    RagConfig, RetrievedChunk,
};
use ragprobe_hybrid::HybridRetriever;
use ragprobe_text::KeywordSearch;
use ragprobe_vector::{embed_chunks, CosineSearch};

use crate::classifier::classify;
use crate::metrics::aggregate;
use crate::recommendations::recommend;

/// Retrieved chunks kept on each result.
pub const DISPLAY_CHUNKS: usize = 3;

/// Which of the two runs a pass belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    User,
    Baseline,
}

impl Pass {
    pub fn as_str(self) -> &'static str {
        match self {
            Pass::User => "user",
            Pass::Baseline => "baseline",
        }
    }
}

/// Hooks for reporting progress. Every method defaults to doing nothing.
pub trait PassObserver {
    fn pass_started(&self, _pass: Pass, _questions: usize) {}
    fn question_finished(&self, _pass: Pass, _result: &EvaluationResult) {}
    fn pass_finished(&self, _pass: Pass) {}
}

impl PassObserver for () {}

/// Wall-clock budget shared by both passes. A zero budget never expires.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    fn new(budget_secs: u64) -> Self { Self { started: Instant::now(), budget: Duration::from_secs(budget_secs) } }

    fn check(&self) -> Result<()> {
        let elapsed = self.started.elapsed();
        if !self.budget.is_zero() && elapsed > self.budget {
            return Err(Error::Timeout { budget_secs: self.budget.as_secs(), elapsed_secs: elapsed.as_secs_f64() });
        }
        Ok(())
    }
}

/// Runs evaluations against an injected oracle and vectorizer.
pub struct Evaluator<'a> {
    oracle: &'a dyn AnsweringOracle,
    vectorizer: &'a dyn Vectorizer,
    retriever: HybridRetriever<KeywordSearch, CosineSearch>,
    settings: EvalSettings,
}

impl<'a> Evaluator<'a> {
    pub fn new(oracle: &'a dyn AnsweringOracle, vectorizer: &'a dyn Vectorizer, settings: EvalSettings) -> Self {
        Self { oracle, vectorizer, retriever: HybridRetriever::default(), settings }
    }

    /// Reject requests that cannot be evaluated, before any work is done.
    pub fn validate(&self, request: &EvaluationRequest) -> Result<()> {
        if request.documents.is_empty() {
            return Err(Error::InvalidInput("No documents provided".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = request.documents.iter().find(|d| !seen.insert(d.id.as_str())) {
            return Err(Error::InvalidInput(format!("Duplicate document id '{}'", dup.id)));
        }
        if request.questions.is_empty() {
            return Err(Error::InvalidInput("No questions provided".into()));
        }
        let (min, max) = (self.settings.min_questions, self.settings.max_questions);
        if !(min..=max).contains(&request.questions.len()) {
            return Err(Error::InvalidInput(format!(
                "Please provide between {min} and {max} questions (got {})",
                request.questions.len()
            )));
        }
        if let Some(i) = request.questions.iter().position(|q| q.trim().is_empty()) {
            return Err(Error::InvalidInput(format!("Question {} is empty", i + 1)));
        }
        request.config.validate()
    }

    pub fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResponse> {
        self.evaluate_with(request, &())
    }

    /// Validate, run the user pass then the baseline pass, and summarize.
    /// Recommendations are drawn from the user pass only, skipping results
    /// whose oracle call failed.
    pub fn evaluate_with(&self, request: &EvaluationRequest, observer: &dyn PassObserver) -> Result<EvaluationResponse> {
        self.validate(request)?;
        let deadline = Deadline::new(self.settings.max_duration_secs);

        let results = self.run_pass(Pass::User, &request.documents, &request.questions, &request.config, &deadline, observer)?;
        let baseline_results = self.run_pass(
            Pass::Baseline,
            &request.documents,
            &request.questions,
            &RagConfig::baseline(),
            &deadline,
            observer,
        )?;

        let metrics = aggregate(&results);
        let baseline_metrics = aggregate(&baseline_results);
        // An oracle outage says nothing about the configuration.
        let answered: FailureCounts = results.iter().filter(|r| r.error.is_none()).map(|r| r.failure_mode).collect();
        let recommendations = recommend(&answered, &request.config);
        let failures = answered.total() - answered.get(FailureMode::Perfect);
        if recommendations.is_empty() && failures > 0 {
            tracing::warn!("failures observed but no configuration change applies");
        }
        tracing::info!(
            quality = metrics.quality,
            baseline_quality = baseline_metrics.quality,
            recommendations = recommendations.len(),
            elapsed_secs = deadline.started.elapsed().as_secs_f64(),
            "evaluation finished"
        );

        Ok(EvaluationResponse { results, metrics, baseline_metrics, recommendations })
    }

    fn run_pass(
        &self,
        pass: Pass,
        documents: &[Document],
        questions: &[String],
        config: &RagConfig,
        deadline: &Deadline,
        observer: &dyn PassObserver,
    ) -> Result<Vec<EvaluationResult>> {
        let chunks = chunk_documents(documents, config.chunk_size, config.overlap_chars());
        let chunks = embed_chunks(self.vectorizer, chunks);
        tracing::info!(
            pass = pass.as_str(),
            chunks = chunks.len(),
            chunk_size = config.chunk_size,
            search_type = %config.search_type,
            top_k = config.top_k,
            "starting pass"
        );
        observer.pass_started(pass, questions.len());

        let mut results = Vec::with_capacity(questions.len());
        for question in questions {
            deadline.check()?;
            let started = Instant::now();

            let query_vec = self.vectorizer.embed(question);
            let retrieved =
                self.retriever.retrieve(question, &query_vec, &chunks, config.search_type, config.top_k);
            let (answer, error) = self.answer(question, &retrieved, config)?;
            let failure_mode = classify(&answer, &retrieved);

            let result = EvaluationResult {
                question: question.clone(),
                answer: answer.answer,
                abstained: answer.abstained,
                confidence: answer.confidence,
                citations: answer.citations,
                retrieved_chunks: for_display(retrieved),
                failure_mode,
                latency: started.elapsed().as_secs_f64(),
                error,
            };
            tracing::debug!(
                pass = pass.as_str(),
                question = %result.question,
                %failure_mode,
                confidence = result.confidence,
                citations = result.citations.len(),
                latency = result.latency,
                "question evaluated"
            );
            observer.question_finished(pass, &result);
            results.push(result);
        }

        observer.pass_finished(pass);
        Ok(results)
    }

    /// Ask the oracle, or abstain outright when nothing was retrieved. Under
    /// the `record` policy a failed call becomes an empty abstention carrying
    /// the error text.
    fn answer(
        &self,
        question: &str,
        retrieved: &[RetrievedChunk],
        config: &RagConfig,
    ) -> Result<(AnswerResult, Option<String>)> {
        if retrieved.is_empty() {
            return Ok((AnswerResult::no_context(), None));
        }
        let request = OracleRequest {
            question,
            chunks: retrieved,
            strict_citations: config.strict_citations,
            abstain_threshold: config.abstain_threshold,
        };
        match self.oracle.answer(&request) {
            Ok(answer) => Ok((answer, None)),
            Err(source) => match self.settings.on_oracle_error {
                OracleErrorPolicy::Abort => Err(Error::Oracle { question: question.to_string(), source }),
                OracleErrorPolicy::Record => {
                    tracing::warn!(oracle = self.oracle.name(), %question, error = %source, "oracle failed; recording");
                    let failed =
                        AnswerResult { answer: String::new(), abstained: true, confidence: 0.0, citations: Vec::new() };
                    Ok((failed, Some(source.to_string())))
                }
            },
        }
    }
}

/// Top chunks without their vectors.
fn for_display(retrieved: Vec<RetrievedChunk>) -> Vec<RetrievedChunk> {
    retrieved
        .into_iter()
        .take(DISPLAY_CHUNKS)
        .map(|mut hit| {
            hit.chunk.vector = None;
            hit
        })
        .collect()
}

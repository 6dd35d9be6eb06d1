use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use ragprobe_core::config::{EvalSettings, OracleErrorPolicy};
use ragprobe_core::error::{Error, OracleError};
use ragprobe_core::traits::{AnsweringOracle, OracleRequest};
use ragprobe_core::types::{
    AnswerResult, Document, EvaluationRequest, EvaluationResult, FailureMode, RagConfig, SearchType,
};
use ragprobe_embed::BagOfWordsVectorizer;
use ragprobe_eval::{Evaluator, Pass, PassObserver};
use ragprobe_oracle::{finalize, ExtractiveOracle};

fn corpus() -> Vec<Document> {
    vec![
        Document::new(
            "paper",
            "paper.txt",
            "The research method uses data analysis over public records. The study found that model \
             performance improved with more data. Limitations of the approach include a small sample \
             and a single region. Future work will extend the evaluation to other regions and add a \
             second model. The conclusion is that the process is reliable for this kind of data.",
        ),
        Document::new(
            "notes",
            "notes.md",
            "Design notes for the system. The implementation stores information in plain files. \
             Quality checks run after each development step and the findings are logged.",
        ),
    ]
}

fn questions() -> Vec<String> {
    vec![
        "What method does the research use?".to_string(),
        "What are the limitations of the approach?".to_string(),
        "What future work is planned?".to_string(),
    ]
}

fn request(config: RagConfig) -> EvaluationRequest {
    EvaluationRequest { documents: corpus(), questions: questions(), config }
}

/// Always cites the first chunk.
struct CitingOracle {
    calls: AtomicUsize,
}

impl CitingOracle {
    fn new() -> Self { Self { calls: AtomicUsize::new(0) } }
}

impl AnsweringOracle for CitingOracle {
    fn name(&self) -> &str { "citing" }

    fn answer(&self, request: &OracleRequest<'_>) -> Result<AnswerResult, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(finalize("According to the first source [1].", request.chunks, request.abstain_threshold))
    }
}

struct FailingOracle;

impl AnsweringOracle for FailingOracle {
    fn name(&self) -> &str { "failing" }

    fn answer(&self, _request: &OracleRequest<'_>) -> Result<AnswerResult, OracleError> {
        Err(OracleError::Status { provider: "failing".into(), status: 503, body: "overloaded".into() })
    }
}

struct SlowOracle;

impl AnsweringOracle for SlowOracle {
    fn name(&self) -> &str { "slow" }

    fn answer(&self, request: &OracleRequest<'_>) -> Result<AnswerResult, OracleError> {
        thread::sleep(Duration::from_millis(1100));
        Ok(finalize("Slow [1].", request.chunks, 0.0))
    }
}

#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<(Pass, usize)>>,
    finished: RefCell<usize>,
}

impl PassObserver for Recorder {
    fn pass_started(&self, pass: Pass, questions: usize) { self.events.borrow_mut().push((pass, questions)); }

    fn question_finished(&self, _pass: Pass, _result: &EvaluationResult) { *self.finished.borrow_mut() += 1; }
}

#[test]
fn rejects_invalid_requests_up_front() {
    let oracle = CitingOracle::new();
    let vectorizer = BagOfWordsVectorizer::new();
    let evaluator = Evaluator::new(&oracle, &vectorizer, EvalSettings::default());

    let no_docs = EvaluationRequest { documents: Vec::new(), ..request(RagConfig::baseline()) };
    assert!(matches!(evaluator.evaluate(&no_docs), Err(Error::InvalidInput(m)) if m.contains("documents")));

    let no_questions = EvaluationRequest { questions: Vec::new(), ..request(RagConfig::baseline()) };
    assert!(matches!(evaluator.evaluate(&no_questions), Err(Error::InvalidInput(m)) if m.contains("questions")));

    let two = EvaluationRequest { questions: questions()[..2].to_vec(), ..request(RagConfig::baseline()) };
    assert!(matches!(evaluator.evaluate(&two), Err(Error::InvalidInput(_))));

    let many = EvaluationRequest { questions: vec!["What is the method?".to_string(); 21], ..request(RagConfig::baseline()) };
    assert!(matches!(evaluator.evaluate(&many), Err(Error::InvalidInput(_))));

    let mut clash = request(RagConfig::baseline());
    clash.documents.push(Document::new("paper", "paper.md", "Another paper with the same id."));
    assert!(matches!(evaluator.evaluate(&clash), Err(Error::InvalidInput(m)) if m.contains("paper")));

    let bad_config = request(RagConfig { top_k: 4, ..RagConfig::baseline() });
    assert!(matches!(evaluator.evaluate(&bad_config), Err(Error::InvalidConfig(_))));

    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0, "nothing runs before validation passes");
}

#[test]
fn both_passes_cover_every_question() {
    let oracle = ExtractiveOracle::new();
    let vectorizer = BagOfWordsVectorizer::new();
    let evaluator = Evaluator::new(&oracle, &vectorizer, EvalSettings::default());
    let config = RagConfig { chunk_size: 300, search_type: SearchType::Hybrid, top_k: 3, ..RagConfig::baseline() };

    let recorder = Recorder::default();
    let response = evaluator.evaluate_with(&request(config), &recorder).unwrap();

    assert_eq!(*recorder.events.borrow(), [(Pass::User, 3), (Pass::Baseline, 3)]);
    assert_eq!(*recorder.finished.borrow(), 6);
    assert_eq!(response.results.len(), 3);
    assert_eq!(response.metrics.failure_counts.total(), 3);
    assert_eq!(response.baseline_metrics.failure_counts.total(), 3);
    assert_eq!(response.metrics.failure_counts.iter().count(), 5);

    for result in &response.results {
        assert!(result.retrieved_chunks.len() <= 3);
        assert!(result.retrieved_chunks.iter().all(|c| c.chunk.vector.is_none()));
        assert!(result.citations.iter().all(|n| (1..=3).contains(n)));
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!(result.latency >= 0.0);
        assert!(result.error.is_none());
    }
}

#[test]
fn nothing_to_retrieve_abstains_without_calling_the_oracle() {
    let oracle = CitingOracle::new();
    let vectorizer = BagOfWordsVectorizer::new();
    let evaluator = Evaluator::new(&oracle, &vectorizer, EvalSettings::default());
    let request = EvaluationRequest {
        documents: vec![Document::new("blank", "blank.txt", "")],
        questions: questions(),
        config: RagConfig::baseline(),
    };

    let response = evaluator.evaluate(&request).unwrap();
    for result in &response.results {
        assert!(result.abstained);
        assert_eq!(result.confidence, 0.0);
        assert!(result.citations.is_empty());
        assert!(result.retrieved_chunks.is_empty());
        assert_eq!(result.failure_mode, FailureMode::RetrievalMiss);
        assert_eq!(result.answer, AnswerResult::NO_CONTEXT_ANSWER);
    }
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    assert_eq!(response.metrics.quality, 0);
    assert_eq!(response.metrics.failure_counts.get(FailureMode::RetrievalMiss), 3);
}

#[test]
fn oracle_errors_abort_by_default() {
    let vectorizer = BagOfWordsVectorizer::new();
    let evaluator = Evaluator::new(&FailingOracle, &vectorizer, EvalSettings::default());

    match evaluator.evaluate(&request(RagConfig::baseline())) {
        Err(Error::Oracle { question, source: OracleError::Status { status, .. } }) => {
            assert_eq!(question, questions()[0]);
            assert_eq!(status, 503);
        }
        other => panic!("expected an oracle error, got {other:?}"),
    }
}

#[test]
fn oracle_errors_can_be_recorded() {
    let vectorizer = BagOfWordsVectorizer::new();
    let settings = EvalSettings { on_oracle_error: OracleErrorPolicy::Record, ..EvalSettings::default() };
    let evaluator = Evaluator::new(&FailingOracle, &vectorizer, settings);

    let response = evaluator.evaluate(&request(RagConfig::baseline())).unwrap();
    assert_eq!(response.results.len(), 3);
    for result in &response.results {
        assert!(result.abstained);
        assert_eq!(result.confidence, 0.0);
        assert!(result.citations.is_empty());
        assert!(result.error.as_deref().is_some_and(|e| e.contains("503")));
    }
    assert_eq!(response.metrics.groundedness, 0);
    assert_eq!(response.metrics.failure_counts.total(), 3);
    assert!(response.recommendations.is_empty(), "an outage is not a configuration problem");
}

#[test]
fn citing_oracle_counts_as_grounded() {
    let oracle = CitingOracle::new();
    let vectorizer = BagOfWordsVectorizer::new();
    let evaluator = Evaluator::new(&oracle, &vectorizer, EvalSettings::default());
    let config = RagConfig { abstain_threshold: 0.0, ..RagConfig::baseline() };

    let response = evaluator.evaluate(&request(config)).unwrap();
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 6);
    assert_eq!(response.metrics.groundedness, 100);
    assert_eq!(response.metrics.quality, 100);
    assert!(response.metrics.avg_cost > 0.0);
    assert!(response.results.iter().all(|r| r.citations == [1]));
}

#[test]
fn budget_overrun_fails_the_run() {
    let vectorizer = BagOfWordsVectorizer::new();
    let settings = EvalSettings { max_duration_secs: 1, ..EvalSettings::default() };
    let evaluator = Evaluator::new(&SlowOracle, &vectorizer, settings);

    match evaluator.evaluate(&request(RagConfig::baseline())) {
        Err(Error::Timeout { budget_secs, elapsed_secs }) => {
            assert_eq!(budget_secs, 1);
            assert!(elapsed_secs > 1.0);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[test]
fn response_serializes_with_wire_names() {
    let oracle = ExtractiveOracle::new();
    let vectorizer = BagOfWordsVectorizer::new();
    let evaluator = Evaluator::new(&oracle, &vectorizer, EvalSettings::default());

    let response = evaluator.evaluate(&request(RagConfig::baseline())).unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert!(json["baselineMetrics"]["failureCounts"]["over_abstain"].is_u64());
    assert!(json["results"][0]["failureMode"].is_string());
    assert!(json["results"][0]["retrievedChunks"][0]["docName"].is_string());
    assert!(json["results"][0].get("error").is_none());
}

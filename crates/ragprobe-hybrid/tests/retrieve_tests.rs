use ragprobe_core::chunker::chunk_documents;
use ragprobe_core::traits::Vectorizer;
use ragprobe_core::types::{Chunk, Document, SearchType};
use ragprobe_embed::BagOfWordsVectorizer;
use ragprobe_hybrid::{retrieve, HybridRetriever, RRF_K};
use ragprobe_vector::embed_chunks;

fn indexed() -> (BagOfWordsVectorizer, Vec<Chunk>) {
    let docs = vec![
        Document::new("m", "methods.txt", "The research method and the study design are described in this section."),
        Document::new("l", "limits.txt", "Limitations include sample size; future work should extend the dataset."),
        Document::new("r", "routers.txt", "Routers in a network system forward data packets; this process uses routing tables."),
        Document::new("f", "findings.txt", "The main findings show improved performance of the model."),
    ];
    let vectorizer = BagOfWordsVectorizer::new();
    let chunks = embed_chunks(&vectorizer, chunk_documents(&docs, 500, 100));
    (vectorizer, chunks)
}

#[test]
fn every_strategy_respects_top_k_and_order() {
    let (vectorizer, chunks) = indexed();
    let query = "what method and study design";
    let q = vectorizer.embed(query);
    for strategy in [SearchType::Semantic, SearchType::Keyword, SearchType::Hybrid] {
        let hits = retrieve(query, &q, &chunks, strategy, 3);
        assert!(hits.len() <= 3, "{strategy}");
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score, "{strategy} not descending");
        }
        assert_eq!(hits[0].chunk.doc_id, "m", "{strategy} should rank methods first");
    }
}

#[test]
fn hybrid_scores_are_rrf_sums() {
    let (vectorizer, chunks) = indexed();
    let query = "routing data packets in the network system";
    let q = vectorizer.embed(query);
    let hits = retrieve(query, &q, &chunks, SearchType::Hybrid, 3);
    let max_possible = 2.0 / (RRF_K as f32 + 1.0);
    assert!(hits.iter().all(|h| h.score > 0.0 && h.score <= max_possible));
    assert_eq!(hits[0].chunk.doc_id, "r");
}

#[test]
fn retrieval_is_reproducible() {
    let (vectorizer, chunks) = indexed();
    let query = "future work and limitations";
    let q = vectorizer.embed(query);
    let engine = HybridRetriever::default();
    let first = engine.retrieve(query, &q, &chunks, SearchType::Hybrid, 3);
    let second = engine.retrieve(query, &q, &chunks, SearchType::Hybrid, 3);
    assert_eq!(first, second);
    let bits: Vec<u32> = first.iter().map(|h| h.score.to_bits()).collect();
    let again: Vec<u32> = second.iter().map(|h| h.score.to_bits()).collect();
    assert_eq!(bits, again);
}

#[test]
fn empty_chunk_set_retrieves_nothing() {
    let vectorizer = BagOfWordsVectorizer::new();
    let q = vectorizer.embed("anything at all");
    for strategy in [SearchType::Semantic, SearchType::Keyword, SearchType::Hybrid] {
        assert!(retrieve("anything at all", &q, &[], strategy, 5).is_empty());
    }
}

#[test]
fn same_named_files_stay_separate_in_hybrid() {
    let docs = vec![
        Document::new("a/notes.txt", "notes.txt", "The research method uses data analysis."),
        Document::new("b/notes.md", "notes.md", "The study method relies on interviews."),
    ];
    let vectorizer = BagOfWordsVectorizer::new();
    let chunks = embed_chunks(&vectorizer, chunk_documents(&docs, 500, 100));
    let q = vectorizer.embed("method");

    let hits = retrieve("method", &q, &chunks, SearchType::Hybrid, 5);
    assert_eq!(hits.len(), 2);
    let max_possible = 2.0 / (RRF_K as f32 + 1.0);
    assert!(hits.iter().all(|h| h.score <= max_possible));
    let mut doc_ids: Vec<_> = hits.iter().map(|h| h.chunk.doc_id.as_str()).collect();
    doc_ids.sort();
    assert_eq!(doc_ids, ["a/notes.txt", "b/notes.md"]);
}

use ragprobe_core::chunker::chunk_documents;
use ragprobe_core::traits::TextRetriever;
use ragprobe_core::types::Document;
use ragprobe_text::KeywordSearch;

fn corpus() -> Vec<Document> {
    vec![
        Document::new("fire", "fire.txt", "Firecraft basics: build a teepee of kindling and light it from below."),
        Document::new("net", "net.txt", "Computer networking uses routers and switches to move packets."),
        Document::new("water", "water.txt", "Boil water for one minute before drinking it."),
    ]
}

#[test]
fn keyword_full_flow() {
    let chunks = chunk_documents(&corpus(), 500, 100);
    let engine = KeywordSearch::new();

    let hits = engine.search("computer networking packets", &chunks, 2);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk.doc_id, "net");
    assert_eq!(hits[0].score, 1.0);
    assert!(hits[0].score >= hits[1].score);
}

#[test]
fn ties_keep_chunk_order_and_respect_k() {
    let chunks = chunk_documents(&corpus(), 500, 100);
    let hits = KeywordSearch::new().search("xyzzy", &chunks, 5);
    assert_eq!(hits.len(), 3, "k larger than the corpus returns everything");
    let ids: Vec<_> = hits.iter().map(|h| h.chunk.id.as_str()).collect();
    assert_eq!(ids, ["fire-0", "net-0", "water-0"]);
    assert!(hits.iter().all(|h| h.score == 0.0));
}

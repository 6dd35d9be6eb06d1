//! Character-window chunking with sentence/word boundary snapping.
//!
//! Offsets are counted in chars, so multi-byte text never splits a code point.

use crate::types::{Chunk, Document};

fn make_chunk(doc: &Document, ordinal: usize, text: &str, start: usize, end: usize) -> Chunk {
    Chunk {
        id: format!("{}-{}", doc.id, ordinal),
        text: text.to_string(),
        doc_id: doc.id.clone(),
        doc_name: doc.name.clone(),
        start,
        end,
        vector: None,
    }
}

/// Index of the last `needle` at or before `from`, like `lastIndexOf`.
fn last_index_of(chars: &[char], needle: char, from: usize) -> Option<usize> {
    let upper = from.min(chars.len().saturating_sub(1));
    chars[..=upper].iter().rposition(|c| *c == needle)
}

/// Split one document into overlapping chunks of at most `chunk_size` chars
/// (one more when the window ends exactly on a period).
///
/// A window end moves back to just after the last `.` when that lies past the
/// window midpoint, else to the last space past the midpoint. The next window
/// starts `overlap` chars before the previous end; when that would not move the
/// cursor forward the overlap is dropped for that step.
pub fn chunk_document(doc: &Document, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    let chars: Vec<char> = doc.text.chars().collect();
    let len = chars.len();

    if len == 0 {
        return Vec::new();
    }
    if len <= chunk_size {
        return vec![make_chunk(doc, 0, doc.text.trim(), 0, len)];
    }

    let midpoint = chunk_size as f64 * 0.5;
    let mut chunks = Vec::new();
    let mut position = 0usize;

    while position < len {
        let mut end = (position + chunk_size).min(len);

        if end < len {
            let threshold = position as f64 + midpoint;
            match last_index_of(&chars, '.', end) {
                Some(dot) if dot as f64 > threshold => end = dot + 1,
                _ => {
                    if let Some(space) = last_index_of(&chars, ' ', end) {
                        if space as f64 > threshold {
                            end = space;
                        }
                    }
                }
            }
        }

        let window: String = chars[position..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(make_chunk(doc, chunks.len(), trimmed, position, end));
        }

        if end >= len {
            break;
        }
        let next = end.saturating_sub(overlap);
        position = if next > position { next } else { end };
    }

    tracing::trace!(doc_id = %doc.id, chunks = chunks.len(), chunk_size, overlap, "chunked document");
    chunks
}

/// Chunk every document, preserving document order.
pub fn chunk_documents(docs: &[Document], chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    docs.iter().flat_map(|doc| chunk_document(doc, chunk_size, overlap)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document { Document::new("d1", "d1.txt", text) }

    /// Sentences of exactly 50 chars, each ending in a period.
    fn sentences(count: usize) -> String {
        let sentence = format!("{} {}.", "a".repeat(24), "b".repeat(24));
        assert_eq!(sentence.chars().count(), 50);
        sentence.repeat(count)
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_document(&doc(""), 500, 100).is_empty());
    }

    #[test]
    fn short_text_is_one_trimmed_chunk() {
        let chunks = chunk_document(&doc("  hello world.  "), 500, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello world.");
        assert_eq!(chunks[0].id, "d1-0");
        assert_eq!((chunks[0].start, chunks[0].end), (0, 16));
    }

    #[test]
    fn twelve_hundred_chars_make_three_chunks() {
        let text = sentences(24);
        assert_eq!(text.chars().count(), 1200);
        let chunks = chunk_document(&doc(&text), 500, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].start, 0);
        assert!((500..=520).contains(&chunks[0].end));
        assert!((400..=420).contains(&chunks[1].start));
        assert_eq!(chunks[2].end, 1200);
        for pair in chunks.windows(2) {
            let overlap = pair[0].end.saturating_sub(pair[1].start);
            assert!(overlap <= 100, "overlap {overlap} exceeds 100");
        }
    }

    #[test]
    fn ids_are_dense_per_document() {
        let text = sentences(30);
        let chunks = chunk_document(&doc(&text), 300, 60);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.id, format!("d1-{i}"));
        }
    }

    #[test]
    fn snaps_to_word_boundary_without_periods() {
        let text = "word ".repeat(200);
        let chunks = chunk_document(&doc(&text), 300, 0);
        // Every interior window ends on the space the cursor was snapped to.
        for c in &chunks[..chunks.len() - 1] {
            assert_eq!(text.chars().nth(c.end), Some(' '));
        }
    }

    #[test]
    fn terminates_when_overlap_exceeds_chunk_size() {
        let text = "x".repeat(2000);
        let chunks = chunk_document(&doc(&text), 300, 400);
        assert!(!chunks.is_empty());
        assert_eq!(chunks.last().map(|c| c.end), Some(2000));
    }

    #[test]
    fn multibyte_text_is_split_on_chars() {
        let text = "é".repeat(700);
        let chunks = chunk_document(&doc(&text), 300, 50);
        assert!(chunks.iter().all(|c| c.text.chars().all(|ch| ch == 'é')));
        assert_eq!(chunks.last().map(|c| c.end), Some(700));
    }

    #[test]
    fn windows_cover_text_and_overlap_stays_bounded() {
        let texts = [
            sentences(40),
            "lorem ipsum dolor sit amet ".repeat(60),
            "z".repeat(1500),
            "naïve café crème brûlée. ".repeat(50),
        ];
        let params = [(500, 100), (300, 150), (100, 60), (50, 50), (40, 35), (7, 3)];

        for text in &texts {
            let len = text.chars().count();
            for (size, overlap) in params {
                let chunks = chunk_document(&doc(text), size, overlap);
                let label = format!("len {len}, size {size}, overlap {overlap}");
                assert_eq!(chunks.first().map(|c| c.start), Some(0), "{label}");
                assert_eq!(chunks.last().map(|c| c.end), Some(len), "{label}");
                for pair in chunks.windows(2) {
                    let (prev, next) = (&pair[0], &pair[1]);
                    assert!(next.start > prev.start, "{label}: no progress");
                    assert!(next.start <= prev.end, "{label}: gap {}..{}", prev.end, next.start);
                    assert!(prev.end - next.start <= overlap, "{label}: overlap {}", prev.end - next.start);
                }
            }
        }
    }

    #[test]
    fn chunk_documents_keeps_document_order() {
        let a = Document::new("a", "a.txt", sentences(20));
        let b = Document::new("b", "b.txt", "short");
        let chunks = chunk_documents(&[a, b], 500, 100);
        assert_eq!(chunks.last().map(|c| c.id.as_str()), Some("b-0"));
        assert!(chunks.iter().take(chunks.len() - 1).all(|c| c.doc_id == "a"));
    }
}

// Reciprocal Rank Fusion (RRF)

use std::collections::HashMap;

use ragprobe_core::types::RetrievedChunk;

/// Standard RRF k parameter (Cormack, Clarke and Buettcher, SIGIR 2009).
pub const RRF_K: usize = 60;

/// Merge ranked lists by summing `1 / (k + rank + 1)` per list a chunk
/// appears in (`rank` 0-based). Original per-list scores are discarded.
///
/// Ties keep first-appearance order: the first list's entries, then entries
/// only seen in later lists. Scores are accumulated in a `Vec` so the result
/// never depends on hash iteration order.
pub fn reciprocal_rank_fusion(lists: &[&[RetrievedChunk]], k: usize, limit: usize) -> Vec<RetrievedChunk> {
    let mut fused: Vec<RetrievedChunk> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for list in lists {
        for (rank, hit) in list.iter().enumerate() {
            let contribution = 1.0 / (k + rank + 1) as f32;
            match position.get(hit.chunk.id.as_str()) {
                Some(&i) => fused[i].score += contribution,
                None => {
                    position.insert(hit.chunk.id.as_str(), fused.len());
                    fused.push(RetrievedChunk::new(hit.chunk.clone(), contribution));
                }
            }
        }
    }

    fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    fused.truncate(limit);
    fused
}

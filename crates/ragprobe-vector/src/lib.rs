//! Dense-vector side of retrieval: cosine scoring over in-memory chunks and
//! attaching vectors to chunks.

pub mod embed_backfill;
pub mod search;
pub mod similarity;

pub use embed_backfill::embed_chunks;
pub use search::CosineSearch;
pub use similarity::cosine_similarity;

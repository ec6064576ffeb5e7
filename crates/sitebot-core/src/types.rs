//! Domain types shared by the indexer, the ranker and the answering layer.

use serde::{Deserialize, Serialize};

/// Position of a chunk in the index build. Stable for one build only.
pub type ChunkId = u64;

/// A slice of page text paired with the URL it was scraped from.
///
/// `text` is never empty. Chunks are created by the offline indexer and
/// are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub url: String,
    pub text: String,
}

impl Chunk {
    pub fn new(id: ChunkId, url: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id, url: url.into(), text: text.into() }
    }
}

/// A cleaned page as produced by the scraping stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub text: String,
}

/// One raw hit from a vector index: the stored position and its L2 distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// A chunk under consideration for one query. Lower `distance` is closer.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub chunk: &'a Chunk,
    pub distance: f32,
    pub is_priority: bool,
}

/// What the ranker hands to the generator: joined context and its sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub context: String,
    /// Unique URLs in order of first occurrence.
    pub sources: Vec<String>,
}

impl RetrievalResult {
    pub fn empty() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.context.trim().is_empty() }
}

use crate::types::{Chunk, Neighbor};

/// Maps text into a fixed-dimension vector space.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Nearest-neighbour search over stored chunk vectors.
///
/// `search` returns at most `k` neighbours sorted by ascending distance.
pub trait VectorIndex: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>>;

    fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Positional chunk lookup, aligned with the `VectorIndex` it was built with.
pub trait Corpus: Send + Sync {
    fn len(&self) -> usize;
    fn get(&self, position: usize) -> Option<&Chunk>;

    fn is_empty(&self) -> bool { self.len() == 0 }
}

/// A (possibly slow) text generator.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

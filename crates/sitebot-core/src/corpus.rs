use crate::traits::Corpus;
use crate::types::Chunk;

/// Chunks held in memory in index order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    chunks: Vec<Chunk>,
}

impl InMemoryCorpus {
    pub fn new(chunks: Vec<Chunk>) -> Self { Self { chunks } }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }
}

impl Corpus for InMemoryCorpus {
    fn len(&self) -> usize { self.chunks.len() }
    fn get(&self, position: usize) -> Option<&Chunk> { self.chunks.get(position) }
}

impl FromIterator<Chunk> for InMemoryCorpus {
    fn from_iter<I: IntoIterator<Item = Chunk>>(iter: I) -> Self { Self::new(iter.into_iter().collect()) }
}

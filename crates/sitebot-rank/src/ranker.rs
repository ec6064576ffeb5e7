use std::sync::Arc;

use tracing::debug;

use sitebot_core::traits::{Corpus, Embedder, VectorIndex};
use sitebot_core::types::{Candidate, RetrievalResult};
use sitebot_core::{Error, Result};

use crate::context::{build_context, unique_sources};
use crate::keywords::FreshnessKeywords;
use crate::scoring::{FreshnessFirst, RankScorer};

/// Candidates fetched from the index before re-ranking.
pub const DEFAULT_OVER_FETCH: usize = 20;

/// Parameters of one `rank` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankRequest<'q> {
    pub query: &'q str,
    pub top_k: usize,
    pub over_fetch: usize,
    /// `None` disables truncation.
    pub max_context_chars: Option<usize>,
}

impl<'q> RankRequest<'q> {
    pub fn new(query: &'q str, top_k: usize) -> Self {
        Self { query, top_k, over_fetch: DEFAULT_OVER_FETCH.max(top_k), max_context_chars: None }
    }

    pub fn over_fetch(mut self, over_fetch: usize) -> Self { self.over_fetch = over_fetch; self }

    pub fn max_context_chars(mut self, max_context_chars: Option<usize>) -> Self { self.max_context_chars = max_context_chars; self }

    fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() { return Err(Error::InvalidQuery("query is empty".into())); }
        if self.top_k == 0 { return Err(Error::InvalidRequest("top_k must be at least 1".into())); }
        if self.over_fetch < self.top_k {
            return Err(Error::InvalidRequest(format!("over_fetch ({}) must be >= top_k ({})", self.over_fetch, self.top_k)));
        }
        if self.max_context_chars == Some(0) { return Err(Error::InvalidRequest("max_context_chars must be positive".into())); }
        Ok(())
    }
}

/// Query → ranked, source-deduplicated, budgeted context.
///
/// Holds only shared read-only collaborators, so one ranker can serve
/// concurrent queries when its embedder and index allow concurrent reads.
pub struct RetrievalRanker {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    corpus: Arc<dyn Corpus>,
    keywords: FreshnessKeywords,
    scorer: Arc<dyn RankScorer>,
}

impl RetrievalRanker {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, corpus: Arc<dyn Corpus>, keywords: FreshnessKeywords) -> Self {
        Self { embedder, index, corpus, keywords, scorer: Arc::new(FreshnessFirst) }
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn RankScorer>) -> Self { self.scorer = scorer; self }

    pub fn rank(&self, request: &RankRequest<'_>) -> Result<RetrievalResult> {
        let selected = self.select(request)?;
        if selected.is_empty() { return Ok(RetrievalResult::empty()); }
        Ok(RetrievalResult {
            context: build_context(&selected, request.max_context_chars),
            sources: unique_sources(&selected),
        })
    }

    /// The `top_k` candidates in final order, before context assembly.
    pub fn select(&self, request: &RankRequest<'_>) -> Result<Vec<Candidate<'_>>> {
        request.validate()?;
        let query_vec = self.embedder.embed(request.query).map_err(|e| Error::unavailable("embed", e))?;
        let neighbors = self.index.search(&query_vec, request.over_fetch).map_err(|e| Error::unavailable("search", e))?;

        let priority_mode = self.keywords.matches(request.query);
        let mut candidates = Vec::with_capacity(neighbors.len());
        for n in neighbors {
            let chunk = self.corpus.get(n.position).ok_or_else(|| {
                Error::ConfigurationMismatch(format!("index position {} is outside the corpus ({} chunks)", n.position, self.corpus.len()))
            })?;
            let is_priority = priority_mode && self.keywords.matches(&chunk.text);
            candidates.push(Candidate { chunk, distance: n.distance, is_priority });
        }
        let fetched = candidates.len();

        // stable: ties beyond the key keep retrieval order
        candidates.sort_by(|a, b| self.scorer.key(a).rank_cmp(&self.scorer.key(b)));
        candidates.truncate(request.top_k);

        debug!(
            fetched,
            selected = candidates.len(),
            priority_mode,
            priority_hits = candidates.iter().filter(|c| c.is_priority).count(),
            "ranked candidates"
        );
        Ok(candidates)
    }
}

//! sitebot-qa
//!
//! End-to-end question answering: `QaContext` is built once (models, index,
//! corpus, ranker, generator), checked for consistency, and then serves
//! `retrieve` and `ask` calls without any global state.

use std::sync::Arc;

use tracing::{info, warn};

use sitebot_answer::{get_default_generator, AnswerComposer, NO_INFORMATION_MESSAGE, UNAVAILABLE_MESSAGE};
use sitebot_core::config::{resolve_with_base, IndexBackend, RetrievalSettings, Settings};
use sitebot_core::traits::{Corpus, Embedder, Generator, VectorIndex};
use sitebot_core::types::RetrievalResult;
use sitebot_core::{Error, Result};
use sitebot_embed::get_default_embedder;
use sitebot_rank::{FreshnessKeywords, RankRequest, RetrievalRanker};
use sitebot_vector::table::open_db;
use sitebot_vector::{load_snapshot, LanceVectorIndex};

/// How an answer came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Generated,
    /// Retrieval found nothing; the generator was not called.
    NoInformation,
    /// A backend failed; `text` is the apology message.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub kind: AnswerKind,
    pub sources: Vec<String>,
    /// Context the answer was generated from; empty unless retrieval succeeded.
    pub context: String,
}

impl Answer {
    fn unavailable() -> Self {
        Self { text: UNAVAILABLE_MESSAGE.to_string(), kind: AnswerKind::Unavailable, sources: vec![], context: String::new() }
    }
}

/// The loaded pipeline. Immutable after construction.
pub struct QaContext {
    ranker: RetrievalRanker,
    composer: AnswerComposer,
    retrieval: RetrievalSettings,
    chunks: usize,
}

impl QaContext {
    /// Load models and the index named by `settings`, relative paths resolved
    /// against the working directory.
    pub fn load(settings: &Settings) -> anyhow::Result<Self> {
        let base = std::env::current_dir()?;
        let db_path = resolve_with_base(&base, &settings.data.lancedb_dir);
        let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embed)?);

        let snapshot = tokio::runtime::Runtime::new()?.block_on(async {
            let conn = open_db(db_path.to_string_lossy().as_ref()).await?;
            load_snapshot(&conn, &settings.data.table).await
        })?;
        let corpus: Arc<dyn Corpus> = Arc::new(snapshot.corpus);
        let index: Arc<dyn VectorIndex> = match settings.retrieval.backend {
            IndexBackend::Flat => Arc::new(snapshot.index),
            IndexBackend::Lance => Arc::new(LanceVectorIndex::open(&db_path, &settings.data.table)?),
        };
        let generator: Arc<dyn Generator> = Arc::from(get_default_generator(&settings.generate)?);

        let ctx = Self::from_parts(embedder, index, corpus, generator, settings)?;
        info!(backend = ?settings.retrieval.backend, chunks = ctx.chunks, "qa context ready");
        Ok(ctx)
    }

    /// Assemble from already constructed collaborators, checking that they agree.
    pub fn from_parts(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        corpus: Arc<dyn Corpus>,
        generator: Arc<dyn Generator>,
        settings: &Settings,
    ) -> Result<Self> {
        settings.validate()?;
        check_alignment(embedder.as_ref(), index.as_ref(), corpus.as_ref())?;
        let keywords = FreshnessKeywords::new(&settings.retrieval.freshness_keywords);
        let chunks = corpus.len();
        Ok(Self {
            ranker: RetrievalRanker::new(embedder, index, corpus, keywords),
            composer: AnswerComposer::new(generator, &settings.generate),
            retrieval: settings.retrieval.clone(),
            chunks,
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize { self.chunks }

    pub fn is_empty(&self) -> bool { self.chunks == 0 }

    /// A request carrying the configured `top_k`, `over_fetch` and context budget.
    pub fn request<'q>(&self, query: &'q str) -> RankRequest<'q> {
        RankRequest::new(query, self.retrieval.top_k)
            .over_fetch(self.retrieval.over_fetch)
            .max_context_chars(self.retrieval.context_budget())
    }

    pub fn retrieve(&self, query: &str) -> Result<RetrievalResult> { self.ranker.rank(&self.request(query)) }

    /// Answer `query`. Caller errors (blank query) are returned; backend
    /// failures degrade to [`UNAVAILABLE_MESSAGE`] and never produce a
    /// generated answer.
    pub fn ask(&self, query: &str) -> Result<Answer> {
        let retrieved = match self.retrieve(query) {
            Ok(r) => r,
            Err(e) if e.is_backend_failure() => {
                warn!(error = %e, "retrieval failed; answering with apology");
                return Ok(Answer::unavailable());
            }
            Err(e) => return Err(e),
        };
        if retrieved.is_empty() {
            return Ok(Answer { text: NO_INFORMATION_MESSAGE.to_string(), kind: AnswerKind::NoInformation, sources: vec![], context: String::new() });
        }
        match self.composer.answer(&retrieved.context, query) {
            Ok(text) => Ok(Answer { text, kind: AnswerKind::Generated, sources: retrieved.sources, context: retrieved.context }),
            Err(e) if e.is_backend_failure() => {
                warn!(error = %e, "generation failed; answering with apology");
                Ok(Answer::unavailable())
            }
            Err(e) => Err(e),
        }
    }
}

/// Embedder, index and corpus must share a dimension and a length.
pub fn check_alignment(embedder: &dyn Embedder, index: &dyn VectorIndex, corpus: &dyn Corpus) -> Result<()> {
    if embedder.dim() != index.dim() {
        return Err(Error::ConfigurationMismatch(format!("embedder dim {} does not match index dim {}", embedder.dim(), index.dim())));
    }
    if corpus.len() != index.len() {
        return Err(Error::ConfigurationMismatch(format!("corpus has {} chunks but index has {} vectors", corpus.len(), index.len())));
    }
    Ok(())
}

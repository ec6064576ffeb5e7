use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sitebot_answer::{FakeGenerator, NO_INFORMATION_MESSAGE, UNAVAILABLE_MESSAGE};
use sitebot_core::config::{IndexBackend, Settings};
use sitebot_core::corpus::InMemoryCorpus;
use sitebot_core::traits::{Embedder, Generator};
use sitebot_core::types::Chunk;
use sitebot_core::Error;
use sitebot_embed::{FakeEmbedder, MINILM_DIM};
use sitebot_qa::{AnswerKind, QaContext};
use sitebot_vector::table::open_db;
use sitebot_vector::{ChunkIndexWriter, FlatL2Index};

fn chunks() -> Vec<Chunk> {
    vec![
        Chunk::new(0, "https://iti.example/programs", "The professional training program lasts nine months. It is full time."),
        Chunk::new(1, "https://iti.example/news", "Latest news: applications for the summer code camp are open."),
        Chunk::new(2, "https://iti.example/contact", "The main campus is in Smart Village. Visitors are welcome."),
    ]
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.retrieval.top_k = 1;
    settings.embed.fake = true;
    settings.generate.fake = true;
    settings
}

fn flat_index(embedder: &FakeEmbedder, chunks: &[Chunk]) -> FlatL2Index {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    FlatL2Index::from_vectors(MINILM_DIM, &embedder.embed_batch(&texts).expect("embed")).expect("index")
}

struct CountingGenerator { calls: AtomicUsize, fail: bool }

impl Generator for CountingGenerator {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail { anyhow::bail!("decoder crashed"); }
        FakeGenerator.generate(prompt)
    }
}

struct DownEmbedder;

impl Embedder for DownEmbedder {
    fn dim(&self) -> usize { MINILM_DIM }
    fn max_len(&self) -> usize { 256 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { anyhow::bail!("embedding model not loaded") }
}

fn context_with(embedder: Arc<dyn Embedder>, generator: Arc<dyn Generator>, chunks: Vec<Chunk>) -> QaContext {
    let index = flat_index(&FakeEmbedder::new(MINILM_DIM), &chunks);
    QaContext::from_parts(embedder, Arc::new(index), Arc::new(InMemoryCorpus::new(chunks)), generator, &test_settings()).expect("context")
}

#[test]
fn answers_from_the_nearest_chunk() {
    let ctx = context_with(Arc::new(FakeEmbedder::new(MINILM_DIM)), Arc::new(FakeGenerator), chunks());
    let answer = ctx.ask("The professional training program lasts nine months. It is full time.").expect("ask");
    assert_eq!(answer.kind, AnswerKind::Generated);
    assert_eq!(answer.text, "The professional training program lasts nine months.");
    assert_eq!(answer.sources, vec!["https://iti.example/programs".to_string()]);
    assert!(!answer.context.is_empty());
}

#[test]
fn empty_index_answers_no_information_without_generating() {
    let generator = Arc::new(CountingGenerator { calls: AtomicUsize::new(0), fail: false });
    let ctx = context_with(Arc::new(FakeEmbedder::new(MINILM_DIM)), generator.clone(), vec![]);
    assert!(ctx.is_empty());
    let answer = ctx.ask("anything new?").expect("ask");
    assert_eq!(answer.kind, AnswerKind::NoInformation);
    assert_eq!(answer.text, NO_INFORMATION_MESSAGE);
    assert!(answer.sources.is_empty());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn backend_failures_degrade_to_apology() {
    let generator = Arc::new(CountingGenerator { calls: AtomicUsize::new(0), fail: false });
    let ctx = context_with(Arc::new(DownEmbedder), generator.clone(), chunks());
    let answer = ctx.ask("where is the campus").expect("ask");
    assert_eq!(answer.kind, AnswerKind::Unavailable);
    assert_eq!(answer.text, UNAVAILABLE_MESSAGE);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    assert!(matches!(ctx.retrieve("where is the campus"), Err(Error::RetrievalUnavailable { .. })));

    let broken = Arc::new(CountingGenerator { calls: AtomicUsize::new(0), fail: true });
    let ctx = context_with(Arc::new(FakeEmbedder::new(MINILM_DIM)), broken, chunks());
    let answer = ctx.ask("where is the campus").expect("ask");
    assert_eq!(answer.kind, AnswerKind::Unavailable);
    assert!(answer.sources.is_empty());
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn context_serves_concurrent_questions() {
    assert_send_sync::<QaContext>();
    let ctx = context_with(Arc::new(FakeEmbedder::new(MINILM_DIM)), Arc::new(FakeGenerator), chunks());
    let questions: Vec<String> = chunks().into_iter().map(|c| c.text).collect();
    let expected: Vec<_> = questions.iter().map(|q| ctx.ask(q).expect("ask")).collect();
    std::thread::scope(|scope| {
        for (q, want) in questions.iter().zip(&expected) {
            let ctx = &ctx;
            scope.spawn(move || assert_eq!(&ctx.ask(q).expect("ask"), want));
        }
    });
}

#[test]
fn blank_query_is_a_caller_error() {
    let ctx = context_with(Arc::new(FakeEmbedder::new(MINILM_DIM)), Arc::new(FakeGenerator), chunks());
    assert!(matches!(ctx.ask("  "), Err(Error::InvalidQuery(_))));
}

#[test]
fn mismatched_parts_are_rejected() {
    let all = chunks();
    let index = flat_index(&FakeEmbedder::new(MINILM_DIM), &all);
    let short_corpus = InMemoryCorpus::new(all[..2].to_vec());
    let err = QaContext::from_parts(Arc::new(FakeEmbedder::new(MINILM_DIM)), Arc::new(index), Arc::new(short_corpus), Arc::new(FakeGenerator), &test_settings());
    assert!(matches!(err, Err(Error::ConfigurationMismatch(_))));

    let index = flat_index(&FakeEmbedder::new(MINILM_DIM), &all);
    let err = QaContext::from_parts(Arc::new(FakeEmbedder::new(8)), Arc::new(index), Arc::new(InMemoryCorpus::new(all)), Arc::new(FakeGenerator), &test_settings());
    assert!(matches!(err, Err(Error::ConfigurationMismatch(_))));
}

#[test]
fn configured_request_uses_settings() {
    let ctx = context_with(Arc::new(FakeEmbedder::new(MINILM_DIM)), Arc::new(FakeGenerator), chunks());
    let request = ctx.request("q");
    assert_eq!((request.top_k, request.over_fetch, request.max_context_chars), (1, 20, Some(450)));
}

fn build_table(dir: &std::path::Path, chunks: &[Chunk]) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    rt.block_on(async {
        let conn = open_db(dir.to_string_lossy().as_ref()).await.expect("db");
        ChunkIndexWriter::new(conn, "chunks", 2).index_chunks(chunks, &FakeEmbedder::new(MINILM_DIM)).await.expect("write");
    });
}

#[test]
fn load_serves_both_backends_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    build_table(dir.path(), &chunks());

    for backend in [IndexBackend::Flat, IndexBackend::Lance] {
        let mut settings = test_settings();
        settings.data.lancedb_dir = dir.path().to_string_lossy().into_owned();
        settings.retrieval.backend = backend;
        let ctx = QaContext::load(&settings).expect("load");
        assert_eq!(ctx.len(), 3);
        let answer = ctx.ask("Latest news: applications for the summer code camp are open.").expect("ask");
        assert_eq!(answer.kind, AnswerKind::Generated, "{backend:?}");
        assert_eq!(answer.sources, vec!["https://iti.example/news".to_string()], "{backend:?}");
    }
}

#[test]
fn load_without_index_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut settings = test_settings();
    settings.data.lancedb_dir = dir.path().to_string_lossy().into_owned();
    let err = QaContext::load(&settings).err().expect("missing table");
    assert!(err.to_string().contains("run the indexer first"), "{err:#}");
}

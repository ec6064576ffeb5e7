use std::fs;

use sitebot_core::config::{Config, IndexBackend, Settings};
use sitebot_core::corpus::InMemoryCorpus;
use sitebot_core::data_processor::{ChunkingConfig, DataProcessor};
use sitebot_core::traits::Corpus;
use sitebot_core::types::{Chunk, Page};
use tempfile::TempDir;

fn page(url: &str, text: &str) -> Page { Page { url: url.to_string(), text: text.to_string() } }

#[test]
fn short_page_becomes_one_chunk() {
    let processor = DataProcessor::new();
    let chunks = processor.chunk_pages(&[page("https://example.edu/a", "  Short text  ")]);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0], Chunk::new(0, "https://example.edu/a", "Short text"));
}

#[test]
fn paragraphs_split_before_words() {
    let para = |c: char| std::iter::repeat(c).take(399).collect::<String>() + ".";
    let text = format!("{}\n\n{}\n\n{}", para('a'), para('b'), para('c'));
    let processor = DataProcessor::new();
    let chunks = processor.split_text(&text);
    assert_eq!(chunks.len(), 3, "each 400-char paragraph stays whole");
    assert!(chunks[0].starts_with('a') && chunks[1].starts_with('b') && chunks[2].starts_with('c'));
}

#[test]
fn long_paragraph_split_on_words_with_overlap() {
    let text = (0..400).map(|i| format!("w{i:03}")).collect::<Vec<_>>().join(" ");
    let processor = DataProcessor::with_config(ChunkingConfig { chunk_size: 100, chunk_overlap: 20 });
    let chunks = processor.split_text(&text);
    assert!(chunks.len() > 10);
    for c in &chunks { assert!(c.chars().count() <= 100, "chunk too long: {}", c.len()); }
    for pair in chunks.windows(2) {
        let last_word = pair[0].split_whitespace().last().expect("word");
        assert!(pair[1].contains(last_word), "next chunk repeats the tail of the previous one");
    }
}

#[test]
fn chunk_ids_are_positions_across_pages() {
    let processor = DataProcessor::with_config(ChunkingConfig { chunk_size: 20, chunk_overlap: 0 });
    let chunks = processor.chunk_pages(&[
        page("https://example.edu/a", "alpha bravo charlie delta echo"),
        page("https://example.edu/b", "foxtrot"),
    ]);
    let ids: Vec<u64> = chunks.iter().map(|c| c.id).collect();
    assert_eq!(ids, (0..chunks.len() as u64).collect::<Vec<_>>());
    assert_eq!(chunks.last().map(|c| c.url.as_str()), Some("https://example.edu/b"));
    assert!(chunks.iter().all(|c| !c.text.is_empty()));
}

#[test]
fn read_pages_from_directory_with_limit() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.jsonl"), "{\"url\":\"u1\",\"text\":\"alpha\"}\n\n{\"url\":\"u2\",\"text\":\"   \"}\n").unwrap();
    fs::write(dir.join("b.jsonl"), "{\"url\":\"u3\",\"text\":\"charlie\"}\n").unwrap();
    fs::write(dir.join("ignored.txt"), "not a page").unwrap();

    let processor = DataProcessor::new();
    let all = processor.read_pages(dir, None).expect("read");
    assert_eq!(all.iter().map(|p| p.url.as_str()).collect::<Vec<_>>(), vec!["u1", "u3"], "blank pages are skipped");

    let limited = processor.process_path_limited(dir, 1).expect("limited");
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].url, "u1");
}

#[test]
fn malformed_page_line_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("pages.jsonl");
    fs::write(&file, "{\"url\": 1}\n").unwrap();
    let err = DataProcessor::new().process_path(&file).unwrap_err();
    assert!(err.to_string().contains("pages.jsonl:1"));
}

#[test]
fn in_memory_corpus_positional_lookup() {
    let corpus: InMemoryCorpus = vec![Chunk::new(0, "a", "x"), Chunk::new(1, "b", "y")].into_iter().collect();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.get(1).map(|c| c.url.as_str()), Some("b"));
    assert!(corpus.get(2).is_none());
}

#[test]
fn settings_defaults_are_valid() {
    let s = Settings::default();
    s.validate().expect("defaults validate");
    assert_eq!((s.retrieval.top_k, s.retrieval.over_fetch), (2, 20));
    assert_eq!(s.retrieval.context_budget(), Some(450));
    assert!(s.retrieval.freshness_keywords.iter().any(|k| k == "latest"));
}

#[test]
fn config_merges_toml_and_env() {
    figment::Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file(
            "config.toml",
            r#"
            [retrieval]
            top_k = 3
            over_fetch = 10
            backend = "lance"

            [data]
            table = "pages"
            "#,
        )?;
        jail.set_env("APP_RETRIEVAL__MAX_CONTEXT_CHARS", "0");
        let config = Config::load().map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.retrieval.top_k, 3);
        assert_eq!(settings.retrieval.over_fetch, 10);
        assert_eq!(settings.retrieval.backend, IndexBackend::Lance);
        assert_eq!(settings.retrieval.context_budget(), None);
        assert_eq!(settings.data.table, "pages");
        assert_eq!(settings.data.lancedb_dir, "data/lancedb", "untouched keys keep defaults");
        let table: String = config.get("data.table").map_err(|e| e.to_string())?;
        assert_eq!(table, "pages");
        Ok(())
    });
}

#[test]
fn config_rejects_over_fetch_below_top_k() {
    figment::Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file("config.toml", "[retrieval]\ntop_k = 5\nover_fetch = 4\n")?;
        let config = Config::load().map_err(|e| e.to_string())?;
        let err = config.settings().expect_err("invalid");
        assert!(err.to_string().contains("over_fetch"));
        Ok(())
    });
}

#[test]
fn settings_from_in_memory_figment() {
    use figment::providers::{Format, Serialized, Toml};
    let figment = figment::Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::string("[chunking]\nchunk_size = 200\nchunk_overlap = 20\n[generate]\nsubject = \"Campus\"\n"));
    let settings = Config::from_figment(figment).settings().expect("settings");
    assert_eq!((settings.chunking.chunk_size, settings.chunking.chunk_overlap), (200, 20));
    assert_eq!(settings.generate.subject, "Campus");

    let bad = figment::Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::string("[chunking]\nchunk_size = 50\nchunk_overlap = 50\n"));
    assert!(Config::from_figment(bad).settings().is_err());
}

#[test]
fn production_rejects_fake_backends() {
    figment::Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("RUST_ENV", "prod");
        jail.set_env("APP_EMBED__FAKE", "true");
        assert!(Config::load().is_err());
        Ok(())
    });
}

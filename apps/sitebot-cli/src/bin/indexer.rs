use std::{fs, path::PathBuf};

use clap::Parser;
use tracing::info;

use sitebot_cli::{init_tracing, load_settings};
use sitebot_core::config::resolve_with_base;
use sitebot_core::data_processor::{ChunkingConfig, DataProcessor};
use sitebot_embed::get_default_embedder;
use sitebot_vector::rebuild_index_dir;

/// Chunk cleaned pages, embed them and rebuild the LanceDB chunk table.
#[derive(Parser)]
#[command(name = "sitebot-indexer", version)]
struct Args {
    /// JSONL file or directory of `{"url", "text"}` pages (default: data.pages_path)
    #[arg(long)]
    pages: Option<PathBuf>,

    /// Only read the first N pages
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = load_settings()?;
    let base = std::env::current_dir()?;
    let pages_path = args.pages.unwrap_or_else(|| resolve_with_base(&base, &settings.data.pages_path));
    let lancedb_path = resolve_with_base(&base, &settings.data.lancedb_dir);

    println!("Sitebot Indexer\n===============");
    println!("Pages: {}", pages_path.display());
    let processor = DataProcessor::with_config(ChunkingConfig::from(&settings.chunking));
    let chunks = match args.limit {
        Some(limit) => { println!("🔢 Limiting to {} pages", limit); processor.process_path_limited(&pages_path, limit)? }
        None => processor.process_path(&pages_path)?,
    };
    if chunks.is_empty() { println!("No chunks produced; nothing to index."); return Ok(()); }

    let embedder = get_default_embedder(&settings.embed)?;
    if let Some(parent) = lancedb_path.parent() { fs::create_dir_all(parent)?; }
    let written = tokio::runtime::Runtime::new()?.block_on(
        rebuild_index_dir(&lancedb_path, &settings.data.table, settings.embed.batch_size, &chunks, embedder.as_ref()),
    )?;
    info!(written, table = %settings.data.table, "index rebuilt");

    println!("\n✅ Indexing completed successfully!");
    println!("📊 Wrote {} chunks to {} ({})", written, lancedb_path.display(), settings.data.table);
    println!("\n💡 To try retrieval, use: cargo run --bin sitebot-retrieve '<query>'");
    Ok(())
}

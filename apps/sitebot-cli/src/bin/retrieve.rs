use clap::Parser;

use sitebot_cli::{init_tracing, load_settings, print_sources};
use sitebot_qa::QaContext;

/// Show the context and sources the ranker selects for a query.
#[derive(Parser)]
#[command(name = "sitebot-retrieve", version)]
struct Args {
    query: String,

    /// Chunks to keep (default: retrieval.top_k)
    #[arg(long)]
    top_k: Option<usize>,

    /// Neighbours fetched before re-ranking (default: retrieval.over_fetch)
    #[arg(long)]
    over_fetch: Option<usize>,

    /// Context budget in characters, 0 for none (default: retrieval.max_context_chars)
    #[arg(long)]
    max_context_chars: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut settings = load_settings()?;
    // the model is not needed to retrieve
    settings.generate.fake = true;
    if let Some(k) = args.top_k { settings.retrieval.top_k = k; settings.retrieval.over_fetch = settings.retrieval.over_fetch.max(k); }
    if let Some(n) = args.over_fetch { settings.retrieval.over_fetch = n; }
    if let Some(n) = args.max_context_chars { settings.retrieval.max_context_chars = n; }
    settings.validate()?;

    let ctx = QaContext::load(&settings)?;
    let result = ctx.retrieve(&args.query)?;
    println!("🔍 Query: {}", args.query);
    if result.is_empty() { println!("\nNo matching chunks."); return Ok(()); }
    println!("\n📚 Context:\n{}", result.context);
    println!("\n🔗 Sources:");
    print_sources(&result.sources);
    Ok(())
}

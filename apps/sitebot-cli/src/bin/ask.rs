use clap::Parser;

use sitebot_cli::{init_tracing, load_settings, print_sources};
use sitebot_qa::{AnswerKind, QaContext};

/// Answer a question from the indexed site.
#[derive(Parser)]
#[command(name = "sitebot-ask", version)]
struct Args {
    question: String,

    /// Also print the retrieved context
    #[arg(long)]
    show_context: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = load_settings()?;
    let ctx = QaContext::load(&settings)?;
    let answer = ctx.ask(&args.question)?;

    println!("💬 Final Answer:\n{}", answer.text);
    if args.show_context && answer.kind == AnswerKind::Generated {
        println!("\n📚 Retrieved Context:\n{}", answer.context);
    }
    if answer.kind != AnswerKind::Unavailable {
        println!("\n🔗 Sources:");
        print_sources(&answer.sources);
    }
    Ok(())
}

//! Shared setup for the sitebot binaries.

use sitebot_core::config::{Config, Settings};
use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

/// `config.toml` + `config.<RUST_ENV>.toml` + `APP_*`, validated.
pub fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    config.settings()
}

/// Print sources one per line, or a note when there are none.
pub fn print_sources(sources: &[String]) {
    if sources.is_empty() { println!("No source link available in the retrieved data."); return; }
    for (i, url) in sources.iter().enumerate() { println!("  {}. {}", i + 1, url); }
}

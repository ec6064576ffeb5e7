//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys are addressed with a double underscore in the environment,
//! e.g. `APP_RETRIEVAL__TOP_K=3`. Provides helpers to expand `~` and `${VAR}`
//! and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Wrap an already assembled figment, e.g. one built from in-memory providers.
    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the typed settings.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                let settings = self.settings()?;
                if settings.embed.use_fake() || settings.generate.use_fake() {
                    return Err(Error::InvalidConfig("fake embedder/generator is not allowed in production".into()).into());
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub embed: EmbedSettings,
    pub generate: GenerateSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        let r = &self.retrieval;
        if r.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if r.over_fetch < r.top_k {
            return Err(Error::InvalidConfig(format!(
                "retrieval.over_fetch ({}) must be >= retrieval.top_k ({})",
                r.over_fetch, r.top_k
            )));
        }
        let c = &self.chunking;
        if c.chunk_size == 0 || c.chunk_overlap >= c.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than a non-zero chunking.chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if self.embed.batch_size == 0 {
            return Err(Error::InvalidConfig("embed.batch_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Cleaned pages as JSONL (`{"url", "text"}` per line), a file or a directory.
    pub pages_path: String,
    pub lancedb_dir: String,
    pub table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            pages_path: "data/pages".to_string(),
            lancedb_dir: "data/lancedb".to_string(),
            table: "chunks".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk into the next.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self { Self { chunk_size: 600, chunk_overlap: 50 } }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Exact L2 search over vectors loaded into memory.
    #[default]
    Flat,
    /// LanceDB `vector_search` against the table on disk.
    Lance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub over_fetch: usize,
    /// Hard cap on context length in characters; `0` disables truncation.
    pub max_context_chars: usize,
    pub freshness_keywords: Vec<String>,
    pub backend: IndexBackend,
}

impl RetrievalSettings {
    pub fn context_budget(&self) -> Option<usize> {
        (self.max_context_chars > 0).then_some(self.max_context_chars)
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 2,
            over_fetch: 20,
            max_context_chars: 450,
            freshness_keywords: default_freshness_keywords(),
            backend: IndexBackend::Flat,
        }
    }
}

/// Terms that signal the user is asking for recent content, in English and Arabic.
pub fn default_freshness_keywords() -> Vec<String> {
    ["news", "latest", "new", "update", "أخبار", "جديد", "أحدث"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedSettings {
    pub model_dir: Option<String>,
    pub fake: bool,
    pub max_len: usize,
    pub batch_size: usize,
}

impl EmbedSettings {
    /// `embed.fake` or `APP_USE_FAKE_EMBEDDINGS=1`.
    pub fn use_fake(&self) -> bool { self.fake || env_flag("APP_USE_FAKE_EMBEDDINGS") }
}

impl Default for EmbedSettings {
    fn default() -> Self { Self { model_dir: None, fake: false, max_len: 256, batch_size: 64 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSettings {
    pub model_dir: Option<String>,
    pub fake: bool,
    pub max_new_tokens: usize,
    pub temperature: f64,
    pub top_k: usize,
    pub top_p: f64,
    pub repetition_penalty: f32,
    pub seed: u64,
    pub max_answer_chars: usize,
    /// Named in the prompt persona ("specialized in <subject> information").
    pub subject: String,
}

impl GenerateSettings {
    /// `generate.fake` or `APP_USE_FAKE_GENERATOR=1`.
    pub fn use_fake(&self) -> bool { self.fake || env_flag("APP_USE_FAKE_GENERATOR") }
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            model_dir: None,
            fake: false,
            max_new_tokens: 200,
            temperature: 0.7,
            top_k: 50,
            top_p: 0.95,
            repetition_penalty: 1.1,
            seed: 299_792_458,
            max_answer_chars: 400,
            subject: "ITI".to_string(),
        }
    }
}

/// `1` or `true` (any case) counts as set.
pub fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

use thiserror::Error;

/// Failures surfaced by the retrieval and answering layers.
///
/// An empty retrieval is not an error; it is a valid `RetrievalResult` with
/// no context and no sources.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The embedding or vector index backend failed or is not loaded.
    #[error("Retrieval unavailable ({stage}): {source}")]
    RetrievalUnavailable {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Embedder, index and corpus disagree. Fatal at load time.
    #[error("Configuration mismatch: {0}")]
    ConfigurationMismatch(String),

    #[error("Generation failed: {0}")]
    Generation(#[source] anyhow::Error),
}

impl Error {
    pub fn unavailable(stage: &'static str, source: anyhow::Error) -> Self {
        Self::RetrievalUnavailable { stage, source }
    }

    /// Whether this failure comes from a backend rather than from the caller.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Self::RetrievalUnavailable { .. } | Self::Generation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! sitebot-answer
//!
//! Turns retrieved context and a question into a short answer: prompt
//! construction, the generator backends (a local Qwen2 instruct model run
//! with candle, or `FakeGenerator`) and post-processing of raw model output.

pub mod clean;
pub mod fake;
pub mod prompt;
pub mod qwen;

use std::sync::Arc;

use tracing::{debug, info};

use sitebot_core::config::GenerateSettings;
use sitebot_core::traits::Generator;
use sitebot_core::{Error, Result};

pub use clean::{clean_generated_text, truncate_answer, ANSWER_MARKERS};
pub use fake::FakeGenerator;
pub use prompt::build_prompt;
pub use qwen::{QwenGenerator, SamplingConfig};

/// Shown when retrieval found nothing to answer from.
pub const NO_INFORMATION_MESSAGE: &str = "Sorry, no information is available for this question.";

/// Shown when a backend failed and no answer can be given.
pub const UNAVAILABLE_MESSAGE: &str = "Sorry, I cannot answer right now. Please try again later.";

pub fn get_default_generator(settings: &GenerateSettings) -> anyhow::Result<Box<dyn Generator>> {
    if settings.use_fake() { info!("using FakeGenerator"); return Ok(Box::new(FakeGenerator)); }
    Ok(Box::new(QwenGenerator::new(settings)?))
}

/// Wraps a `Generator` with the prompt template and answer cleaning.
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
    subject: String,
    max_answer_chars: usize,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn Generator>, settings: &GenerateSettings) -> Self {
        Self { generator, subject: settings.subject.clone(), max_answer_chars: settings.max_answer_chars }
    }

    /// Blank context short-circuits to [`NO_INFORMATION_MESSAGE`] without
    /// calling the generator.
    pub fn answer(&self, context: &str, query: &str) -> Result<String> {
        if context.trim().is_empty() { return Ok(NO_INFORMATION_MESSAGE.to_string()); }
        let prompt = build_prompt(&self.subject, context, query);
        let raw = self.generator.generate(&prompt).map_err(Error::Generation)?;
        let cleaned = clean_generated_text(&raw, &prompt);
        debug!(raw_chars = raw.chars().count(), cleaned_chars = cleaned.chars().count(), "cleaned generator output");
        if cleaned.is_empty() { return Ok(NO_INFORMATION_MESSAGE.to_string()); }
        Ok(truncate_answer(&cleaned, self.max_answer_chars))
    }
}

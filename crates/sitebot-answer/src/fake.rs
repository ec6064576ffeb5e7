use sitebot_core::traits::Generator;

use crate::prompt::{context_section, NOT_IN_CONTEXT};

/// Offline stand-in for the language model.
///
/// Echoes the prompt (as causal LMs decoded end-to-end do) followed by the
/// first sentence of the prompt's context, so answers are deterministic and
/// grounded in whatever the ranker retrieved.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeGenerator;

impl Generator for FakeGenerator {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let reply = context_section(prompt)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map_or(NOT_IN_CONTEXT, |c| c.split_inclusive(['.', '?', '!']).next().unwrap_or(c));
        Ok(format!("{prompt} {}", reply.trim()))
    }
}

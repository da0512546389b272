// src/generate/mod.rs
pub mod gemini;
pub mod prompt;
pub mod sanitize;

pub use gemini::{GeminiProvider, LanguageModel, MockModel, ModelRequest};

use crate::ingest::types::NewsItem;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("no news items provided")]
    NoItems,

    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("Gemini request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Gemini returned no content ({0})")]
    EmptyResponse(&'static str),
}

/// Knobs for one synthesis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    pub max_output_tokens: u32,
    pub max_post_chars: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_output_tokens: 1024,
            max_post_chars: 3000,
        }
    }
}

/// Turn ranked news items into one plain-text post draft.
///
/// Exactly one model call. The raw completion is stripped of markdown and
/// cut to `max_post_chars` (ending in `...`) if it is still too long.
pub async fn generate_post(
    model: &dyn LanguageModel,
    items: &[NewsItem],
    opts: &GenerateOptions,
) -> Result<String, GenerateError> {
    if items.is_empty() {
        return Err(GenerateError::NoItems);
    }

    let prompt = prompt::build_user_prompt(items);
    let raw = model
        .complete(ModelRequest {
            system: prompt::SYSTEM_PROMPT,
            prompt: &prompt,
            max_output_tokens: opts.max_output_tokens,
        })
        .await?;

    tracing::debug!(
        provider = model.provider_name(),
        chars = raw.chars().count(),
        "raw model output"
    );
    tracing::trace!(raw = %raw);

    let cleaned = sanitize::strip_markdown(&raw);
    let (post, truncated) = sanitize::fit_to_length(&cleaned, opts.max_post_chars);
    if truncated {
        tracing::warn!(
            chars = cleaned.chars().count(),
            max = opts.max_post_chars,
            "post too long, truncating"
        );
    } else {
        tracing::info!(chars = post.chars().count(), "final post ready");
    }
    Ok(post)
}

pub mod client;
pub mod mock;

pub use client::HttpCompletionClient;
pub use mock::MockCompletionClient;

use async_trait::async_trait;
use futures::StreamExt;
use thiserror::Error;

/// Prompts are capped so an oversized email body cannot blow the provider's
/// context window.
const MAX_PROMPT_CHARS: usize = 4000;

/// Delimiter the variants prompt asks the model to emit between options.
const VARIANT_DELIMITER: &str = "===REPLY===";

pub const EMPTY_SUMMARY_TEXT: &str = "No email content to summarize.";
pub const EMPTY_REPLY_TEXT: &str = "No email content provided for reply.";
pub const VARIANT_PLACEHOLDER: &str = "No reply generated.";

/// Concurrency bounds for the batch helpers. Summaries are short, so that
/// pool is wider than the variants pool.
const SUMMARIZE_CONCURRENCY: usize = 8;
const VARIANTS_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider error: {message}")]
    Provider { message: String },
    #[error("malformed completion response")]
    MalformedResponse,
}

/// One chat-completion call plus the prompt templates built on top of it.
/// Blank-input guards return fixed sentinel text without touching the network,
/// so callers can pass whatever body extraction produced.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    async fn summarize(&self, text: &str) -> Result<String, CompletionError> {
        if text.trim().is_empty() {
            return Ok(EMPTY_SUMMARY_TEXT.to_string());
        }
        let prompt = format!(
            "Summarize this email briefly:\n\n{}",
            truncate_chars(text, MAX_PROMPT_CHARS)
        );
        self.complete(&prompt).await
    }

    async fn draft_reply(&self, text: &str) -> Result<String, CompletionError> {
        if text.trim().is_empty() {
            return Ok(EMPTY_REPLY_TEXT.to_string());
        }
        let prompt = format!(
            "Write a professional and concise reply to this email:\n\n{}",
            truncate_chars(text, MAX_PROMPT_CHARS)
        );
        self.complete(&prompt).await
    }

    /// Always returns exactly `count` options. A single completion is asked
    /// for all options at once and split on the delimiter; short responses are
    /// padded with a placeholder, long ones truncated.
    async fn generate_variants(
        &self,
        text: &str,
        count: usize,
    ) -> Result<Vec<String>, CompletionError> {
        if count == 0 {
            return Ok(vec![]);
        }
        if text.trim().is_empty() {
            return Ok(vec![VARIANT_PLACEHOLDER.to_string(); count]);
        }

        let prompt = format!(
            "Write {count} distinct professional replies to this email. Separate the \
             replies with a line containing only {VARIANT_DELIMITER} and include no \
             numbering or commentary.\n\n{}",
            truncate_chars(text, MAX_PROMPT_CHARS)
        );
        let response = self.complete(&prompt).await?;

        let mut variants: Vec<String> = response
            .split(VARIANT_DELIMITER)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        variants.resize(count, VARIANT_PLACEHOLDER.to_string());
        variants.truncate(count);
        Ok(variants)
    }
}

/// Summarize each text, bounded concurrency, output order matches input order.
/// Failures degrade to an inline error string for that element only.
pub async fn summarize_batch<P>(provider: &P, texts: &[String]) -> Vec<String>
where
    P: CompletionProvider + ?Sized,
{
    futures::stream::iter(texts.to_vec())
        .map(|text| async move {
            provider
                .summarize(&text)
                .await
                .unwrap_or_else(|err| format!("AI error: {err}"))
        })
        .buffered(SUMMARIZE_CONCURRENCY)
        .collect()
        .await
}

/// Per-text reply variants, bounded concurrency, order preserved. A failed
/// element yields `count` copies of its error string so the output shape is
/// unconditional.
pub async fn reply_variants_batch<P>(
    provider: &P,
    texts: &[String],
    count: usize,
) -> Vec<Vec<String>>
where
    P: CompletionProvider + ?Sized,
{
    futures::stream::iter(texts.to_vec())
        .map(|text| async move {
            match provider.generate_variants(&text, count).await {
                Ok(variants) => variants,
                Err(err) => vec![format!("AI error: {err}"); count],
            }
        })
        .buffered(VARIANTS_CONCURRENCY)
        .collect()
        .await
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

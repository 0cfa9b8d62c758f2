//! Prompt source adapter and prompt composition.
//!
//! The dynamic prompt fragment is fetched once per update run from a remote
//! endpoint authenticated by a shared token. The fetch is never retried
//! internally: if the source is down there is nothing meaningful to
//! generate from, and the run aborts before any model call.

use std::time::Duration;

use reqwest::header;
use tracing::debug;

use crate::error::{Error, Result};

pub const SYSTEM_PROMPT: &str = "You are a concise writer producing a short standalone dispatch. \
Respond with the finished text only, with no preamble and no commentary.";

pub const FIXED_PROMPT: &str = "Write a short dispatch of two to four sentences inspired by \
today's theme. Keep it self-contained and suitable for display on a public page. The theme is:";

/// Build the user message: the fixed prompt, a blank line, then the dynamic
/// fragment wrapped in quotation marks.
pub fn compose_user_prompt(fixed: &str, dynamic: &str) -> String {
    format!("{fixed}\n\n\"{dynamic}\"")
}

/// Fetches the dynamic prompt fragment from the remote source.
#[derive(Debug, Clone)]
pub struct PromptSource {
    http: reqwest::Client,
    url: String,
    token: String,
}

impl PromptSource {
    pub fn new(url: String, token: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, url, token })
    }

    /// One authenticated fetch. The response body is plain text, returned
    /// trimmed of surrounding whitespace.
    pub async fn fetch(&self) -> Result<String> {
        debug!(url = %self.url, "fetching dynamic prompt");
        let response = self
            .http
            .post(&self.url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::PromptSource {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(body.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_quotes_the_dynamic_fragment() {
        let prompt = compose_user_prompt("The theme is:", "winter light");
        assert_eq!(prompt, "The theme is:\n\n\"winter light\"");
    }

    #[test]
    fn default_prompts_are_non_empty() {
        assert!(!SYSTEM_PROMPT.trim().is_empty());
        assert!(!FIXED_PROMPT.trim().is_empty());
    }
}

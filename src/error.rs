//! Error types for the update pipeline.
//!
//! Every failure the orchestrator has to reason about is a distinct variant,
//! so escalation decisions pattern-match instead of probing optional fields:
//!
//! | Error | Source | Effect on a run |
//! |-------|--------|-----------------|
//! | `Config` | missing credential, unknown tier | retried on the same tier, never escalates |
//! | `PromptSource` | prompt endpoint non-2xx | aborts the run before any model call |
//! | `Invocation` | model endpoint non-2xx | status code drives escalation |
//! | `EmptyCompletion` | 2xx but no usable text | retried on the same tier |
//! | `Network` | transport failure, no status | retried on the same tier |
//! | `Storage` | cache gateway failure | surfaced to the caller |
//! | `Exhausted` | all tiers and attempts failed | terminal, carries the failure chain |

use thiserror::Error;

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the prompt source, model client, cache gateway and
/// update orchestrator.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing secret/credential or unknown tier key.
    #[error("configuration error: {0}")]
    Config(String),

    /// The dynamic prompt endpoint returned a non-success status.
    #[error("prompt source returned status {status}")]
    PromptSource { status: u16 },

    /// A model endpoint returned a non-success status.
    #[error("model endpoint returned status {status}: {message}")]
    Invocation { status: u16, message: String },

    /// A model endpoint returned 2xx but no usable generated text.
    #[error("model returned no text (finish reason: {finish_reason})")]
    EmptyCompletion { finish_reason: String },

    /// Transport-level failure with no HTTP status attached.
    #[error("network error: {0}")]
    Network(String),

    /// Content cache gateway failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Every configured tier and attempt failed. Carries the last error from
    /// the standard retry loop and, when a last-resort tier ran, its error too.
    #[error("all strategies exhausted after {attempts} attempts; last error: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<Error>,
        last_resort: Option<Box<Error>>,
    },
}

impl Error {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Invocation { status, .. } | Self::PromptSource { status } => Some(*status),
            _ => None,
        }
    }

    /// Render the full failure chain, including the last-resort error when
    /// one is present. Used for the manual-update response and scheduler log.
    pub fn detail(&self) -> String {
        match self {
            Self::Exhausted {
                last_resort: Some(final_err),
                ..
            } => format!("{self}; last-resort error: {final_err}"),
            _ => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Error::Network(format!("connection failed: {err}"))
        } else {
            Error::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_carries_status() {
        let err = Error::Invocation {
            status: 429,
            message: "slow down".to_string(),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(
            err.to_string(),
            "model endpoint returned status 429: slow down"
        );
    }

    #[test]
    fn prompt_source_carries_status() {
        let err = Error::PromptSource { status: 503 };
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn non_http_errors_have_no_status() {
        assert_eq!(Error::Config("missing key".to_string()).status(), None);
        assert_eq!(Error::Network("refused".to_string()).status(), None);
        assert_eq!(
            Error::EmptyCompletion {
                finish_reason: "content_filter".to_string()
            }
            .status(),
            None
        );
    }

    #[test]
    fn exhausted_detail_includes_last_resort_error() {
        let err = Error::Exhausted {
            attempts: 5,
            last: Box::new(Error::Invocation {
                status: 429,
                message: "rate limited".to_string(),
            }),
            last_resort: Some(Box::new(Error::EmptyCompletion {
                finish_reason: "content_filter".to_string(),
            })),
        };
        let detail = err.detail();
        assert!(detail.contains("429"));
        assert!(detail.contains("content_filter"));
    }

    #[test]
    fn exhausted_detail_without_last_resort() {
        let err = Error::Exhausted {
            attempts: 3,
            last: Box::new(Error::Network("refused".to_string())),
            last_resort: None,
        };
        assert_eq!(err.detail(), err.to_string());
    }
}

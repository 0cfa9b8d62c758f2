//! Model invocation client.
//!
//! Executes a single chat-completion request against a tier's endpoint in
//! the OpenAI-compatible wire format: generated text is read from
//! `choices[0].message.content`, the finish reason from
//! `choices[0].finish_reason`. Failures are normalized into the error
//! taxonomy the orchestrator's escalation policy matches on.

use std::time::Duration;

use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::tier::ModelTier;

/// Chat request body. Tier parameters are flattened into the top level of
/// the payload, merged verbatim alongside `model` and `messages`.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(flatten)]
    parameters: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-style error envelope, probed on non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// HTTP client for chat-completion requests.
#[derive(Debug, Clone)]
pub struct ModelClient {
    http: reqwest::Client,
}

impl ModelClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Invoke one generation request against `tier`. Returns the generated
    /// text trimmed of surrounding whitespace.
    pub async fn invoke(
        &self,
        tier: &ModelTier,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        let api_key = std::env::var(&tier.api_key_env).map_err(|_| {
            Error::Config(format!(
                "{} is not set for the {} tier",
                tier.api_key_env, tier.key
            ))
        })?;

        let request = ChatRequest {
            model: tier.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            parameters: tier.parameters.clone(),
        };

        debug!(tier = %tier.key, model = %tier.model, endpoint = %tier.endpoint, "sending generation request");

        let response = self
            .http
            .post(&tier.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate(&body, 200));
            warn!(tier = %tier.key, status = status.as_u16(), message = %message, "model endpoint error");
            return Err(Error::Invocation {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(tier = %tier.key, error = %e, "unparseable completion body");
            Error::EmptyCompletion {
                finish_reason: format!("malformed response body: {e}"),
            }
        })?;

        let choice = parsed.choices.first().ok_or_else(|| Error::EmptyCompletion {
            finish_reason: "no choices in response".to_string(),
        })?;

        let finish_reason = choice
            .finish_reason
            .clone()
            .unwrap_or_else(|| "unknown".to_string());

        let text = choice
            .message
            .as_ref()
            .and_then(|m| m.content.as_deref())
            .unwrap_or("")
            .trim();

        if text.is_empty() {
            return Err(Error::EmptyCompletion { finish_reason });
        }

        Ok(text.to_string())
    }
}

fn truncate(body: &str, limit: usize) -> String {
    if body.chars().count() > limit {
        body.chars().take(limit).collect()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::TierKey;
    use serde_json::json;

    #[test]
    fn request_merges_tier_parameters_at_top_level() {
        let mut parameters = Map::new();
        parameters.insert("temperature".to_string(), json!(0.7));
        parameters.insert("max_tokens".to_string(), json!(512));

        let request = ChatRequest {
            model: "test-model".to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            parameters,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["temperature"], 0.7);
        assert_eq!(value["max_tokens"], 512);
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn response_parses_content_and_finish_reason() {
        let body = r#"{
            "choices": [{
                "message": {"role": "assistant", "content": "Hello."},
                "finish_reason": "stop"
            }]
        }"#;

        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let choice = parsed.choices.first().unwrap();
        assert_eq!(
            choice.message.as_ref().unwrap().content.as_deref(),
            Some("Hello.")
        );
        assert_eq!(choice.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn response_tolerates_missing_content() {
        let body = r#"{"choices": [{"message": {"role": "assistant"}, "finish_reason": "content_filter"}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let choice = parsed.choices.first().unwrap();
        assert!(choice.message.as_ref().unwrap().content.is_none());
        assert_eq!(choice.finish_reason.as_deref(), Some("content_filter"));
    }

    #[test]
    fn error_envelope_parses() {
        let body = r#"{"error": {"message": "rate limit exceeded", "code": "429"}}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "rate limit exceeded");
    }

    #[tokio::test]
    async fn missing_credential_is_a_config_error() {
        std::env::remove_var("HERALD_TEST_UNSET_API_KEY");
        let tier = ModelTier {
            key: TierKey::Primary,
            model: "test-model".to_string(),
            endpoint: "http://127.0.0.1:9/chat".to_string(),
            api_key_env: "HERALD_TEST_UNSET_API_KEY".to_string(),
            parameters: Map::new(),
        };
        let client = ModelClient::new(Duration::from_secs(1)).unwrap();

        let err = client.invoke(&tier, "system", "user").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("HERALD_TEST_UNSET_API_KEY"));
    }
}

//! Application configuration loaded from environment.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::prompt::{FIXED_PROMPT, SYSTEM_PROMPT};
use crate::refresh::RefreshPolicy;

/// Configuration for the relay process.
///
/// Required environment variables:
/// - `HERALD_PROMPT_URL`: dynamic prompt endpoint
/// - `HERALD_PROMPT_TOKEN`: bearer token for the prompt endpoint
///
/// Optional:
/// - `HERALD_BIND_ADDR`: server bind address (default `0.0.0.0:8080`)
/// - `HERALD_UPDATE_TOKEN`: bearer token guarding `POST /update`; when
///   unset the manual endpoint answers 500 and only the scheduler runs
/// - `HERALD_MAX_ATTEMPTS`, `HERALD_RETRY_DELAY_SECS`,
///   `HERALD_ESCALATE_ON_SERVER_ERROR`: retry/escalation policy
/// - `HERALD_REFRESH_INTERVAL_SECS`: scheduled-run period (default 3600)
/// - `HERALD_REQUEST_TIMEOUT_SECS`: per-request HTTP timeout (default 120)
/// - `HERALD_SYSTEM_PROMPT`, `HERALD_FIXED_PROMPT`: prompt overrides
///
/// Tier credentials (`HERALD_PRIMARY_API_KEY` and friends) are resolved at
/// invocation time, not here; see the tier registry.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub update_token: Option<String>,
    pub prompt_url: String,
    pub prompt_token: String,
    pub system_prompt: String,
    pub fixed_prompt: String,
    pub policy: RefreshPolicy,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env_or("HERALD_BIND_ADDR", "0.0.0.0:8080");

        let update_token = std::env::var("HERALD_UPDATE_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let prompt_url = std::env::var("HERALD_PROMPT_URL")
            .map_err(|_| anyhow::anyhow!("HERALD_PROMPT_URL environment variable is required"))?;
        let prompt_token = std::env::var("HERALD_PROMPT_TOKEN")
            .map_err(|_| anyhow::anyhow!("HERALD_PROMPT_TOKEN environment variable is required"))?;

        let policy = RefreshPolicy {
            max_attempts: parse_env("HERALD_MAX_ATTEMPTS", 5u32)?.max(1),
            retry_delay: Duration::from_secs(parse_env("HERALD_RETRY_DELAY_SECS", 2u64)?),
            escalate_on_server_error: parse_bool_env("HERALD_ESCALATE_ON_SERVER_ERROR", true)?,
        };

        let refresh_interval =
            Duration::from_secs(parse_env("HERALD_REFRESH_INTERVAL_SECS", 3600u64)?);
        let request_timeout =
            Duration::from_secs(parse_env("HERALD_REQUEST_TIMEOUT_SECS", 120u64)?);

        tracing::info!(
            bind_addr = %bind_addr,
            update_endpoint_enabled = update_token.is_some(),
            max_attempts = policy.max_attempts,
            retry_delay_secs = policy.retry_delay.as_secs(),
            escalate_on_server_error = policy.escalate_on_server_error,
            refresh_interval_secs = refresh_interval.as_secs(),
            "configuration loaded"
        );

        Ok(Self {
            bind_addr,
            update_token,
            prompt_url,
            prompt_token,
            system_prompt: env_or("HERALD_SYSTEM_PROMPT", SYSTEM_PROMPT),
            fixed_prompt: env_or("HERALD_FIXED_PROMPT", FIXED_PROMPT),
            policy,
            refresh_interval,
            request_timeout,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {name}: {e}")),
        Err(_) => Ok(default),
    }
}

fn parse_bool_env(name: &str, default: bool) -> anyhow::Result<bool> {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(anyhow::anyhow!("invalid {name}: expected a boolean, got {other:?}")),
        },
        Err(_) => Ok(default),
    }
}

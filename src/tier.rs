//! Model tier registry.
//!
//! A tier is one LLM backend configuration: model id, endpoint, credential
//! reference and generation parameters. Tiers form a fixed escalation chain
//! ordered by [`TierKey`]: the primary tier is tried first, the fallback is
//! the escalation target for qualifying failures, and the last-resort tier
//! is reserved for a single attempt after the standard loop is exhausted.
//!
//! The registry is immutable for the process lifetime. Built-in defaults can
//! be overridden per tier through `HERALD_*_MODEL` / `HERALD_*_ENDPOINT`
//! environment variables; API keys are always resolved from the environment
//! at invocation time via each tier's `api_key_env`.

use std::fmt;

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_PRIMARY_MODEL: &str = "openai/gpt-5";
const DEFAULT_FALLBACK_MODEL: &str = "google/gemini-2.5-flash";
const DEFAULT_LAST_RESORT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";

/// Identifier of a tier in the escalation chain. Ordering is significant:
/// `Primary < Fallback < LastResort` defines the escalation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TierKey {
    Primary,
    Fallback,
    LastResort,
}

impl TierKey {
    /// Successor in the standard retry chain. The last-resort tier is not
    /// part of the chain; it only runs once after the chain is exhausted.
    pub fn next(self) -> Option<TierKey> {
        match self {
            TierKey::Primary => Some(TierKey::Fallback),
            TierKey::Fallback | TierKey::LastResort => None,
        }
    }
}

impl fmt::Display for TierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierKey::Primary => write!(f, "primary"),
            TierKey::Fallback => write!(f, "fallback"),
            TierKey::LastResort => write!(f, "last-resort"),
        }
    }
}

/// One LLM backend configuration.
#[derive(Debug, Clone)]
pub struct ModelTier {
    pub key: TierKey,
    /// Model identifier sent in the request body.
    pub model: String,
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Name of the environment variable holding this tier's API key.
    pub api_key_env: String,
    /// Generation parameters merged verbatim into the request payload.
    pub parameters: Map<String, Value>,
}

/// Immutable, priority-ordered set of tiers.
#[derive(Debug, Clone)]
pub struct TierRegistry {
    tiers: Vec<ModelTier>,
}

impl TierRegistry {
    /// Build a registry from explicit tiers. Requires a primary tier and
    /// rejects duplicate keys; tiers are kept in escalation order.
    pub fn new(mut tiers: Vec<ModelTier>) -> Result<Self> {
        tiers.sort_by_key(|t| t.key);
        if tiers.first().map(|t| t.key) != Some(TierKey::Primary) {
            return Err(Error::Config(
                "tier registry requires a primary tier".to_string(),
            ));
        }
        if tiers.windows(2).any(|pair| pair[0].key == pair[1].key) {
            return Err(Error::Config(
                "tier registry contains duplicate tier keys".to_string(),
            ));
        }
        Ok(Self { tiers })
    }

    /// Build the default registry, honoring per-tier environment overrides.
    pub fn from_env() -> Result<Self> {
        Self::new(vec![
            ModelTier {
                key: TierKey::Primary,
                model: env_or("HERALD_PRIMARY_MODEL", DEFAULT_PRIMARY_MODEL),
                endpoint: env_or("HERALD_PRIMARY_ENDPOINT", DEFAULT_ENDPOINT),
                api_key_env: "HERALD_PRIMARY_API_KEY".to_string(),
                parameters: parameters(&[("temperature", json!(1.0))]),
            },
            ModelTier {
                key: TierKey::Fallback,
                model: env_or("HERALD_FALLBACK_MODEL", DEFAULT_FALLBACK_MODEL),
                endpoint: env_or("HERALD_FALLBACK_ENDPOINT", DEFAULT_ENDPOINT),
                api_key_env: "HERALD_FALLBACK_API_KEY".to_string(),
                parameters: parameters(&[("temperature", json!(1.0))]),
            },
            ModelTier {
                key: TierKey::LastResort,
                model: env_or("HERALD_LAST_RESORT_MODEL", DEFAULT_LAST_RESORT_MODEL),
                endpoint: env_or("HERALD_LAST_RESORT_ENDPOINT", DEFAULT_ENDPOINT),
                api_key_env: "HERALD_LAST_RESORT_API_KEY".to_string(),
                parameters: parameters(&[("temperature", json!(0.7))]),
            },
        ])
    }

    /// Look up a tier by key.
    pub fn lookup(&self, key: TierKey) -> Result<&ModelTier> {
        self.tiers
            .iter()
            .find(|t| t.key == key)
            .ok_or_else(|| Error::Config(format!("no tier configured for {key}")))
    }

    /// Highest-priority tier; a registry always has one.
    pub fn first(&self) -> &ModelTier {
        &self.tiers[0]
    }

    /// Next configured tier in the standard retry chain, if any.
    pub fn next_standard(&self, key: TierKey) -> Option<TierKey> {
        key.next()
            .filter(|next| self.tiers.iter().any(|t| t.key == *next))
    }

    /// The last-resort tier, if one is configured.
    pub fn last_resort(&self) -> Option<&ModelTier> {
        self.tiers.iter().find(|t| t.key == TierKey::LastResort)
    }
}

fn parameters(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

//! Herald - scheduled LLM content relay
//!
//! Herald periodically fetches a dynamic prompt fragment from a remote
//! source, combines it with fixed prompt text, submits the composite prompt
//! to a chat-completion API, and caches the generated text behind a plain
//! read endpoint. An authenticated endpoint triggers the same update
//! manually.
//!
//! # Architecture
//!
//! - [`tier`]: priority-ordered registry of model backends
//!   (primary → fallback → last-resort)
//! - [`client`]: single chat-completion invocation with failure
//!   classification
//! - [`prompt`]: dynamic prompt fetch and prompt composition
//! - [`refresh`]: the update orchestrator — retry, escalation and
//!   last-resort policy
//! - [`cache`]: content store gateway (single key, last-write-wins)
//! - [`routes`] / [`scheduler`]: HTTP surface and periodic trigger

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod prompt;
pub mod refresh;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod tier;

pub use cache::{ContentStore, MemoryStore, CONTENT_KEY};
pub use client::ModelClient;
pub use config::Config;
pub use error::{Error, Result};
pub use prompt::{compose_user_prompt, PromptSource};
pub use refresh::{RefreshOutcome, RefreshPolicy, Refresher};
pub use routes::router;
pub use state::AppState;
pub use tier::{ModelTier, TierKey, TierRegistry};

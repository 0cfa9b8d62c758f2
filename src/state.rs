//! Shared application state.

use std::sync::Arc;

use crate::cache::{ContentStore, MemoryStore};
use crate::client::ModelClient;
use crate::config::Config;
use crate::prompt::PromptSource;
use crate::refresh::Refresher;
use crate::tier::TierRegistry;

/// State available to all request handlers and the scheduler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ContentStore>,
    pub refresher: Arc<Refresher>,
}

impl AppState {
    pub fn new(config: Config, registry: TierRegistry) -> anyhow::Result<Self> {
        Self::with_store(config, registry, Arc::new(MemoryStore::default()))
    }

    /// Build state around an explicit store implementation.
    pub fn with_store(
        config: Config,
        registry: TierRegistry,
        store: Arc<dyn ContentStore>,
    ) -> anyhow::Result<Self> {
        let client = ModelClient::new(config.request_timeout)?;
        let prompts = PromptSource::new(
            config.prompt_url.clone(),
            config.prompt_token.clone(),
            config.request_timeout,
        )?;
        let refresher = Refresher::new(
            registry,
            client,
            prompts,
            Arc::clone(&store),
            config.policy.clone(),
        )
        .with_prompts(config.system_prompt.clone(), config.fixed_prompt.clone());

        Ok(Self {
            config: Arc::new(config),
            store,
            refresher: Arc::new(refresher),
        })
    }
}

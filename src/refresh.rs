//! Resilient update orchestrator.
//!
//! One run drives the whole pipeline in three stages:
//!
//! 1. **Prompt acquisition** — the dynamic prompt is fetched exactly once
//!    and reused across every attempt, bounding calls to the upstream
//!    source to one per run no matter how many model attempts follow. A
//!    fetch failure aborts the run before any model call.
//! 2. **Standard retry loop** — up to `max_attempts` invocations, starting
//!    on the primary tier. A failure escalates to the fallback tier only
//!    when it came from the primary tier and its status qualifies (429
//!    always; 5xx when `escalate_on_server_error` is set). Everything else
//!    is retried on the current tier: content and format failures are just
//!    as likely to recur elsewhere, so a blind same-tier retry absorbs
//!    transient hiccups first. Escalation is monotonic within a run. A
//!    fixed delay separates attempts.
//! 3. **Last resort** — if a last-resort tier is configured and the loop
//!    exhausted its budget, exactly one more invocation runs against it.
//!    On failure the terminal error carries both the loop's last error and
//!    the last-resort error.
//!
//! Every run terminates in exactly one success outcome or one aggregated
//! error; nothing escapes mid-loop.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::{ContentStore, CONTENT_KEY};
use crate::client::ModelClient;
use crate::error::{Error, Result};
use crate::prompt::{compose_user_prompt, PromptSource, FIXED_PROMPT, SYSTEM_PROMPT};
use crate::tier::{TierKey, TierRegistry};

/// Tunable retry/escalation policy.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// Attempt budget for the standard loop (the last-resort attempt is
    /// extra). Clamped to at least 1.
    pub max_attempts: u32,
    /// Fixed delay between attempts. Deliberately not exponential.
    pub retry_delay: Duration,
    /// Whether 5xx responses escalate in addition to 429.
    pub escalate_on_server_error: bool,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(2),
            escalate_on_server_error: true,
        }
    }
}

impl RefreshPolicy {
    /// Whether a failure qualifies for escalation to the next tier.
    /// Only invocation failures carry a status; everything else retries on
    /// the same tier.
    fn should_escalate(&self, err: &Error) -> bool {
        match err {
            Error::Invocation { status, .. } => {
                *status == 429 || (self.escalate_on_server_error && *status >= 500)
            }
            _ => false,
        }
    }
}

/// Final output of a successful run.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// Tier that produced the accepted content.
    pub tier: TierKey,
    /// Model id of that tier.
    pub model: String,
    /// Generated text, trimmed of surrounding whitespace.
    pub content: String,
}

/// Drives the end-to-end content update.
pub struct Refresher {
    registry: TierRegistry,
    client: ModelClient,
    prompts: PromptSource,
    store: Arc<dyn ContentStore>,
    policy: RefreshPolicy,
    system_prompt: String,
    fixed_prompt: String,
}

impl Refresher {
    pub fn new(
        registry: TierRegistry,
        client: ModelClient,
        prompts: PromptSource,
        store: Arc<dyn ContentStore>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            registry,
            client,
            prompts,
            store,
            policy,
            system_prompt: SYSTEM_PROMPT.to_string(),
            fixed_prompt: FIXED_PROMPT.to_string(),
        }
    }

    /// Override the compiled-in prompts.
    pub fn with_prompts(mut self, system: impl Into<String>, fixed: impl Into<String>) -> Self {
        self.system_prompt = system.into();
        self.fixed_prompt = fixed.into();
        self
    }

    /// Execute one update run.
    pub async fn run(&self) -> Result<RefreshOutcome> {
        let dynamic = self.prompts.fetch().await?;
        let user_prompt = compose_user_prompt(&self.fixed_prompt, &dynamic);
        info!(chars = dynamic.len(), "dynamic prompt acquired");

        let max_attempts = self.policy.max_attempts.max(1);
        let mut current = self.registry.first().key;
        let mut last_error: Option<Error> = None;

        for attempt in 1..=max_attempts {
            let tier = self.registry.lookup(current)?;
            match self
                .client
                .invoke(tier, &self.system_prompt, &user_prompt)
                .await
            {
                Ok(content) => {
                    info!(tier = %current, model = %tier.model, attempt, "generation succeeded");
                    self.store.put(CONTENT_KEY, content.clone()).await?;
                    return Ok(RefreshOutcome {
                        tier: current,
                        model: tier.model.clone(),
                        content,
                    });
                }
                Err(err) => {
                    warn!(
                        tier = %current,
                        attempt,
                        max_attempts,
                        error = %err,
                        "generation attempt failed"
                    );
                    if current == self.registry.first().key && self.policy.should_escalate(&err) {
                        if let Some(next) = self.registry.next_standard(current) {
                            info!(from = %current, to = %next, "escalating to next tier");
                            current = next;
                        }
                    }
                    last_error = Some(err);
                    if attempt < max_attempts && !self.policy.retry_delay.is_zero() {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }

        let Some(last) = last_error else {
            return Err(Error::Config(
                "retry loop finished without recording an attempt".to_string(),
            ));
        };

        match self.registry.last_resort() {
            Some(tier) => {
                info!(tier = %tier.key, model = %tier.model, "attempt budget exhausted, invoking last-resort tier");
                match self
                    .client
                    .invoke(tier, &self.system_prompt, &user_prompt)
                    .await
                {
                    Ok(content) => {
                        info!(tier = %tier.key, model = %tier.model, "last-resort generation succeeded");
                        self.store.put(CONTENT_KEY, content.clone()).await?;
                        Ok(RefreshOutcome {
                            tier: TierKey::LastResort,
                            model: tier.model.clone(),
                            content,
                        })
                    }
                    Err(final_err) => {
                        warn!(error = %final_err, "last-resort attempt failed");
                        Err(Error::Exhausted {
                            attempts: max_attempts,
                            last: Box::new(last),
                            last_resort: Some(Box::new(final_err)),
                        })
                    }
                }
            }
            None => Err(Error::Exhausted {
                attempts: max_attempts,
                last: Box::new(last),
                last_resort: None,
            }),
        }
    }
}

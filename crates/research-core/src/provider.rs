//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for all reasoning backends (OpenAI,
//! Anthropic, Together, etc.). The orchestration loop works exclusively
//! through this trait; each adapter translates the canonical message
//! history to its backend's native shape and normalizes the response back.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use research_core::provider::LlmProvider;
//!
//! let response = provider.complete(&messages, &tool_schemas).await?;
//! assert_eq!(response.role, Role::Assistant);
//! ```

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::tool::ToolSchema;

/// Strategy trait for reasoning backends.
///
/// `complete` must return exactly one assistant-role message. Tool calls
/// requested by the backend arrive normalized: canonical ids (synthesized
/// where the backend omits them) and structured argument mappings.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging and error reporting
    fn name(&self) -> &str;

    /// Run one reasoning step over the canonical history
    async fn complete(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message>;
}

/// Bounded exponential backoff for provider invocations
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Attempt ceiling (total tries, not retries)
    pub max_attempts: u32,

    /// Delay before the second attempt; doubled per subsequent attempt
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay before the attempt following `attempt` (1-based)
    fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exp);
        delay.min(self.max_delay)
    }
}

/// Run `op` under the retry policy.
///
/// Retries only errors the taxonomy marks retryable; exhausting the attempt
/// ceiling propagates the last error wrapped as `ProviderExhausted`. Never
/// substitutes a placeholder result.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, provider: &str, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    provider,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "provider call failed, backing off"
                );
                last_error = Some(e);
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(provider, attempt, error = %e, "provider call failed, not retrying");
                last_error = Some(e);
                break;
            }
        }
    }

    let last_error = last_error.map_or_else(|| "no attempts made".into(), |e| e.to_string());
    Err(AgentError::ProviderExhausted {
        provider: provider.into(),
        attempts: policy.max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after(4), Duration::from_secs(8));
        assert_eq!(policy.delay_after(5), Duration::from_secs(10));
        assert_eq!(policy.delay_after(12), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let calls = AtomicU32::new(0);

        let result = with_backoff(&policy, "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AgentError::Provider("flaky".into()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_propagates_last_error() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        };

        let result: Result<()> = with_backoff(&policy, "test", || async {
            Err(AgentError::Provider("still down".into()))
        })
        .await;

        match result {
            Err(AgentError::ProviderExhausted {
                provider,
                attempts,
                last_error,
            }) => {
                assert_eq!(provider, "test");
                assert_eq!(attempts, 2);
                assert!(last_error.contains("still down"));
            }
            other => panic!("expected ProviderExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let policy = RetryPolicy::new(5);
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_backoff(&policy, "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AgentError::Config("bad key".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

use crate::config::{RetryConfig, SynthesisConfig};
use crate::error::ProviderError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Timing policy for a resilient upstream invocation. The invoker loop owns
/// every timeout and sleep decision; the operation it drives only performs
/// one bounded call per attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_timeout: Duration,
    pub timeout_ceiling: Duration,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn for_analysis(retry: &RetryConfig) -> Self {
        Self {
            max_attempts: retry.max_attempts,
            initial_timeout: Duration::from_secs(retry.initial_timeout_sec),
            timeout_ceiling: Duration::from_secs(retry.timeout_ceiling_sec),
            base_backoff: Duration::from_millis(retry.backoff_base_ms),
        }
    }

    /// Synthesis prompts are larger, so the synthesis invoker runs the same
    /// attempt schedule against its own, longer timeouts.
    pub fn for_synthesis(retry: &RetryConfig, synthesis: &SynthesisConfig) -> Self {
        Self {
            max_attempts: retry.max_attempts,
            initial_timeout: Duration::from_secs(synthesis.initial_timeout_sec),
            timeout_ceiling: Duration::from_secs(synthesis.timeout_ceiling_sec),
            base_backoff: Duration::from_millis(retry.backoff_base_ms),
        }
    }

    /// Timeout for attempt `i` (0-indexed): `min(initial * 2^i, ceiling)`.
    /// Later attempts get more time, not the same time repeatedly; a failure
    /// under load is more likely transient latency than a permanent fault.
    pub fn attempt_timeout(&self, attempt: u32) -> Duration {
        self.initial_timeout
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.timeout_ceiling)
    }

    /// Backoff before the attempt after attempt `i`: `base * 2^i`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Final record of one resilient invocation.
#[derive(Debug)]
pub struct InvokeOutcome {
    pub result: Result<String, ProviderError>,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Drive an upstream operation through the retry policy.
///
/// The operation receives the timeout for the current attempt and must
/// cancel its in-flight work when that timeout elapses. Rate-limit failures
/// sleep for the provider-declared delay when one was given, otherwise the
/// exponential backoff; timeouts and upstream errors sleep the backoff;
/// input and credential failures return immediately. After the final
/// attempt the last observed failure is returned, as the most recent one
/// is presumed most diagnostic of current upstream state.
pub async fn invoke_with_retry<F, Fut>(policy: &RetryPolicy, mut operation: F) -> InvokeOutcome
where
    F: FnMut(Duration) -> Fut,
    Fut: Future<Output = Result<String, ProviderError>>,
{
    let start = std::time::Instant::now();
    let mut attempt = 0;

    loop {
        let timeout = policy.attempt_timeout(attempt);

        match operation(timeout).await {
            Ok(content) => {
                return InvokeOutcome {
                    result: Ok(content),
                    attempts: attempt + 1,
                    elapsed: start.elapsed(),
                };
            }
            Err(e) if !e.is_retryable() => {
                return InvokeOutcome {
                    result: Err(e),
                    attempts: attempt + 1,
                    elapsed: start.elapsed(),
                };
            }
            Err(e) if attempt + 1 >= policy.max_attempts => {
                warn!("All {} attempts failed: {}", attempt + 1, e);
                return InvokeOutcome {
                    result: Err(e),
                    attempts: attempt + 1,
                    elapsed: start.elapsed(),
                };
            }
            Err(e) => {
                let delay = e
                    .retry_after()
                    .unwrap_or_else(|| policy.backoff_delay(attempt));

                warn!(
                    "Attempt {} failed: {}. Retrying in {:?}...",
                    attempt + 1,
                    e,
                    delay
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

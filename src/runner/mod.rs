mod orchestrator;
mod progress;
mod retry;

pub use orchestrator::{ResearchOrchestrator, ResearchOutput};
pub use progress::{NoProgress, ProgressEvent, ProgressObserver, ProgressSource, ProgressStage};
pub use retry::{invoke_with_retry, InvokeOutcome, RetryPolicy};

use crate::config::ProviderId;
use crate::error::ProviderError;
use std::time::Duration;
use uuid::Uuid;

/// Final record of one provider's participation in a run. Produced once,
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ProviderResult {
    pub provider: ProviderId,
    /// The provider's analysis; empty when the call failed.
    pub content: String,
    pub error: Option<ProviderError>,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl ProviderResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    AllSucceeded,
    PartialSuccess,
    AllFailed,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallStatus::AllSucceeded => write!(f, "all_succeeded"),
            OverallStatus::PartialSuccess => write!(f, "partial_success"),
            OverallStatus::AllFailed => write!(f, "all_failed"),
        }
    }
}

/// Everything one orchestration run produced, owned by that run alone.
/// `results` holds one entry per configured provider, in configured order;
/// providers are associated by identity, never by completion order.
#[derive(Debug)]
pub struct OrchestrationOutcome {
    /// Correlation id for log lines belonging to this run.
    pub run_id: Uuid,
    pub topic: String,
    pub results: Vec<ProviderResult>,
    pub status: OverallStatus,
    pub total_duration: Duration,
}

impl OrchestrationOutcome {
    /// The successful subset, keyed by provider, passed by value into
    /// synthesis.
    pub fn synthesis_input(&self) -> Vec<(ProviderId, String)> {
        self.results
            .iter()
            .filter(|r| r.succeeded())
            .map(|r| (r.provider, r.content.clone()))
            .collect()
    }

    /// Providers that contributed no content, for the advisory summary
    /// shown alongside a partial-success report.
    pub fn failed_providers(&self) -> Vec<ProviderId> {
        self.results
            .iter()
            .filter(|r| !r.succeeded())
            .map(|r| r.provider)
            .collect()
    }
}

use crate::config::{Config, ProviderId};
use crate::error::ResearchError;
use crate::provider::{self, ProviderClient, ProviderRequest};
use crate::synthesis::{Report, SynthesisEngine, Synthesizer};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::retry::{invoke_with_retry, RetryPolicy};
use super::{
    OrchestrationOutcome, OverallStatus, ProgressEvent, ProgressObserver, ProgressStage,
    ProviderResult,
};

/// A complete research run: the synthesized report plus the per-provider
/// outcome it was built from.
#[derive(Debug)]
pub struct ResearchOutput {
    pub report: Report,
    pub outcome: OrchestrationOutcome,
}

/// Fans one validated topic out to every enabled provider concurrently,
/// waits for all of them, and hands the successful subset to synthesis.
pub struct ResearchOrchestrator {
    config: Config,
    clients: Vec<Arc<dyn ProviderClient>>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl ResearchOrchestrator {
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::new();
        let clients = provider::create_clients(&config, &http);
        let synthesizer = Arc::new(SynthesisEngine::new(&config, http));
        Self::with_components(config, clients, synthesizer)
    }

    /// Construct from pre-built components. The seam tests use to inject
    /// scripted clients and a counting synthesizer.
    pub fn with_components(
        config: Config,
        clients: Vec<Arc<dyn ProviderClient>>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            config,
            clients,
            synthesizer,
        }
    }

    /// Run one end-to-end research request.
    ///
    /// Each provider runs independently behind its own retry schedule; a
    /// slow or failing provider never delays or blocks a healthy one. The
    /// join is a full barrier, not a first-success race: synthesis wants as
    /// many perspectives as are available.
    pub async fn research(
        &self,
        topic: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<ResearchOutput, ResearchError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ResearchError::InvalidTopic);
        }

        let run_id = Uuid::new_v4();
        let start = std::time::Instant::now();
        info!(
            %run_id,
            topic,
            "Starting research with {} providers",
            self.clients.len()
        );

        let policy = RetryPolicy::for_analysis(&self.config.retry);
        let mut futures = FuturesUnordered::new();

        for client in &self.clients {
            let client = Arc::clone(client);
            let request = ProviderRequest::new(topic, self.config.providers.get(client.id()));
            let policy = policy.clone();

            progress.on_event(ProgressEvent::provider(client.id(), ProgressStage::Started));

            futures.push(tokio::spawn(async move {
                let id = client.id();
                let outcome = invoke_with_retry(&policy, |timeout| {
                    let client = Arc::clone(&client);
                    let request = request.clone();
                    async move { client.analyze(&request, timeout).await }
                })
                .await;
                (id, outcome)
            }));
        }

        let mut results: Vec<ProviderResult> = Vec::new();
        let mut last_failure: Option<String> = None;

        while let Some(joined) = futures.next().await {
            match joined {
                Ok((id, outcome)) => {
                    let result = match outcome.result {
                        Ok(content) => {
                            info!(%run_id, provider = %id, attempts = outcome.attempts,
                                "Provider succeeded in {:?}", outcome.elapsed);
                            progress.on_event(ProgressEvent::provider(id, ProgressStage::Succeeded));
                            ProviderResult {
                                provider: id,
                                content,
                                error: None,
                                attempts: outcome.attempts,
                                elapsed: outcome.elapsed,
                            }
                        }
                        Err(e) => {
                            warn!(%run_id, provider = %id, attempts = outcome.attempts,
                                "Provider failed: {}", e);
                            progress.on_event(ProgressEvent::provider(id, ProgressStage::Failed));
                            last_failure = Some(e.to_string());
                            ProviderResult {
                                provider: id,
                                content: String::new(),
                                error: Some(e),
                                attempts: outcome.attempts,
                                elapsed: outcome.elapsed,
                            }
                        }
                    };
                    results.push(result);
                }
                Err(e) => {
                    warn!(%run_id, "Provider task panicked: {}", e);
                }
            }
        }

        // Re-associate by provider identity; completion order is meaningless.
        let order: HashMap<ProviderId, usize> = self
            .clients
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.id(), idx))
            .collect();
        results.sort_by_key(|r| order.get(&r.provider).copied().unwrap_or(usize::MAX));

        for result in &results {
            debug!(%run_id, provider = %result.provider, attempts = result.attempts,
                succeeded = result.succeeded(), "Provider outcome after {:?}", result.elapsed);
        }

        let succeeded = results.iter().filter(|r| r.succeeded()).count();
        let status = if succeeded == 0 {
            OverallStatus::AllFailed
        } else if succeeded == results.len() {
            OverallStatus::AllSucceeded
        } else {
            OverallStatus::PartialSuccess
        };

        let outcome = OrchestrationOutcome {
            run_id,
            topic: topic.to_string(),
            results,
            status,
            total_duration: start.elapsed(),
        };

        if succeeded == 0 {
            let message =
                last_failure.unwrap_or_else(|| "no providers produced a result".to_string());
            warn!(%run_id, "All providers failed; skipping synthesis");
            return Err(ResearchError::AllProvidersFailed {
                message,
                outcome: Box::new(outcome),
            });
        }

        info!(
            %run_id,
            "{}/{} providers succeeded ({})",
            succeeded,
            outcome.results.len(),
            outcome.status
        );

        progress.on_event(ProgressEvent::synthesis(ProgressStage::Started));

        match self
            .synthesizer
            .synthesize(topic, outcome.synthesis_input())
            .await
        {
            Ok(report) => {
                progress.on_event(ProgressEvent::synthesis(ProgressStage::Succeeded));
                info!(run_id = %outcome.run_id, topic = %outcome.topic,
                    "Research completed in {:?}", outcome.total_duration);
                Ok(ResearchOutput { report, outcome })
            }
            Err(e) => {
                progress.on_event(ProgressEvent::synthesis(ProgressStage::Failed));
                warn!(%run_id, "Synthesis failed: {}", e);
                Err(ResearchError::SynthesisFailed {
                    message: e.to_string(),
                    outcome: Box::new(outcome),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, SynthesisError};
    use crate::runner::NoProgress;
    use crate::synthesis::assemble_report;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// A provider that answers (or fails) after an optional delay.
    struct StubClient {
        id: ProviderId,
        delay: Duration,
        response: Result<String, ProviderError>,
        calls: AtomicU32,
    }

    impl StubClient {
        fn ok(id: ProviderId, content: &str) -> Arc<Self> {
            Arc::new(Self {
                id,
                delay: Duration::ZERO,
                response: Ok(content.to_string()),
                calls: AtomicU32::new(0),
            })
        }

        fn failing(id: ProviderId, error: ProviderError) -> Arc<Self> {
            Arc::new(Self {
                id,
                delay: Duration::ZERO,
                response: Err(error),
                calls: AtomicU32::new(0),
            })
        }

        fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                id: self.id,
                delay,
                response: self.response.clone(),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ProviderClient for StubClient {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn analyze(
            &self,
            _request: &ProviderRequest,
            _timeout: Duration,
        ) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay > Duration::ZERO {
                tokio::time::sleep(self.delay).await;
            }
            self.response.clone()
        }
    }

    /// Deterministic synthesizer that counts invocations.
    struct CountingSynthesizer {
        calls: AtomicU32,
    }

    impl CountingSynthesizer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl Synthesizer for CountingSynthesizer {
        async fn synthesize(
            &self,
            topic: &str,
            input: Vec<(ProviderId, String)>,
        ) -> Result<Report, SynthesisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(assemble_report(topic, &input))
        }
    }

    /// Records every progress event it sees.
    struct RecordingObserver {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressObserver for RecordingObserver {
        fn on_event(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.retry.max_attempts = 1;
        config.retry.initial_timeout_sec = 1;
        config.retry.timeout_ceiling_sec = 1;
        config.retry.backoff_base_ms = 1;
        config
    }

    fn timeout_error() -> ProviderError {
        ProviderError::UpstreamTimeout(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_blank_topic_rejected_before_any_call() {
        let client = StubClient::ok(ProviderId::OpenAi, "analysis");
        let synthesizer = CountingSynthesizer::new();
        let orchestrator = ResearchOrchestrator::with_components(
            fast_config(),
            vec![client.clone()],
            synthesizer.clone(),
        );

        let err = orchestrator.research("   ", &NoProgress).await.unwrap_err();
        assert!(matches!(err, ResearchError::InvalidTopic));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let synthesizer = CountingSynthesizer::new();
        let orchestrator = ResearchOrchestrator::with_components(
            fast_config(),
            vec![
                StubClient::ok(ProviderId::OpenAi, "alpha analysis"),
                StubClient::ok(ProviderId::Anthropic, "beta analysis"),
                StubClient::ok(ProviderId::Gemini, "gamma analysis"),
            ],
            synthesizer.clone(),
        );

        let output = orchestrator.research("Rust", &NoProgress).await.unwrap();
        assert_eq!(output.outcome.status, OverallStatus::AllSucceeded);
        assert_eq!(output.outcome.results.len(), 3);
        assert!(output.outcome.failed_providers().is_empty());
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_results_keep_configured_order_despite_completion_order() {
        let synthesizer = CountingSynthesizer::new();
        // First-configured provider finishes last.
        let slow = StubClient::ok(ProviderId::OpenAi, "slow analysis")
            .with_delay(Duration::from_millis(50));
        let orchestrator = ResearchOrchestrator::with_components(
            fast_config(),
            vec![
                slow,
                StubClient::ok(ProviderId::Anthropic, "fast analysis"),
                StubClient::ok(ProviderId::Gemini, "fast analysis"),
            ],
            synthesizer,
        );

        let output = orchestrator.research("Rust", &NoProgress).await.unwrap();
        let order: Vec<ProviderId> = output.outcome.results.iter().map(|r| r.provider).collect();
        assert_eq!(
            order,
            vec![ProviderId::OpenAi, ProviderId::Anthropic, ProviderId::Gemini]
        );
    }

    #[tokio::test]
    async fn test_single_success_still_produces_report() {
        let synthesizer = CountingSynthesizer::new();
        let orchestrator = ResearchOrchestrator::with_components(
            fast_config(),
            vec![
                StubClient::failing(ProviderId::OpenAi, timeout_error()),
                StubClient::ok(
                    ProviderId::Anthropic,
                    "The surviving analysis covers the core architecture in detail.",
                ),
                StubClient::failing(ProviderId::Gemini, timeout_error()),
            ],
            synthesizer.clone(),
        );

        let output = orchestrator
            .research("Quantum computing", &NoProgress)
            .await
            .unwrap();

        assert_eq!(output.outcome.status, OverallStatus::PartialSuccess);
        assert_eq!(
            output.outcome.failed_providers(),
            vec![ProviderId::OpenAi, ProviderId::Gemini]
        );
        // The report derives only from the surviving provider's content.
        assert!(output
            .report
            .body
            .contains("The surviving analysis covers the core architecture in detail."));
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_failed_skips_synthesis() {
        let synthesizer = CountingSynthesizer::new();
        let orchestrator = ResearchOrchestrator::with_components(
            fast_config(),
            vec![
                StubClient::failing(ProviderId::OpenAi, timeout_error()),
                StubClient::failing(ProviderId::Anthropic, timeout_error()),
                StubClient::failing(ProviderId::Gemini, timeout_error()),
            ],
            synthesizer.clone(),
        );

        let err = orchestrator.research("Rust", &NoProgress).await.unwrap_err();
        match err {
            ResearchError::AllProvidersFailed { outcome, .. } => {
                assert_eq!(outcome.status, OverallStatus::AllFailed);
                assert_eq!(outcome.results.len(), 3);
            }
            other => panic!("Expected AllProvidersFailed, got {other:?}"),
        }
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_failed_reports_most_recent_failure() {
        let synthesizer = CountingSynthesizer::new();
        // The slow provider completes last, so its message is the one
        // surfaced to the caller.
        let slow = StubClient::failing(
            ProviderId::Gemini,
            ProviderError::UpstreamError {
                provider: "Gemini".to_string(),
                status: 500,
                message: "the last diagnostic".to_string(),
            },
        )
        .with_delay(Duration::from_millis(50));

        let orchestrator = ResearchOrchestrator::with_components(
            fast_config(),
            vec![
                StubClient::failing(ProviderId::OpenAi, timeout_error()),
                StubClient::failing(ProviderId::Anthropic, timeout_error()),
                slow,
            ],
            synthesizer,
        );

        let err = orchestrator.research("Rust", &NoProgress).await.unwrap_err();
        match err {
            ResearchError::AllProvidersFailed { message, .. } => {
                assert!(message.contains("the last diagnostic"));
            }
            other => panic!("Expected AllProvidersFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_progress_events_cover_providers_and_synthesis() {
        let synthesizer = CountingSynthesizer::new();
        let observer = RecordingObserver {
            events: Mutex::new(Vec::new()),
        };
        let orchestrator = ResearchOrchestrator::with_components(
            fast_config(),
            vec![
                StubClient::ok(ProviderId::OpenAi, "analysis one"),
                StubClient::failing(ProviderId::Anthropic, timeout_error()),
            ],
            synthesizer,
        );

        orchestrator.research("Rust", &observer).await.unwrap();

        let events = observer.events.lock().unwrap();
        let started = events
            .iter()
            .filter(|e| e.stage == ProgressStage::Started)
            .count();
        // Two providers plus synthesis.
        assert_eq!(started, 3);
        assert!(events.contains(&ProgressEvent::provider(
            ProviderId::OpenAi,
            ProgressStage::Succeeded
        )));
        assert!(events.contains(&ProgressEvent::provider(
            ProviderId::Anthropic,
            ProgressStage::Failed
        )));
        assert!(events.contains(&ProgressEvent::synthesis(ProgressStage::Succeeded)));
    }
}

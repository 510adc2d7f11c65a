use crate::config::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Started,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSource {
    Provider(ProviderId),
    Synthesis,
}

/// One advisory notification from an orchestration run. Consumers may
/// attach at any point; there is no replay of earlier events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub source: ProgressSource,
    pub stage: ProgressStage,
}

impl ProgressEvent {
    pub fn provider(id: ProviderId, stage: ProgressStage) -> Self {
        Self {
            source: ProgressSource::Provider(id),
            stage,
        }
    }

    pub fn synthesis(stage: ProgressStage) -> Self {
        Self {
            source: ProgressSource::Synthesis,
            stage,
        }
    }
}

/// Callback for progress updates during an orchestration run.
///
/// Implementations live in the presentation layer (console, UI, ...).
/// Events are advisory and never influence control flow.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// No-op observer for when progress reporting is not needed.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_event(&self, _event: ProgressEvent) {}
}

use crate::error::ResearchError;
use crate::runner::{OrchestrationOutcome, OverallStatus};
use crate::synthesis::Report;
use std::fs;
use std::path::Path;

/// Render the final artifact handed to the caller: the synthesized body,
/// an advisory contribution note when some providers dropped out, then the
/// disclaimer and generation timestamp.
pub fn render_report(report: &Report, outcome: &OrchestrationOutcome) -> String {
    let mut content = String::new();

    content.push_str(report.body.trim_end());
    content.push('\n');

    if outcome.status == OverallStatus::PartialSuccess {
        let missing: Vec<&str> = outcome
            .failed_providers()
            .iter()
            .map(|p| p.display_name())
            .collect();
        content.push_str(&format!(
            "\n> Note: the following analysts did not contribute to this report: {}.\n",
            missing.join(", ")
        ));
    }

    content.push_str("\n---\n");
    content.push_str(&format!("*{}*\n", report.disclaimer));
    content.push_str(&format!(
        "*Generated: {}*\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    content
}

/// Write a rendered report to disk.
pub fn write_report(path: &Path, content: &str) -> Result<(), ResearchError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderId;
    use crate::runner::ProviderResult;
    use crate::synthesis::DISCLAIMER;
    use std::time::Duration;
    use uuid::Uuid;

    fn result(provider: ProviderId, content: Option<&str>) -> ProviderResult {
        ProviderResult {
            provider,
            content: content.unwrap_or_default().to_string(),
            error: content.is_none().then(|| {
                crate::error::ProviderError::UpstreamTimeout(Duration::from_secs(1))
            }),
            attempts: 1,
            elapsed: Duration::from_millis(10),
        }
    }

    fn outcome(results: Vec<ProviderResult>, status: OverallStatus) -> OrchestrationOutcome {
        OrchestrationOutcome {
            run_id: Uuid::new_v4(),
            topic: "Rust".to_string(),
            results,
            status,
            total_duration: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_render_full_success_has_no_advisory_note() {
        let report = Report::new("Rust", "# Research Report: Rust\n\nBody.");
        let outcome = outcome(
            vec![result(ProviderId::OpenAi, Some("analysis"))],
            OverallStatus::AllSucceeded,
        );

        let rendered = render_report(&report, &outcome);
        assert!(rendered.contains("# Research Report: Rust"));
        assert!(!rendered.contains("did not contribute"));
        assert!(rendered.contains(DISCLAIMER));
        assert!(rendered.contains("*Generated: "));
    }

    #[test]
    fn test_render_partial_success_names_missing_analysts() {
        let report = Report::new("Rust", "Body.");
        let outcome = outcome(
            vec![
                result(ProviderId::OpenAi, None),
                result(ProviderId::Anthropic, Some("analysis")),
                result(ProviderId::Gemini, None),
            ],
            OverallStatus::PartialSuccess,
        );

        let rendered = render_report(&report, &outcome);
        assert!(rendered.contains("OpenAI, Gemini"));
        assert!(!rendered.contains("Claude,"));
    }

    #[test]
    fn test_write_report_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/nested/report.md");
        write_report(&path, "content").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "content");
    }
}

use crate::cli::ResearchArgs;
use crate::config::Config;
use crate::error::ResearchError;
use crate::output::{render_report, write_report};
use crate::runner::{
    NoProgress, ProgressEvent, ProgressObserver, ProgressSource, ProgressStage,
    ResearchOrchestrator,
};
use tracing::{error, info};

/// Prints one line per progress event to stderr, keeping stdout clean for
/// the report itself.
struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_event(&self, event: ProgressEvent) {
        let source = match event.source {
            ProgressSource::Provider(id) => id.display_name(),
            ProgressSource::Synthesis => "Synthesis",
        };
        let stage = match event.stage {
            ProgressStage::Started => "started",
            ProgressStage::Succeeded => "completed",
            ProgressStage::Failed => "failed",
        };
        eprintln!("  {source}: {stage}");
    }
}

pub async fn execute(args: ResearchArgs) -> anyhow::Result<()> {
    info!("Loading config from {:?}", args.config);
    let mut config = Config::load_or_default(&args.config)?;

    // Apply CLI overrides
    if let Some(mode) = args.synthesis.as_deref() {
        config.synthesis.mode = mode
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{e}"))?;
    }

    config.validate()?;

    let orchestrator = ResearchOrchestrator::new(config);

    let progress: &dyn ProgressObserver = if args.quiet {
        &NoProgress
    } else {
        &ConsoleProgress
    };

    match orchestrator.research(&args.topic, progress).await {
        Ok(output) => {
            let rendered = render_report(&output.report, &output.outcome);

            match &args.output {
                Some(path) => {
                    write_report(path, &rendered)?;
                    info!("Report on '{}' written to {:?}", output.report.topic, path);
                }
                None => println!("{rendered}"),
            }

            let failed = output.outcome.failed_providers();
            if !failed.is_empty() {
                let names: Vec<&str> = failed.iter().map(|p| p.display_name()).collect();
                eprintln!(
                    "Note: {} of {} analysts did not contribute: {}",
                    failed.len(),
                    output.outcome.results.len(),
                    names.join(", ")
                );
            }

            info!(
                "Completed in {:.1}s ({})",
                output.outcome.total_duration.as_secs_f64(),
                output.outcome.status
            );
            Ok(())
        }
        Err(ResearchError::SynthesisFailed { message, outcome }) => {
            // No unified report, but the gathered analyses are still worth
            // showing rather than discarding.
            error!("Synthesis failed: {}", message);
            for result in outcome.results.iter().filter(|r| r.succeeded()) {
                println!(
                    "## {} analysis (unsynthesized)\n\n{}\n",
                    result.provider.display_name(),
                    result.content
                );
            }
            anyhow::bail!("synthesis failed: {message}")
        }
        Err(e) => Err(e.into()),
    }
}

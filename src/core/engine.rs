use crate::core::Pipeline;
use crate::domain::model::ReviewOutcome;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct ReviewEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> ReviewEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<ReviewOutcome> {
        tracing::info!("Fetching pull request changes...");
        let files = self.pipeline.fetch().await?;
        tracing::info!("Fetched {} file(s) to review", files.len());
        self.monitor.log_phase("Fetch");

        tracing::info!("Analyzing changed files...");
        let analysis = self.pipeline.analyze(files).await?;
        tracing::info!(
            "Analyzed {} file(s), {} comment(s) drafted",
            analysis.files_reviewed,
            analysis.comments.len()
        );
        self.monitor.log_phase("Analyze");

        tracing::info!("Publishing review comments...");
        let outcome = self.pipeline.publish(analysis).await?;
        tracing::info!("Posted {} comment(s)", outcome.comments_posted);
        self.monitor.log_phase("Publish");

        self.monitor.log_final();
        Ok(outcome)
    }
}

use crate::core::Pipeline;
use crate::render::summary::summary_lines;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// What a finished run reports back to the caller.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: String,
    pub lines: Vec<String>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Runs extract, transform and load.
    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting keg report...");

        tracing::info!("Extracting sheet rows...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Extracted {} rows", raw_data.records.len());
        self.monitor.log_stats("Extract");

        tracing::info!("Building inventory...");
        let report = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "Tracked {} kegs, {} charts, {} notices",
            report.current.len(),
            report.charts.len(),
            report.notices.len()
        );
        self.monitor.log_stats("Transform");
        let lines = summary_lines(&report);

        tracing::info!("Writing dashboard...");
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(RunSummary { output_path, lines })
    }
}

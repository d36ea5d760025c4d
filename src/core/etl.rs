use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::time::Instant;

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

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting vacancy report run");

        // Extract: 切分年度檔案
        let outcome = self.pipeline.extract().await?;
        tracing::info!(
            "📂 Partitioned {} vacancies into {} files ({} rows skipped)",
            outcome.valid_rows,
            outcome.partitions.len(),
            outcome.skipped.total()
        );
        self.monitor.log_phase("extract");

        // Transform
        let statistics = self.pipeline.transform(outcome).await?;
        tracing::info!(
            "📈 Computed statistics for {} years and {} areas",
            statistics.count_by_year.len(),
            statistics.salary_by_area.len()
        );
        self.monitor.log_phase("transform");

        // Load
        let output_path = self.pipeline.load(statistics).await?;
        tracing::info!("📄 Report written to {} in {:?}", output_path, started.elapsed());
        self.monitor.log_phase("load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}

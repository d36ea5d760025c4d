use crate::core::aggregator::ParallelYearAggregator;
use crate::core::assembler;
use crate::core::partitioner::{strip_bom, YearPartitioner};
use crate::core::{ConfigProvider, PartitionOutcome, PdfConverter, Pipeline, ReportStatistics, Storage};
use crate::domain::model::CurrencyTable;
use crate::render::ReportRenderer;
use crate::utils::error::{EtlError, Result};
use std::path::Path;
use std::sync::Arc;

pub const CHART_FILE: &str = "graph.png";
pub const HTML_FILE: &str = "report.html";
pub const STATISTICS_FILE: &str = "statistics.json";

/// Vacancy CSV -> per-year partitions -> statistics -> PDF.
pub struct ReportPipeline<S, C, P>
where
    S: Storage + Clone + 'static,
    C: ConfigProvider,
    P: PdfConverter,
{
    storage: S,
    config: C,
    converter: P,
    currencies: Arc<CurrencyTable>,
}

impl<S, C, P> ReportPipeline<S, C, P>
where
    S: Storage + Clone + 'static,
    C: ConfigProvider,
    P: PdfConverter,
{
    pub fn new(storage: S, config: C, converter: P) -> Self {
        let currencies = Arc::new(config.currency_table());
        Self {
            storage,
            config,
            converter,
            currencies,
        }
    }
}

#[async_trait::async_trait]
impl<S, C, P> Pipeline for ReportPipeline<S, C, P>
where
    S: Storage + Clone + 'static,
    C: ConfigProvider,
    P: PdfConverter,
{
    async fn extract(&self) -> Result<PartitionOutcome> {
        let input_path = self.config.input_path();
        tracing::debug!("Reading {}", input_path);
        let input = tokio::fs::read(input_path).await?;
        if strip_bom(&input).iter().all(u8::is_ascii_whitespace) {
            return Err(EtlError::EmptyInput {
                path: input_path.to_string(),
            });
        }

        self.storage.reset().await?;

        YearPartitioner::new(&self.storage, Arc::clone(&self.currencies))
            .partition(&input, input_path)
            .await
    }

    async fn transform(&self, outcome: PartitionOutcome) -> Result<ReportStatistics> {
        let aggregator = ParallelYearAggregator::new(
            self.storage.clone(),
            Arc::clone(&self.currencies),
            self.config.profession(),
            self.config.worker_count(),
        );
        let results = aggregator.aggregate(&outcome.partitions).await?;
        let yearly = assembler::merge_yearly(results);

        Ok(assembler::assemble(
            self.config.profession(),
            yearly,
            &outcome.area_totals,
        ))
    }

    async fn load(&self, statistics: ReportStatistics) -> Result<String> {
        let renderer = ReportRenderer::from_template_path(self.config.template_path())?;

        let charts = renderer.charts(&statistics).await?;
        self.storage.write_file(CHART_FILE, &charts).await?;

        let json = serde_json::to_string_pretty(&statistics)?;
        self.storage.write_file(STATISTICS_FILE, json.as_bytes()).await?;

        let image_ref = self.storage.locate(CHART_FILE);
        let html = renderer.html(&statistics, &image_ref.to_string_lossy());
        self.storage.write_file(HTML_FILE, html.as_bytes()).await?;
        tracing::debug!("HTML report ({} bytes) written", html.len());

        let output_path = self.config.output_path();
        if let Some(parent) = Path::new(output_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        self.converter
            .convert(&self.storage.locate(HTML_FILE), Path::new(output_path))
            .await?;

        Ok(output_path.to_string())
    }
}

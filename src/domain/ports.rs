use crate::domain::model::{CurrencyTable, PartitionOutcome, ReportStatistics};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Working-directory storage for partition files and report artifacts.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Removes everything under the storage root and recreates it empty.
    fn reset(&self) -> impl std::future::Future<Output = Result<()>> + Send;
    fn locate(&self, path: &str) -> PathBuf;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn work_dir(&self) -> &str;
    fn profession(&self) -> &str;
    fn worker_count(&self) -> usize;
    fn template_path(&self) -> Option<&str>;
    fn pdf_tool(&self) -> &str;
    fn currency_table(&self) -> CurrencyTable;
}

pub trait PdfConverter: Send + Sync {
    fn convert(
        &self,
        html_path: &Path,
        pdf_path: &Path,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<PartitionOutcome>;
    async fn transform(&self, outcome: PartitionOutcome) -> Result<ReportStatistics>;
    async fn load(&self, statistics: ReportStatistics) -> Result<String>;
}

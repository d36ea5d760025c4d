pub mod aggregator;
pub mod assembler;
pub mod etl;
pub mod normalizer;
pub mod partitioner;

pub use crate::domain::model::{PartitionOutcome, ReportStatistics, Vacancy, YearlyStats};
pub use crate::domain::ports::{ConfigProvider, PdfConverter, Pipeline, Storage};
pub use crate::utils::error::Result;

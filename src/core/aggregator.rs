use crate::core::normalizer::{CsvHeader, RecordNormalizer, RowOutcome};
use crate::core::partitioner::strip_bom;
use crate::domain::model::{CurrencyTable, PartitionFile, YearlyStats};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_WORKERS: usize = 16;

/// Computes per-year statistics for every partition on a bounded worker pool.
pub struct ParallelYearAggregator<S: Storage + Clone + 'static> {
    storage: S,
    currencies: Arc<CurrencyTable>,
    profession: Arc<str>,
    workers: usize,
}

impl<S: Storage + Clone + 'static> ParallelYearAggregator<S> {
    pub fn new(storage: S, currencies: Arc<CurrencyTable>, profession: &str, workers: usize) -> Self {
        Self {
            storage,
            currencies,
            profession: Arc::from(profession),
            workers: workers.max(1),
        }
    }

    /// Results come back in completion order; callers sort them.
    /// Every task runs to completion even when another one fails, and the
    /// first failure is returned afterwards.
    pub async fn aggregate(&self, partitions: &[PartitionFile]) -> Result<Vec<(PartitionFile, YearlyStats)>> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        tracing::debug!(
            "Aggregating {} partitions with {} workers",
            partitions.len(),
            self.workers
        );

        for partition in partitions.iter().cloned() {
            let storage = self.storage.clone();
            let currencies = Arc::clone(&self.currencies);
            let profession = Arc::clone(&self.profession);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| EtlError::TaskFailed { message: e.to_string() })?;

                tracing::debug!("start: {}", partition.file_name);
                let data = storage.read_file(&partition.file_name).await?;

                // CSV 解析屬於 CPU 工作，交給 blocking pool
                let summarized = tokio::task::spawn_blocking(move || {
                    let stats = summarize_partition(&partition, &data, &currencies, &profession);
                    stats.map(|stats| (partition, stats))
                })
                .await
                .map_err(|e| EtlError::TaskFailed { message: e.to_string() })??;

                tracing::debug!("stop: {}", summarized.0.file_name);
                Ok::<_, EtlError>(summarized)
            });
        }

        let mut results = Vec::with_capacity(partitions.len());
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| EtlError::TaskFailed { message: e.to_string() })
                .and_then(|result| result);
            match outcome {
                Ok(summary) => results.push(summary),
                Err(e) => {
                    tracing::error!("❌ Partition aggregation failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }
}

/// Counts and mean salaries of one partition, all rows and the
/// profession-matching subset.
pub fn summarize_partition(
    partition: &PartitionFile,
    data: &[u8],
    currencies: &Arc<CurrencyTable>,
    profession: &str,
) -> Result<YearlyStats> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(strip_bom(data));
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => CsvHeader::from_record(&record?)?,
        None => {
            return Err(EtlError::EmptyPartition {
                year: partition.year,
                file: partition.file_name.clone(),
            })
        }
    };
    let normalizer = RecordNormalizer::new(header, Arc::clone(currencies)).with_profession(profession);

    let mut count = 0usize;
    let mut salary_sum = 0.0;
    let mut count_filtered = 0usize;
    let mut salary_sum_filtered = 0.0;

    for record in records {
        let record = record?;
        let vacancy = match normalizer.normalize(&record)? {
            RowOutcome::Vacancy(vacancy) => vacancy,
            RowOutcome::Skipped(_) => continue,
        };
        count += 1;
        salary_sum += vacancy.salary.midpoint_rub;
        if vacancy.matches_profession {
            count_filtered += 1;
            salary_sum_filtered += vacancy.salary.midpoint_rub;
        }
    }

    if count == 0 {
        return Err(EtlError::EmptyPartition {
            year: partition.year,
            file: partition.file_name.clone(),
        });
    }

    let mean_salary_filtered = if count_filtered == 0 {
        tracing::debug!("No '{}' vacancies in {}", profession, partition.year);
        0.0
    } else {
        salary_sum_filtered / count_filtered as f64
    };

    Ok(YearlyStats {
        year: partition.year,
        count,
        mean_salary: salary_sum / count as f64,
        count_filtered,
        mean_salary_filtered,
    })
}

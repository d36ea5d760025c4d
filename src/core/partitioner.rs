use crate::core::normalizer::{CsvHeader, RecordNormalizer, RowDefect, RowOutcome};
use crate::domain::model::{AreaTotals, CurrencyTable, PartitionFile, PartitionOutcome, SkippedRows};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::sync::Arc;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}

pub fn partition_file_name(year: i32, repeat: usize) -> String {
    if repeat == 0 {
        format!("file_{}.csv", year)
    } else {
        format!("file_{}_{}.csv", year, repeat)
    }
}

/// Splits the input into one CSV per run of equal publication years.
///
/// Rows are never re-sorted: an input where years interleave produces one
/// partition per run, so the same year can appear in several files.
pub struct YearPartitioner<'a, S: Storage> {
    storage: &'a S,
    currencies: Arc<CurrencyTable>,
}

struct PendingYear {
    year: i32,
    rows: Vec<StringRecord>,
}

impl<'a, S: Storage> YearPartitioner<'a, S> {
    pub fn new(storage: &'a S, currencies: Arc<CurrencyTable>) -> Self {
        Self { storage, currencies }
    }

    pub async fn partition(&self, input: &[u8], source: &str) -> Result<PartitionOutcome> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(strip_bom(input));
        let mut records = reader.records();

        let header_record = match records.next() {
            Some(record) => record?,
            None => {
                return Err(EtlError::EmptyInput {
                    path: source.to_string(),
                })
            }
        };
        let header = CsvHeader::from_record(&header_record)?;
        let normalizer = RecordNormalizer::new(header.clone(), Arc::clone(&self.currencies));

        let mut area_totals = AreaTotals::new();
        let mut skipped = SkippedRows::default();
        let mut partitions = Vec::new();
        let mut flushed_years: HashMap<i32, usize> = HashMap::new();
        let mut pending: Option<PendingYear> = None;
        let mut valid_rows = 0;

        for record in records {
            let record = record?;
            let vacancy = match normalizer.normalize(&record)? {
                RowOutcome::Vacancy(vacancy) => vacancy,
                RowOutcome::Skipped(defect) => {
                    tracing::trace!("Skipping line {:?}: {:?}", record.position().map(|p| p.line()), defect);
                    count_defect(&mut skipped, &defect);
                    continue;
                }
            };
            valid_rows += 1;
            area_totals.accumulate(&vacancy.area_name, vacancy.salary.midpoint_rub);

            let same_year = pending.as_ref().map_or(false, |p| p.year == vacancy.year);
            if same_year {
                if let Some(current) = pending.as_mut() {
                    current.rows.push(record);
                }
                continue;
            }

            if let Some(finished) = pending.take() {
                let file = self.flush(&header, finished, &mut flushed_years, partitions.len()).await?;
                partitions.push(file);
            }
            pending = Some(PendingYear {
                year: vacancy.year,
                rows: vec![record],
            });
        }

        match pending.take() {
            Some(finished) => {
                let file = self.flush(&header, finished, &mut flushed_years, partitions.len()).await?;
                partitions.push(file);
            }
            None => {
                tracing::warn!("No valid vacancy rows in {} ({} skipped)", source, skipped.total());
                return Err(EtlError::EmptyInput {
                    path: source.to_string(),
                });
            }
        }

        if skipped.total() > 0 {
            tracing::info!(
                "⚠️ Skipped {} malformed rows (length: {}, empty: {}, number: {}, year: {})",
                skipped.total(),
                skipped.length_mismatch,
                skipped.empty_field,
                skipped.invalid_number,
                skipped.invalid_year
            );
        }

        Ok(PartitionOutcome {
            header: header.names().to_vec(),
            partitions,
            area_totals,
            valid_rows,
            skipped,
        })
    }

    async fn flush(
        &self,
        header: &CsvHeader,
        pending: PendingYear,
        flushed_years: &mut HashMap<i32, usize>,
        sequence: usize,
    ) -> Result<PartitionFile> {
        let repeat = flushed_years.entry(pending.year).or_insert(0);
        let file_name = partition_file_name(pending.year, *repeat);
        if *repeat > 0 {
            tracing::warn!(
                "Year {} appears again after other years; writing extra partition {}",
                pending.year,
                file_name
            );
        }
        *repeat += 1;

        let data = {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(&header.to_record())?;
            for row in &pending.rows {
                writer.write_record(row)?;
            }
            writer
                .into_inner()
                .map_err(|e| EtlError::IoError(e.into_error()))?
        };

        self.storage.write_file(&file_name, &data).await?;
        tracing::info!("💾 Saved {} ({} rows)", file_name, pending.rows.len());

        Ok(PartitionFile {
            year: pending.year,
            sequence,
            file_name,
            rows: pending.rows.len(),
        })
    }
}

fn count_defect(skipped: &mut SkippedRows, defect: &RowDefect) {
    match defect {
        RowDefect::LengthMismatch { .. } => skipped.length_mismatch += 1,
        RowDefect::EmptyField { .. } => skipped.empty_field += 1,
        RowDefect::InvalidNumber { .. } => skipped.invalid_number += 1,
        RowDefect::InvalidYear { .. } => skipped.invalid_year += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MemoryStorage {
        fn file(&self, name: &str) -> Option<String> {
            let files = self.files.lock().unwrap();
            files.get(name).map(|data| String::from_utf8(data.clone()).unwrap())
        }

        fn names(&self) -> Vec<String> {
            let files = self.files.lock().unwrap();
            let mut names: Vec<String> = files.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MemoryStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().unwrap();
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().unwrap();
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn reset(&self) -> Result<()> {
            self.files.lock().unwrap().clear();
            Ok(())
        }

        fn locate(&self, path: &str) -> std::path::PathBuf {
            std::path::PathBuf::from(path)
        }
    }

    const HEADER: &str = "name,salary_from,salary_to,salary_currency,area_name,published_at\n";

    async fn run(storage: &MemoryStorage, body: &str) -> Result<PartitionOutcome> {
        let input = format!("{}{}", HEADER, body);
        YearPartitioner::new(storage, Arc::new(CurrencyTable::default()))
            .partition(input.as_bytes(), "test.csv")
            .await
    }

    #[tokio::test]
    async fn test_sorted_input_gets_one_file_per_year() {
        let storage = MemoryStorage::default();
        let outcome = run(
            &storage,
            "Analyst,10,20,RUR,Moscow,2019-01-01\n\
             Engineer,30,50,USD,Moscow,2019-06-01\n\
             Analyst,100,200,RUR,Kazan,2020-01-01\n",
        )
        .await
        .unwrap();

        let names: Vec<&str> = outcome.partitions.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["file_2019.csv", "file_2020.csv"]);
        assert_eq!(outcome.partitions[0].rows, 2);
        assert_eq!(outcome.valid_rows, 3);
        assert_eq!(storage.names(), vec!["file_2019.csv", "file_2020.csv"]);

        let content = storage.file("file_2020.csv").unwrap();
        assert!(content.starts_with("name,salary_from"));
        assert!(content.contains("Kazan"));
    }

    #[tokio::test]
    async fn test_area_totals_cover_every_valid_row() {
        let storage = MemoryStorage::default();
        let outcome = run(
            &storage,
            "Analyst,10,20,RUR,Moscow,2019-01-01\n\
             Engineer,30,50,USD,Moscow,2019-06-01\n\
             Analyst,,200,RUR,Kazan,2020-01-01\n\
             Analyst,100,200,RUR,Kazan,2020-01-01\n",
        )
        .await
        .unwrap();

        let moscow = outcome.area_totals.get("Moscow").unwrap();
        assert_eq!(moscow.count, 2);
        assert!((moscow.salary_sum - (15.0 + 60.66 * 40.0)).abs() < 1e-6);
        assert_eq!(outcome.area_totals.get("Kazan").unwrap().count, 1);
        assert_eq!(outcome.skipped.empty_field, 1);
    }

    #[tokio::test]
    async fn test_interleaved_years_split_into_extra_files() {
        let storage = MemoryStorage::default();
        let outcome = run(
            &storage,
            "Analyst,10,20,RUR,Moscow,2019-01-01\n\
             Analyst,10,20,RUR,Moscow,2020-01-01\n\
             Analyst,10,20,RUR,Moscow,2019-02-01\n",
        )
        .await
        .unwrap();

        let names: Vec<&str> = outcome.partitions.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["file_2019.csv", "file_2020.csv", "file_2019_1.csv"]);
        assert_eq!(outcome.partitions[2].sequence, 2);
    }

    #[tokio::test]
    async fn test_partitioning_is_repeatable() {
        let body = "Analyst,10,20,RUR,Moscow,2019-01-01\nAnalyst,30,40,EUR,Kazan,2020-01-01\n";
        let first_storage = MemoryStorage::default();
        let second_storage = MemoryStorage::default();

        let first = run(&first_storage, body).await.unwrap();
        let second = run(&second_storage, body).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first_storage.file("file_2020.csv"), second_storage.file("file_2020.csv"));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let storage = MemoryStorage::default();
        let err = YearPartitioner::new(&storage, Arc::new(CurrencyTable::default()))
            .partition(b"", "empty.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::EmptyInput { .. }));

        let err = run(&storage, "Analyst,,20,RUR,Moscow,2019-01-01\n").await.unwrap_err();
        assert!(matches!(err, EtlError::EmptyInput { .. }));
    }

    #[tokio::test]
    async fn test_bom_is_stripped_from_header() {
        let storage = MemoryStorage::default();
        let input = format!("\u{feff}{}Analyst,10,20,RUR,Moscow,2019-01-01\n", HEADER);
        let outcome = YearPartitioner::new(&storage, Arc::new(CurrencyTable::default()))
            .partition(input.as_bytes(), "bom.csv")
            .await
            .unwrap();
        assert_eq!(outcome.header[0], "name");
    }

    #[tokio::test]
    async fn test_unknown_currency_aborts_partitioning() {
        let storage = MemoryStorage::default();
        let err = run(&storage, "Analyst,10,20,JPY,Moscow,2019-01-01\n").await.unwrap_err();
        assert!(matches!(err, EtlError::UnknownCurrency { ref code, line: 2 } if code == "JPY"));
    }
}

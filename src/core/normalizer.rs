use crate::domain::model::{CurrencyTable, SalaryInfo, Vacancy};
use crate::utils::error::{EtlError, Result};
use csv::StringRecord;
use std::sync::Arc;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "salary_from",
    "salary_to",
    "salary_currency",
    "published_at",
    "area_name",
    "name",
];

/// Header row with the positions of every column the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvHeader {
    names: Vec<String>,
    salary_from: usize,
    salary_to: usize,
    salary_currency: usize,
    published_at: usize,
    area_name: usize,
    name: usize,
}

impl CsvHeader {
    pub fn from_record(record: &StringRecord) -> Result<Self> {
        let names: Vec<String> = record.iter().map(|field| field.trim().to_string()).collect();
        let position = |column: &str| {
            names
                .iter()
                .position(|name| name == column)
                .ok_or_else(|| EtlError::MissingColumn {
                    column: column.to_string(),
                })
        };

        Ok(Self {
            salary_from: position("salary_from")?,
            salary_to: position("salary_to")?,
            salary_currency: position("salary_currency")?,
            published_at: position("published_at")?,
            area_name: position("area_name")?,
            name: position("name")?,
            names,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    pub fn to_record(&self) -> StringRecord {
        StringRecord::from(self.names.clone())
    }
}

/// Why a row was dropped instead of becoming a vacancy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDefect {
    LengthMismatch { expected: usize, found: usize },
    EmptyField { column: String },
    InvalidNumber { column: String, value: String },
    InvalidYear { value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Vacancy(Vacancy),
    Skipped(RowDefect),
}

#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    header: CsvHeader,
    currencies: Arc<CurrencyTable>,
    profession: Option<String>,
}

impl RecordNormalizer {
    pub fn new(header: CsvHeader, currencies: Arc<CurrencyTable>) -> Self {
        Self {
            header,
            currencies,
            profession: None,
        }
    }

    pub fn with_profession(mut self, profession: impl Into<String>) -> Self {
        self.profession = Some(profession.into());
        self
    }

    /// Malformed rows come back as `RowOutcome::Skipped`; only an unknown
    /// currency is an error.
    pub fn normalize(&self, row: &StringRecord) -> Result<RowOutcome> {
        if row.len() != self.header.column_count() {
            return Ok(RowOutcome::Skipped(RowDefect::LengthMismatch {
                expected: self.header.column_count(),
                found: row.len(),
            }));
        }
        if let Some(index) = row.iter().position(str::is_empty) {
            return Ok(RowOutcome::Skipped(RowDefect::EmptyField {
                column: self.header.names[index].clone(),
            }));
        }

        let from = match parse_floored(&row[self.header.salary_from]) {
            Some(value) => value,
            None => return Ok(invalid_number("salary_from", &row[self.header.salary_from])),
        };
        let to = match parse_floored(&row[self.header.salary_to]) {
            Some(value) => value,
            None => return Ok(invalid_number("salary_to", &row[self.header.salary_to])),
        };

        let published_at = &row[self.header.published_at];
        let year = match extract_year(published_at) {
            Some(year) => year,
            None => {
                return Ok(RowOutcome::Skipped(RowDefect::InvalidYear {
                    value: published_at.to_string(),
                }))
            }
        };

        let currency = &row[self.header.salary_currency];
        let rate = self
            .currencies
            .rate(currency)
            .ok_or_else(|| EtlError::UnknownCurrency {
                code: currency.to_string(),
                line: row.position().map(|p| p.line()).unwrap_or(0),
            })?;

        let name = &row[self.header.name];
        let matches_profession = self
            .profession
            .as_deref()
            .map(|profession| name.contains(profession))
            .unwrap_or(false);

        Ok(RowOutcome::Vacancy(Vacancy {
            name: name.to_string(),
            area_name: row[self.header.area_name].to_string(),
            salary: SalaryInfo {
                from,
                to,
                currency: currency.to_string(),
                midpoint_rub: rate * (from as f64 + to as f64) / 2.0,
            },
            year,
            matches_profession,
        }))
    }
}

fn invalid_number(column: &str, value: &str) -> RowOutcome {
    RowOutcome::Skipped(RowDefect::InvalidNumber {
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// 超出 i64 範圍的金額視為格式錯誤，不做飽和轉換
fn parse_floored(value: &str) -> Option<i64> {
    let parsed: f64 = value.trim().parse().ok()?;
    let floored = parsed.floor();
    if !floored.is_finite() || floored < i64::MIN as f64 || floored >= i64::MAX as f64 {
        return None;
    }
    Some(floored as i64)
}

/// 年份取發布日期前四個字元
pub fn extract_year(published_at: &str) -> Option<i32> {
    let prefix: String = published_at.chars().take(4).collect();
    if prefix.chars().count() < 4 {
        return None;
    }
    prefix.parse().ok()
}

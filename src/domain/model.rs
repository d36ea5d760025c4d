use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Fixed conversion table from currency code to roubles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyTable {
    rates: BTreeMap<String, f64>,
}

impl CurrencyTable {
    pub fn new(rates: BTreeMap<String, f64>) -> Self {
        Self { rates }
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// 以覆寫值建立新表，未覆寫的幣別保留原匯率
    pub fn with_overrides(&self, overrides: &HashMap<String, f64>) -> Self {
        let mut rates = self.rates.clone();
        for (code, rate) in overrides {
            rates.insert(code.clone(), *rate);
        }
        Self { rates }
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for CurrencyTable {
    fn default() -> Self {
        let rates = [
            ("AZN", 35.68),
            ("BYR", 23.91),
            ("EUR", 59.90),
            ("GEL", 21.74),
            ("KGS", 0.76),
            ("KZT", 0.13),
            ("RUR", 1.0),
            ("UAH", 1.64),
            ("USD", 60.66),
            ("UZS", 0.0055),
        ]
        .into_iter()
        .map(|(code, rate)| (code.to_string(), rate))
        .collect();
        Self { rates }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalaryInfo {
    pub from: i64,
    pub to: i64,
    pub currency: String,
    pub midpoint_rub: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vacancy {
    pub name: String,
    pub area_name: String,
    pub salary: SalaryInfo,
    pub year: i32,
    pub matches_profession: bool,
}

/// One per-year CSV written by the partitioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionFile {
    pub year: i32,
    /// Flush order; later partitions of a repeated year have a higher value.
    pub sequence: usize,
    pub file_name: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AreaTotal {
    pub salary_sum: f64,
    pub count: u64,
}

/// Running salary sums and counts per area, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaTotals {
    index: HashMap<String, usize>,
    entries: Vec<(String, AreaTotal)>,
}

impl AreaTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, area: &str, salary: f64) {
        let slot = match self.index.get(area) {
            Some(&slot) => slot,
            None => {
                self.entries.push((area.to_string(), AreaTotal::default()));
                self.index.insert(area.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        let total = &mut self.entries[slot].1;
        total.salary_sum += salary;
        total.count += 1;
    }

    pub fn get(&self, area: &str) -> Option<&AreaTotal> {
        self.index.get(area).map(|&slot| &self.entries[slot].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AreaTotal)> {
        self.entries.iter().map(|(area, total)| (area.as_str(), total))
    }

    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|(_, total)| total.count).sum()
    }

    pub fn area_count(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkippedRows {
    pub length_mismatch: usize,
    pub empty_field: usize,
    pub invalid_number: usize,
    pub invalid_year: usize,
}

impl SkippedRows {
    pub fn total(&self) -> usize {
        self.length_mismatch + self.empty_field + self.invalid_number + self.invalid_year
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionOutcome {
    pub header: Vec<String>,
    pub partitions: Vec<PartitionFile>,
    pub area_totals: AreaTotals,
    pub valid_rows: usize,
    pub skipped: SkippedRows,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyStats {
    pub year: i32,
    pub count: usize,
    pub mean_salary: f64,
    pub count_filtered: usize,
    pub mean_salary_filtered: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaStats {
    pub area: String,
    pub mean_salary: f64,
    pub share: f64,
}

/// Finished statistics handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportStatistics {
    pub profession: String,
    pub count_by_year: Vec<(i32, usize)>,
    pub count_filtered_by_year: Vec<(i32, usize)>,
    pub salary_by_year: Vec<(i32, f64)>,
    pub salary_filtered_by_year: Vec<(i32, f64)>,
    pub salary_by_area: Vec<AreaStats>,
    pub share_by_area: Vec<AreaStats>,
}

impl ReportStatistics {
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.count_by_year.iter().map(|(year, _)| *year)
    }
}

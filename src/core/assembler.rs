use crate::domain::model::{AreaStats, AreaTotals, PartitionFile, ReportStatistics, YearlyStats};
use std::collections::BTreeMap;

pub const AREA_SHARE_THRESHOLD: f64 = 0.01;
pub const TOP_AREAS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct AreaViews {
    pub by_salary: Vec<AreaStats>,
    pub by_share: Vec<AreaStats>,
}

/// Orders yearly results by year. When a year was split into several
/// partitions the one flushed last is kept.
pub fn merge_yearly(mut results: Vec<(PartitionFile, YearlyStats)>) -> Vec<YearlyStats> {
    results.sort_by_key(|(partition, _)| (partition.year, partition.sequence));

    let mut by_year: BTreeMap<i32, YearlyStats> = BTreeMap::new();
    for (partition, stats) in results {
        if by_year.insert(partition.year, stats).is_some() {
            tracing::warn!(
                "Year {} has more than one partition; keeping {}",
                partition.year,
                partition.file_name
            );
        }
    }
    by_year.into_values().collect()
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Every area above the share threshold, in first-seen order.
pub fn retained_areas(totals: &AreaTotals) -> Vec<AreaStats> {
    let total = totals.total_count();
    if total == 0 {
        return Vec::new();
    }

    totals
        .iter()
        .filter(|(_, area)| area.count as f64 / total as f64 > AREA_SHARE_THRESHOLD)
        .map(|(name, area)| AreaStats {
            area: name.to_string(),
            mean_salary: if area.count == 0 {
                0.0
            } else {
                area.salary_sum / area.count as f64
            },
            share: round_to(area.count as f64 / total as f64, 4),
        })
        .collect()
}

/// Stable descending sort, truncated to `limit`.
pub fn top_descending<F>(mut areas: Vec<AreaStats>, limit: usize, key: F) -> Vec<AreaStats>
where
    F: Fn(&AreaStats) -> f64,
{
    areas.sort_by(|a, b| key(b).total_cmp(&key(a)));
    areas.truncate(limit);
    areas
}

pub fn area_views(totals: &AreaTotals) -> AreaViews {
    let retained = retained_areas(totals);
    tracing::debug!(
        "{} of {} areas above the {}% share threshold",
        retained.len(),
        totals.area_count(),
        AREA_SHARE_THRESHOLD * 100.0
    );

    AreaViews {
        by_salary: top_descending(retained.clone(), TOP_AREAS, |a| a.mean_salary),
        by_share: top_descending(retained, TOP_AREAS, |a| a.share),
    }
}

pub fn assemble(profession: &str, yearly: Vec<YearlyStats>, totals: &AreaTotals) -> ReportStatistics {
    let views = area_views(totals);

    ReportStatistics {
        profession: profession.to_string(),
        count_by_year: yearly.iter().map(|s| (s.year, s.count)).collect(),
        count_filtered_by_year: yearly.iter().map(|s| (s.year, s.count_filtered)).collect(),
        salary_by_year: yearly.iter().map(|s| (s.year, s.mean_salary)).collect(),
        salary_filtered_by_year: yearly
            .iter()
            .map(|s| (s.year, s.mean_salary_filtered))
            .collect(),
        salary_by_area: views.by_salary,
        share_by_area: views.by_share,
    }
}

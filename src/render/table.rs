use crate::domain::model::ReportStatistics;

/// Header row plus body rows, cells already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn format_salary(value: f64) -> String {
    format!("{}", value.floor() as i64)
}

pub fn format_percent(share: f64) -> String {
    format!("{:.2}%", share * 100.0)
}

pub fn years_table(stats: &ReportStatistics) -> Table {
    let headers = vec![
        "Year".to_string(),
        "Average salary".to_string(),
        format!("Average salary - {}", stats.profession),
        "Vacancy count".to_string(),
        format!("Vacancy count - {}", stats.profession),
    ];

    let rows = stats
        .salary_by_year
        .iter()
        .zip(&stats.salary_filtered_by_year)
        .zip(stats.count_by_year.iter().zip(&stats.count_filtered_by_year))
        .map(|(((year, salary), (_, salary_filtered)), ((_, count), (_, count_filtered)))| {
            vec![
                year.to_string(),
                format_salary(*salary),
                format_salary(*salary_filtered),
                count.to_string(),
                count_filtered.to_string(),
            ]
        })
        .collect();

    Table { headers, rows }
}

/// Salary ranking and share ranking side by side, separated by a blank column.
pub fn cities_table(stats: &ReportStatistics) -> Table {
    let headers = vec![
        "City".to_string(),
        "Salary level".to_string(),
        String::new(),
        "City".to_string(),
        "Vacancy share".to_string(),
    ];

    let height = stats.salary_by_area.len().max(stats.share_by_area.len());
    let rows = (0..height)
        .map(|i| {
            let (salary_area, salary) = stats
                .salary_by_area
                .get(i)
                .map(|a| (a.area.clone(), format_salary(a.mean_salary)))
                .unwrap_or_default();
            let (share_area, share) = stats
                .share_by_area
                .get(i)
                .map(|a| (a.area.clone(), format_percent(a.share)))
                .unwrap_or_default();
            vec![salary_area, salary, String::new(), share_area, share]
        })
        .collect();

    Table { headers, rows }
}

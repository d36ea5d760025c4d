//! Presentation layer: charts, tables, HTML and PDF.
//!
//! Nothing here aggregates; it only formats a finished [`ReportStatistics`].

pub mod chart;
pub mod pdf;
pub mod table;
pub mod template;

use crate::domain::model::ReportStatistics;
use crate::utils::error::Result;
use std::collections::HashMap;
use table::Table;
use template::HtmlTemplate;

pub use pdf::WkHtmlToPdf;

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn header_cells(table: &Table) -> String {
    table
        .headers
        .iter()
        .map(|h| {
            if h.is_empty() {
                r#"<th class="gap"></th>"#.to_string()
            } else {
                format!("<th>{}</th>", escape_html(h))
            }
        })
        .collect()
}

fn body_rows(table: &Table, gap_column: Option<usize>) -> String {
    table
        .rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    if Some(i) == gap_column {
                        r#"<td class="gap"></td>"#.to_string()
                    } else {
                        format!("<td>{}</td>", escape_html(cell))
                    }
                })
                .collect();
            format!("<tr>{}</tr>\n", cells)
        })
        .collect()
}

pub struct ReportRenderer {
    template: HtmlTemplate,
}

impl ReportRenderer {
    pub fn new(template: HtmlTemplate) -> Self {
        Self { template }
    }

    pub fn from_template_path(path: Option<&str>) -> Result<Self> {
        let template = match path {
            Some(path) => {
                tracing::debug!("Loading report template from {}", path);
                HtmlTemplate::from_file(path)?
            }
            None => HtmlTemplate::builtin()?,
        };
        Ok(Self::new(template))
    }

    pub async fn charts(&self, stats: &ReportStatistics) -> Result<Vec<u8>> {
        chart::render_png(stats).await
    }

    pub fn html(&self, stats: &ReportStatistics, image_ref: &str) -> String {
        let years = table::years_table(stats);
        let cities = table::cities_table(stats);

        let mut values: HashMap<&str, String> = HashMap::new();
        values.insert(
            "prof_name",
            escape_html(&format!(
                "Salary and city analytics for profession {}",
                stats.profession
            )),
        );
        values.insert("image_name", escape_html(image_ref));
        values.insert("year_head", "Statistics by year".to_string());
        values.insert("city_head", "Statistics by city".to_string());
        values.insert("years_headers", header_cells(&years));
        values.insert("years_rows", body_rows(&years, None));
        values.insert("cities_headers", header_cells(&cities));
        values.insert("cities_rows", body_rows(&cities, Some(2)));
        values.insert("count_columns", cities.headers.len().to_string());
        values.insert(
            "generated_at",
            chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
        );

        self.template.render(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AreaStats;

    fn statistics() -> ReportStatistics {
        ReportStatistics {
            profession: "Analyst".to_string(),
            count_by_year: vec![(2020, 2)],
            count_filtered_by_year: vec![(2020, 1)],
            salary_by_year: vec![(2020, 1220.7)],
            salary_filtered_by_year: vec![(2020, 15.0)],
            salary_by_area: vec![AreaStats {
                area: "Moscow".to_string(),
                mean_salary: 1220.7,
                share: 1.0,
            }],
            share_by_area: vec![AreaStats {
                area: "Moscow".to_string(),
                mean_salary: 1220.7,
                share: 1.0,
            }],
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">R&D</a>"#), "&lt;a href=&quot;x&quot;&gt;R&amp;D&lt;/a&gt;");
    }

    #[test]
    fn test_html_fills_every_slot() {
        let renderer = ReportRenderer::from_template_path(None).unwrap();
        let html = renderer.html(&statistics(), "/tmp/work/graph.png");

        assert!(!html.contains("{{"));
        assert!(html.contains("Salary and city analytics for profession Analyst"));
        assert!(html.contains(r#"src="/tmp/work/graph.png""#));
        assert!(html.contains("<td>1220</td>"));
        assert!(html.contains("<td>100.00%</td>"));
        assert!(html.contains("<th>Average salary - Analyst</th>"));
    }
}

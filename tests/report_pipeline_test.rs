use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use vacancy_report::core::{PdfConverter, Pipeline};
use vacancy_report::domain::model::ReportStatistics;
use vacancy_report::{EtlEngine, EtlError, LocalStorage, ReportPipeline, Result, TomlConfig};

/// Stands in for wkhtmltopdf: copies the HTML to the PDF path.
#[derive(Clone, Default)]
struct CopyConverter {
    calls: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
}

impl PdfConverter for CopyConverter {
    async fn convert(&self, html_path: &Path, pdf_path: &Path) -> Result<()> {
        tokio::fs::copy(html_path, pdf_path).await?;
        self.calls
            .lock()
            .unwrap()
            .push((html_path.to_path_buf(), pdf_path.to_path_buf()));
        Ok(())
    }
}

const HEADER: &str = "name,salary_from,salary_to,salary_currency,area_name,published_at\n";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("vacancies.csv"), format!("{}{}", HEADER, body)).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self, extra: &str) -> TomlConfig {
        let toml = format!(
            r#"
[report]
input = "{input}"
output = "{output}"
profession = "Analyst"

[processing]
work_dir = "{work_dir}"
workers = 2
{extra}
"#,
            input = self.path("vacancies.csv").display(),
            output = self.path("out/report.pdf").display(),
            work_dir = self.path("csv").display(),
            extra = extra,
        );
        TomlConfig::from_toml_str(&toml).unwrap()
    }

    fn pipeline(&self, extra: &str, converter: CopyConverter) -> ReportPipeline<LocalStorage, TomlConfig, CopyConverter> {
        let storage = LocalStorage::new(self.path("csv"));
        ReportPipeline::new(storage, self.config(extra), converter)
    }
}

#[tokio::test]
async fn test_end_to_end_report_for_two_years() {
    let fixture = Fixture::new(
        "Analyst,10,20,RUR,Moscow,2020-01-10T10:00:00+0300\n\
         Engineer,30,50,USD,Moscow,2020-03-01T10:00:00+0300\n\
         Data Analyst,100,200,EUR,Kazan,2021-02-01T10:00:00+0300\n\
         Driver,40,60,RUR,Kazan,2021-05-01T10:00:00+0300\n\
         Driver,,60,RUR,Kazan,2021-05-02T10:00:00+0300\n",
    );
    let converter = CopyConverter::default();
    let engine = EtlEngine::new(fixture.pipeline("", converter.clone()));

    let output = engine.run().await.unwrap();
    assert_eq!(PathBuf::from(&output), fixture.path("out/report.pdf"));
    assert_eq!(converter.calls.lock().unwrap().len(), 1);

    let report = std::fs::read_to_string(fixture.path("out/report.pdf")).unwrap();
    assert!(report.contains("Salary and city analytics for profession Analyst"));
    assert!(report.contains("graph.png"));

    let stats: ReportStatistics = serde_json::from_str(
        &std::fs::read_to_string(fixture.path("csv/statistics.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(stats.count_by_year, vec![(2020, 2), (2021, 2)]);
    assert_eq!(stats.count_filtered_by_year, vec![(2020, 1), (2021, 1)]);
    assert!((stats.salary_by_year[0].1 - 1220.7).abs() < 1e-6);
    assert!((stats.salary_filtered_by_year[1].1 - 59.90 * 150.0).abs() < 1e-6);
    assert_eq!(stats.share_by_area.len(), 2);
    assert_eq!(stats.share_by_area[0].share, 0.5);

    assert!(fixture.path("csv/file_2020.csv").exists());
    assert!(fixture.path("csv/file_2021.csv").exists());
    let chart = std::fs::read(fixture.path("csv/graph.png")).unwrap();
    assert!(chart.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[tokio::test]
async fn test_rerun_wipes_previous_partitions() {
    let fixture = Fixture::new("Analyst,10,20,RUR,Moscow,2020-01-10\n");
    std::fs::create_dir_all(fixture.path("csv")).unwrap();
    std::fs::write(fixture.path("csv/file_1999.csv"), "stale").unwrap();

    let pipeline = fixture.pipeline("", CopyConverter::default());
    let first = pipeline.extract().await.unwrap();
    let second = pipeline.extract().await.unwrap();

    assert_eq!(first, second);
    assert!(!fixture.path("csv/file_1999.csv").exists());
    assert!(fixture.path("csv/file_2020.csv").exists());
}

#[tokio::test]
async fn test_empty_input_file_fails() {
    let fixture = Fixture::new("");
    std::fs::write(fixture.path("vacancies.csv"), "").unwrap();

    let pipeline = fixture.pipeline("", CopyConverter::default());
    let err = pipeline.extract().await.unwrap_err();
    assert!(matches!(err, EtlError::EmptyInput { .. }));
}

#[tokio::test]
async fn test_unknown_currency_aborts_without_report() {
    let fixture = Fixture::new("Analyst,10,20,JPY,Moscow,2020-01-10\n");
    let converter = CopyConverter::default();
    let engine = EtlEngine::new(fixture.pipeline("", converter.clone()));

    let err = engine.run().await.unwrap_err();
    assert!(matches!(err, EtlError::UnknownCurrency { ref code, .. } if code == "JPY"));
    assert!(converter.calls.lock().unwrap().is_empty());
    assert!(!fixture.path("out/report.pdf").exists());
}

#[tokio::test]
async fn test_currency_section_adds_rates() {
    let fixture = Fixture::new("Analyst,10,20,JPY,Moscow,2020-01-10\n");
    let pipeline = fixture.pipeline("\n[currency]\nJPY = 0.5\n", CopyConverter::default());

    let outcome = pipeline.extract().await.unwrap();
    let stats = pipeline.transform(outcome).await.unwrap();
    assert!((stats.salary_by_year[0].1 - 7.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_interleaved_years_keep_last_partition() {
    let fixture = Fixture::new(
        "Analyst,10,20,RUR,Moscow,2019-01-10\n\
         Analyst,10,20,RUR,Moscow,2020-01-10\n\
         Analyst,100,200,RUR,Moscow,2019-06-10\n\
         Analyst,100,200,RUR,Moscow,2019-07-10\n",
    );
    let pipeline = fixture.pipeline("", CopyConverter::default());

    let outcome = pipeline.extract().await.unwrap();
    assert_eq!(outcome.partitions.len(), 3);
    assert!(fixture.path("csv/file_2019_1.csv").exists());

    let stats = pipeline.transform(outcome).await.unwrap();
    assert_eq!(stats.count_by_year, vec![(2019, 2), (2020, 1)]);
}

pub mod cli;
pub mod toml_config;

use crate::core::aggregator::DEFAULT_WORKERS;
use crate::core::ConfigProvider;
use crate::domain::model::CurrencyTable;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_range, Validate,
};

pub const DEFAULT_PROFESSION: &str = "Аналитик";
pub const DEFAULT_WORK_DIR: &str = "csv";
pub const DEFAULT_OUTPUT: &str = "report.pdf";
pub const DEFAULT_PDF_TOOL: &str = "wkhtmltopdf";
pub const MAX_WORKERS: usize = 256;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, clap::Parser)]
#[command(name = "vacancy-report")]
#[command(about = "Builds a PDF salary report from a CSV of job vacancies")]
pub struct CliConfig {
    /// Vacancy CSV export
    #[arg(short, long)]
    pub input: String,

    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: String,

    /// Working directory for per-year files. WIPED at the start of every run.
    #[arg(long, default_value = DEFAULT_WORK_DIR)]
    pub work_dir: String,

    /// Case-sensitive keyword matched against the vacancy name
    #[arg(short, long, default_value = DEFAULT_PROFESSION)]
    pub profession: String,

    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// HTML template with {{ slot }} placeholders (built-in template if omitted)
    #[arg(long)]
    pub template: Option<String>,

    #[arg(long, default_value = DEFAULT_PDF_TOOL)]
    pub pdf_tool: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output
    }

    fn work_dir(&self) -> &str {
        &self.work_dir
    }

    fn profession(&self) -> &str {
        &self.profession
    }

    fn worker_count(&self) -> usize {
        self.workers
    }

    fn template_path(&self) -> Option<&str> {
        self.template.as_deref()
    }

    fn pdf_tool(&self) -> &str {
        &self.pdf_tool
    }

    fn currency_table(&self) -> CurrencyTable {
        CurrencyTable::default()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_run_parameters(self)
    }
}

/// Checks shared by every configuration source.
pub fn validate_run_parameters<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_path("input", config.input_path())?;
    validate_file_extension("input", config.input_path(), &["csv"])?;
    validate_path("output", config.output_path())?;
    validate_file_extension("output", config.output_path(), &["pdf"])?;
    validate_path("work_dir", config.work_dir())?;
    validate_non_empty_string("profession", config.profession())?;
    validate_range("workers", config.worker_count(), 1, MAX_WORKERS)?;
    validate_non_empty_string("pdf_tool", config.pdf_tool())?;
    if let Some(template) = config.template_path() {
        validate_path("template", template)?;
    }
    Ok(())
}

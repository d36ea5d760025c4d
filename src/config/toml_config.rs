use crate::config::{
    validate_run_parameters, DEFAULT_OUTPUT, DEFAULT_PDF_TOOL, DEFAULT_PROFESSION, DEFAULT_WORK_DIR,
};
use crate::core::aggregator::DEFAULT_WORKERS;
use crate::core::ConfigProvider;
use crate::domain::model::CurrencyTable;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_currency_rate, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportSection,
    #[serde(default)]
    pub processing: ProcessingSection,
    #[serde(default)]
    pub render: RenderSection,
    /// 額外或覆寫的匯率 (幣別 -> 盧布)
    #[serde(default)]
    pub currency: HashMap<String, f64>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub input: String,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_profession")]
    pub profession: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSection {
    #[serde(default = "default_work_dir")]
    pub work_dir: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ProcessingSection {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSection {
    pub template: Option<String>,
    #[serde(default = "default_pdf_tool")]
    pub pdf_tool: String,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            template: None,
            pdf_tool: default_pdf_tool(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_format: Option<String>,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_profession() -> String {
    DEFAULT_PROFESSION.to_string()
}

fn default_work_dir() -> String {
    DEFAULT_WORK_DIR.to_string()
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_pdf_tool() -> String {
    DEFAULT_PDF_TOOL.to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_run_parameters(self)?;
        for (code, rate) in &self.currency {
            validate_currency_rate("currency", code, *rate)?;
        }
        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.report.input
    }

    fn output_path(&self) -> &str {
        &self.report.output
    }

    fn work_dir(&self) -> &str {
        &self.processing.work_dir
    }

    fn profession(&self) -> &str {
        &self.report.profession
    }

    fn worker_count(&self) -> usize {
        self.processing.workers
    }

    fn template_path(&self) -> Option<&str> {
        self.render.template.as_deref()
    }

    fn pdf_tool(&self) -> &str {
        &self.render.pdf_tool
    }

    fn currency_table(&self) -> CurrencyTable {
        CurrencyTable::default().with_overrides(&self.currency)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[report]
input = "vacancies.csv"
"#,
        )
        .unwrap();

        assert_eq!(config.output_path(), "report.pdf");
        assert_eq!(config.work_dir(), "csv");
        assert_eq!(config.worker_count(), 16);
        assert_eq!(config.pdf_tool(), "wkhtmltopdf");
        assert_eq!(config.currency_table(), CurrencyTable::default());
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_currency_section_extends_table() {
        let config = TomlConfig::from_toml_str(
            r#"
[report]
input = "vacancies.csv"
profession = "Analyst"

[processing]
workers = 4

[currency]
USD = 92.5
JPY = 0.61
"#,
        )
        .unwrap();

        let table = config.currency_table();
        assert_eq!(table.rate("USD"), Some(92.5));
        assert_eq!(table.rate("JPY"), Some(0.61));
        assert_eq!(table.rate("RUR"), Some(1.0));
        assert_eq!(config.worker_count(), 4);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("VACANCY_REPORT_TEST_INPUT", "/data/vacancies.csv");

        let config = TomlConfig::from_toml_str(
            r#"
[report]
input = "${VACANCY_REPORT_TEST_INPUT}"
"#,
        )
        .unwrap();
        assert_eq!(config.input_path(), "/data/vacancies.csv");

        std::env::remove_var("VACANCY_REPORT_TEST_INPUT");
    }

    #[test]
    fn test_invalid_rate_fails_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[report]
input = "vacancies.csv"

[currency]
USD = -1.0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_report_section_is_an_error() {
        let err = TomlConfig::from_toml_str("[processing]\nworkers = 2\n").unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
[report]
input = "file-test.csv"
output = "out/report.pdf"

[monitoring]
enabled = true
log_format = "json"
"#,
            )
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input_path(), "file-test.csv");
        assert_eq!(config.output_path(), "out/report.pdf");
        assert!(config.monitoring_enabled());
        assert!(config.json_logs());
    }
}

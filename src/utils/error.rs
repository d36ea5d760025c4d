use crate::core::normalizer::REQUIRED_COLUMNS;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Input file '{path}' contains no rows")]
    EmptyInput { path: String },

    #[error("Required column '{column}' is missing from the header")]
    MissingColumn { column: String },

    #[error("Unknown currency code '{code}' (line {line})")]
    UnknownCurrency { code: String, line: u64 },

    #[error("Partition '{file}' for year {year} contains no valid vacancies")]
    EmptyPartition { year: i32, file: String },

    #[error("Worker task failed: {message}")]
    TaskFailed { message: String },

    #[error("Report rendering failed: {message}")]
    RenderError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Processing,
    Rendering,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::EmptyInput { .. } | EtlError::MissingColumn { .. } => ErrorCategory::Input,
            EtlError::CsvError(_)
            | EtlError::UnknownCurrency { .. }
            | EtlError::EmptyPartition { .. } => ErrorCategory::Data,
            EtlError::TaskFailed { .. } | EtlError::SerializationError(_) => {
                ErrorCategory::Processing
            }
            EtlError::RenderError { .. } => ErrorCategory::Rendering,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Data | ErrorCategory::Processing => ErrorSeverity::High,
            // 外部工具失敗，重跑通常即可
            ErrorCategory::Rendering => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::EmptyInput { path } => {
                format!("Check that '{}' is the vacancy export and is not empty", path)
            }
            EtlError::MissingColumn { column } => format!(
                "Add the '{}' column to the input header (required: {})",
                column,
                REQUIRED_COLUMNS.join(", ")
            ),
            EtlError::UnknownCurrency { code, .. } => format!(
                "Add a rate for '{}' to the [currency] section of the TOML config",
                code
            ),
            EtlError::EmptyPartition { year, .. } => format!(
                "Inspect the rows published in {}; every one of them was rejected as malformed",
                year
            ),
            EtlError::RenderError { .. } => {
                "Make sure wkhtmltopdf is installed or pass --pdf-tool with its location".to_string()
            }
            EtlError::TaskFailed { .. } => "Re-run with --verbose to see which partition failed".to_string(),
            EtlError::CsvError(_) => "Check that the input is valid UTF-8 CSV".to_string(),
            EtlError::IoError(_) => "Check file permissions and available disk space".to_string(),
            EtlError::SerializationError(_) => "Re-run with --verbose and report the failure".to_string(),
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again (see --help)".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::EmptyInput { .. } => "The input file is empty".to_string(),
            EtlError::UnknownCurrency { code, line } => {
                format!("Line {} uses an unsupported currency: {}", line, code)
            }
            EtlError::EmptyPartition { year, .. } => {
                format!("No usable vacancies were found for {}", year)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

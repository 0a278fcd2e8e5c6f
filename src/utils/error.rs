use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Spreadsheet request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Spreadsheet export returned HTTP {status} for {url}")]
    SourceStatus { status: u16, url: String },

    #[error("Spreadsheet export is empty: {url}")]
    EmptySource { url: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing expected column for {field} (looked for: {candidates})")]
    MissingColumn { field: String, candidates: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Chart '{chart}' could not be drawn: {message}")]
    ChartError { chart: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    Output,
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
            EtlError::ApiError(_) | EtlError::SourceStatus { .. } | EtlError::EmptySource { .. } => {
                ErrorCategory::Network
            }
            EtlError::CsvError(_)
            | EtlError::MissingColumn { .. }
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::TomlError(_)
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::ZipError(_)
            | EtlError::IoError(_)
            | EtlError::SerializationError(_)
            | EtlError::ChartError { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::ChartError { .. } | EtlError::MissingColumn { .. } => ErrorSeverity::Low,
            EtlError::ApiError(_) | EtlError::SourceStatus { .. } | EtlError::EmptySource { .. } => {
                ErrorSeverity::Medium
            }
            EtlError::CsvError(_)
            | EtlError::ProcessingError { .. }
            | EtlError::TomlError(_)
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            EtlError::ZipError(_) | EtlError::IoError(_) | EtlError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the spreadsheet is shared publicly and that the sheet id and sheet name are correct"
            }
            ErrorCategory::Data => {
                "Check the sheet headers against the [columns] candidates in the report config"
            }
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags and retry",
            ErrorCategory::Output => "Check that the output directory exists and is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::SourceStatus { status, .. } => {
                format!("The spreadsheet could not be downloaded (HTTP {})", status)
            }
            EtlError::ApiError(_) => "The spreadsheet could not be reached".to_string(),
            EtlError::EmptySource { .. } => "The spreadsheet export has no rows".to_string(),
            EtlError::MissingConfigError { field } => format!("Missing setting: {}", field),
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_errors_are_network_medium_severity() {
        let err = EtlError::SourceStatus {
            status: 404,
            url: "https://docs.google.com/x".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("404"));
    }

    #[test]
    fn test_chart_errors_are_low_severity() {
        let err = EtlError::ChartError {
            chart: "pie".to_string(),
            message: "no data".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.category(), ErrorCategory::Output);
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

impl TableError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            TableError::ConfigError { .. }
                | TableError::ConfigValidationError { .. }
                | TableError::InvalidConfigValueError { .. }
        )
    }

    /// 給使用者的修復建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TableError::IoError(_) => "Check that the input file exists and the output directory is writable",
            TableError::SerializationError(_) => {
                "Input must be a JSON array of objects or a table response envelope"
            }
            TableError::CsvError(_) => "Check the output directory and the rendered cell values",
            TableError::ConfigError { .. }
            | TableError::ConfigValidationError { .. }
            | TableError::InvalidConfigValueError { .. } => "Fix the view configuration file and retry",
            TableError::ProcessingError { .. } => "Inspect the input rows; run with --verbose for details",
        }
    }

    /// 1 = 配置錯誤, 2 = 處理錯誤
    pub fn exit_code(&self) -> i32 {
        if self.is_config_error() {
            1
        } else {
            2
        }
    }
}

pub type Result<T> = std::result::Result<T, TableError>;

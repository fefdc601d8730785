use crate::core::rules::RuleSet;
use crate::utils::error::{Result, TableError};
use crate::utils::validation::{validate_non_empty_string, validate_output_formats, validate_path, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SUPPORTED_FORMATS: [&str; 3] = ["csv", "tsv", "json"];
pub const DEFAULT_FORMAT: &str = "csv";

static ENV_VAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

/// 一個表格畫面的設定: 名稱、欄位規則與輸出格式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub view: ViewInfo,
    #[serde(default)]
    pub rules: RuleSet,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub formats: Option<Vec<String>>,
    pub filename: Option<String>,
}

impl ViewConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| TableError::ConfigError {
            message: format!("cannot read view file {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| TableError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DISPLAY_TZ}), 未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_REGEX
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("view.name", &self.view.name)?;

        for (field, template) in &self.rules.time_keys {
            validate_non_empty_string(&format!("rules.time_keys.{}", field), template)?;
        }

        if let Some(output) = &self.output {
            if let Some(formats) = &output.formats {
                validate_output_formats("output.formats", formats, &SUPPORTED_FORMATS)?;
            }
            if let Some(filename) = &output.filename {
                validate_path("output.filename", filename)?;
            }
        }

        for (field, winner, shadowed) in self.rules.overlapping_keys() {
            tracing::warn!(
                "🔶 {}: field '{}' matches both {} and {}; {} applies",
                self.view.name,
                field,
                winner,
                shadowed,
                winner
            );
        }

        Ok(())
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rules
    }

    /// 輸出格式, 未設定時為 csv
    pub fn output_formats(&self) -> Vec<String> {
        self.output
            .as_ref()
            .and_then(|o| o.formats.clone())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_FORMAT.to_string()])
    }

    /// 輸出檔名 (不含副檔名), 未設定時使用畫面名稱
    pub fn output_name(&self) -> &str {
        self.output
            .as_ref()
            .and_then(|o| o.filename.as_deref())
            .unwrap_or(&self.view.name)
    }
}

impl Validate for ViewConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

pub mod cli;
pub mod view_config;

use crate::core::rules::RuleSet;
use crate::core::ConfigProvider;
use crate::domain::model::PageQuery;
use crate::utils::error::Result;
use crate::utils::validation::{validate_output_formats, validate_path, validate_positive_number, Validate};
use view_config::{ViewConfig, SUPPORTED_FORMATS};

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "table-trans")]
#[command(about = "Turns API table rows into masked, display-ready tables")]
pub struct CliConfig {
    /// JSON file with the rows: an array of objects or a table response envelope
    #[arg(short, long)]
    pub input: String,

    /// TOML file describing the table view and its field rules
    #[arg(long)]
    pub view: String,

    #[arg(short, long, default_value = "./output")]
    pub output_path: String,

    /// Overrides the view's output formats
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<String>,

    #[arg(long)]
    pub page_num: Option<usize>,

    #[arg(long)]
    pub page_size: Option<usize>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

/// Everything one table job needs: where rows come from, where the table goes,
/// and the view's rules.
#[derive(Debug, Clone)]
pub struct TableJobConfig {
    pub input_path: String,
    pub output_path: String,
    pub output_name: String,
    pub output_formats: Vec<String>,
    pub page_query: Option<PageQuery>,
    pub rules: RuleSet,
}

impl TableJobConfig {
    pub fn new(input_path: impl Into<String>, output_path: impl Into<String>, view: &ViewConfig) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            output_name: view.output_name().to_string(),
            output_formats: view.output_formats(),
            page_query: None,
            rules: view.rule_set().clone(),
        }
    }

    pub fn with_formats(mut self, formats: Vec<String>) -> Self {
        if !formats.is_empty() {
            self.output_formats = formats;
        }
        self
    }

    /// Paging is only applied when at least one of the two values is given.
    pub fn with_paging(mut self, page_num: Option<usize>, page_size: Option<usize>) -> Self {
        if page_num.is_some() || page_size.is_some() {
            self.page_query = Some(PageQuery::normalize(page_num, page_size));
        }
        self
    }

    #[cfg(feature = "cli")]
    pub fn from_cli(cli: &CliConfig) -> Result<Self> {
        let view = ViewConfig::from_file(&cli.view)?;
        view.validate()?;

        let config = Self::new(cli.input.clone(), cli.output_path.clone(), &view)
            .with_formats(cli.formats.clone())
            .with_paging(cli.page_num, cli.page_size);
        config.validate()?;
        Ok(config)
    }
}

impl ConfigProvider for TableJobConfig {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_name(&self) -> &str {
        &self.output_name
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }

    fn page_query(&self) -> Option<PageQuery> {
        self.page_query
    }

    fn rule_set(&self) -> &RuleSet {
        &self.rules
    }
}

impl Validate for TableJobConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input_path)?;
        validate_path("output_path", &self.output_path)?;
        validate_path("output_name", &self.output_name)?;
        validate_positive_number("formats", self.output_formats.len(), 1)?;
        validate_output_formats("formats", &self.output_formats, &SUPPORTED_FORMATS)?;
        Ok(())
    }
}

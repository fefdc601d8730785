use crate::core::rules::RuleSet;
use crate::domain::model::{PageQuery, Record, TransformResult};
use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_name(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn page_query(&self) -> Option<PageQuery>;
    fn rule_set(&self) -> &RuleSet;
}

pub trait Pipeline {
    fn extract(&self) -> Result<Vec<Record>>;
    fn transform(&self, data: Vec<Record>) -> Result<TransformResult>;
    fn load(&self, result: TransformResult) -> Result<String>;
}

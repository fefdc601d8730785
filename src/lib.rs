pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::pipelines::DisplayPipeline;
pub use config::{cli::LocalStorage, view_config::ViewConfig, TableJobConfig};
pub use core::{
    engine::TableEngine,
    mask::mask_value,
    placeholder::{normalize_placeholder, PLACEHOLDER},
    rules::{FieldRule, MaskOptions, RuleSet},
    transformer::{transform, transform_all, transform_typed, transform_with_default},
};
pub use domain::model::{PageQuery, Record, TablePage, User, UserRow};
pub use utils::error::{Result, TableError};

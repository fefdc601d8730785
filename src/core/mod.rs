pub mod display;
pub mod engine;
pub mod mask;
pub mod placeholder;
pub mod rules;
pub mod time_format;
pub mod transformer;

pub use crate::domain::model::{Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

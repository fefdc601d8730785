pub mod table_pipeline;

pub use table_pipeline::DisplayPipeline;

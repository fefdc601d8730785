use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct TableEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> TableEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn run(&self) -> Result<String> {
        tracing::info!("Starting table transform");

        let raw_rows = self.pipeline.extract()?;
        tracing::info!("Extracted {} rows", raw_rows.len());

        let result = self.pipeline.transform(raw_rows)?;
        tracing::info!(
            "Transformed {} rows into {} columns",
            result.display_records.len(),
            result.columns.len()
        );

        let output_path = self.pipeline.load(result)?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}

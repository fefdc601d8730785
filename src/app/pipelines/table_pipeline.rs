use crate::core::display::display_cell;
use crate::core::transformer::transform_all;
use crate::core::{ConfigProvider, Pipeline, Record, Storage, TransformResult};
use crate::domain::model::TablePage;
use crate::utils::error::{Result, TableError};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Reads API rows from a file, applies the view's rules and writes the table.
pub struct DisplayPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> DisplayPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn output_file(&self, extension: &str) -> String {
        Path::new(self.config.output_path())
            .join(format!("{}.{}", self.config.output_name(), extension))
            .to_string_lossy()
            .into_owned()
    }
}

/// Accepts a plain array of rows, a table response envelope
/// (`{ code, msg, data: { total, page, size, list } }`) or a single row object.
pub fn rows_from_json(json: Value) -> Result<Vec<Value>> {
    let is_envelope = json
        .get("data")
        .and_then(|data| data.get("list"))
        .is_some();

    match json {
        Value::Array(items) => Ok(items),
        Value::Object(_) if is_envelope => {
            let page: TablePage<Value> = serde_json::from_value(json)?;
            tracing::debug!(
                "Table response: code {}, msg '{}', total {}, page {}, size {}",
                page.code,
                page.msg,
                page.data.total,
                page.data.page,
                page.data.size
            );
            Ok(page.data.list)
        }
        Value::Object(_) => Ok(vec![json]),
        other => Err(TableError::ProcessingError {
            message: format!("expected rows as a JSON array or object, got {}", other),
        }),
    }
}

/// Union of all row fields, in the order they are first seen.
pub fn collect_columns(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Renders rows as delimited text with a header line; missing fields are empty cells.
/// No columns means an empty table.
pub fn render_delimited(records: &[Record], columns: &[String], delimiter: u8) -> Result<String> {
    if columns.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for record in records {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| record.get(column).map(display_cell).unwrap_or_default())
            .collect();
        writer.write_record(&cells)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TableError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| TableError::ProcessingError {
        message: format!("rendered table is not UTF-8: {}", e),
    })
}

impl<S: Storage, C: ConfigProvider> Pipeline for DisplayPipeline<S, C> {
    fn extract(&self) -> Result<Vec<Record>> {
        tracing::debug!("Reading rows from: {}", self.config.input_path());
        let bytes = self.storage.read_file(self.config.input_path())?;
        let json: Value = serde_json::from_slice(&bytes)?;

        let mut records = Vec::new();
        for (index, row) in rows_from_json(json)?.into_iter().enumerate() {
            match row {
                Value::Object(data) => records.push(Record { data }),
                other => tracing::warn!("🔶 Skipping row {}: not an object ({})", index, other),
            }
        }

        if let Some(query) = self.config.page_query() {
            let total = records.len();
            records = query.slice(&records).to_vec();
            tracing::info!(
                "Page {} (size {}): {} of {} rows",
                query.page_num,
                query.page_size,
                records.len(),
                total
            );
        }

        Ok(records)
    }

    fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        let display_records = transform_all(&data, self.config.rule_set());
        let columns = collect_columns(&display_records);

        let csv_output = render_delimited(&display_records, &columns, b',')?;
        let tsv_output = render_delimited(&display_records, &columns, b'\t')?;

        Ok(TransformResult {
            display_records,
            columns,
            csv_output,
            tsv_output,
        })
    }

    fn load(&self, result: TransformResult) -> Result<String> {
        for format in self.config.output_formats() {
            let (path, contents) = match format.as_str() {
                "csv" => (self.output_file("csv"), result.csv_output.clone()),
                "tsv" => (self.output_file("tsv"), result.tsv_output.clone()),
                "json" => (
                    self.output_file("json"),
                    serde_json::to_string_pretty(&result.display_records)?,
                ),
                other => {
                    tracing::warn!("🔶 Unsupported output format: {}", other);
                    continue;
                }
            };

            self.storage.write_file(&path, contents.as_bytes())?;
            tracing::debug!("Wrote {} ({} bytes)", path, contents.len());
        }

        Ok(self.config.output_path().to_string())
    }
}

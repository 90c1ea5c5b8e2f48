//! CSV codec
//!
//! Text rows in, Arrow record batch out. The schema is inferred from the
//! payload on every decode; reader/writer options pass through to the Arrow
//! CSV machinery unmodified.

use std::io::Cursor;
use std::sync::Arc;

use arrow::csv::reader::Format as CsvFormat;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

/// Options forwarded to the CSV reader and writer
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter
    pub delimiter: u8,

    /// Whether the payload carries a header row
    pub has_header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }
}

/// Decode CSV text into a single record batch
pub fn decode(bytes: &[u8], options: &CsvOptions) -> Result<RecordBatch, ArrowError> {
    let format = CsvFormat::default()
        .with_header(options.has_header)
        .with_delimiter(options.delimiter);

    let mut cursor = Cursor::new(bytes);
    let (schema, _) = format.infer_schema(&mut cursor, None)?;
    cursor.set_position(0);

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(cursor)?;

    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    arrow::compute::concat_batches(&schema, &batches)
}

/// Encode a record batch as CSV text
pub fn encode(batch: &RecordBatch, options: &CsvOptions) -> Result<Vec<u8>, ArrowError> {
    let mut buf = Vec::new();
    let mut writer = WriterBuilder::new()
        .with_header(options.has_header)
        .with_delimiter(options.delimiter)
        .build(&mut buf);
    writer.write(batch)?;
    drop(writer);
    Ok(buf)
}

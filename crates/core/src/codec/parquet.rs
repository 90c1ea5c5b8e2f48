//! Parquet codec
//!
//! Binary-only transfer format for record batches. Multi-row-group files
//! decode into one concatenated batch.

use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::errors::ParquetError;

use arrow::record_batch::RecordBatch;

/// Decode a Parquet payload into a single record batch
pub fn decode(bytes: Vec<u8>) -> Result<RecordBatch, ParquetError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ParquetError::External(Box::new(e)))?;

    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    arrow::compute::concat_batches(&schema, &batches)
        .map_err(|e| ParquetError::External(Box::new(e)))
}

/// Encode a record batch as Parquet bytes
pub fn encode(batch: &RecordBatch) -> Result<Vec<u8>, ParquetError> {
    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(buf)
}

//! Excel workbook codec
//!
//! Reads xlsx sheets into record batches and writes a record batch out as a
//! single-sheet workbook. The first row of a sheet is the header; column
//! types are inferred from the cells below it. Excel stores every number as
//! an IEEE double, so integer columns come back as `Float64` on read.

use std::io::Cursor;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use calamine::{Data, Range, Reader, Xlsx};
use indexmap::IndexMap;
use rust_xlsxwriter::Workbook;
use thiserror::Error;

/// Errors from the workbook codec
#[derive(Error, Debug)]
pub enum ExcelError {
    #[error(transparent)]
    Workbook(#[from] calamine::XlsxError),

    #[error(transparent)]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("sheet '{0}' has no header row")]
    EmptySheet(String),

    #[error("column '{name}' has unsupported type {data_type} for a worksheet")]
    UnsupportedColumn { name: String, data_type: DataType },
}

/// Decode one sheet of a workbook into a record batch.
///
/// With no sheet name the first sheet of the workbook is read.
pub fn decode(bytes: Vec<u8>, sheet: Option<&str>) -> Result<RecordBatch, ExcelError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;

    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(ExcelError::NoSheets)?,
    };

    let range = workbook.worksheet_range(&name)?;
    batch_from_range(&range, &name)
}

/// Decode several sheets by name, keyed in request order
pub fn decode_sheets(
    bytes: Vec<u8>,
    sheets: &[&str],
) -> Result<IndexMap<String, RecordBatch>, ExcelError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;

    let mut frames = IndexMap::with_capacity(sheets.len());
    for &name in sheets {
        let range = workbook.worksheet_range(name)?;
        frames.insert(name.to_string(), batch_from_range(&range, name)?);
    }
    Ok(frames)
}

/// Encode a record batch as a single-sheet workbook
pub fn encode(batch: &RecordBatch, sheet: Option<&str>) -> Result<Vec<u8>, ExcelError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    if let Some(name) = sheet {
        worksheet.set_name(name)?;
    }

    for (col, field) in batch.schema().fields().iter().enumerate() {
        worksheet.write_string(0, col as u16, field.name().as_str())?;
    }

    for (col, field) in batch.schema().fields().iter().enumerate() {
        let array = batch.column(col);
        let col = col as u16;
        match field.data_type() {
            DataType::Int64 => {
                let values = array.as_any().downcast_ref::<Int64Array>().unwrap();
                for row in 0..values.len() {
                    if values.is_valid(row) {
                        worksheet.write_number(row as u32 + 1, col, values.value(row) as f64)?;
                    }
                }
            }
            DataType::Float64 => {
                let values = array.as_any().downcast_ref::<Float64Array>().unwrap();
                for row in 0..values.len() {
                    if values.is_valid(row) {
                        worksheet.write_number(row as u32 + 1, col, values.value(row))?;
                    }
                }
            }
            DataType::Boolean => {
                let values = array.as_any().downcast_ref::<BooleanArray>().unwrap();
                for row in 0..values.len() {
                    if values.is_valid(row) {
                        worksheet.write_boolean(row as u32 + 1, col, values.value(row))?;
                    }
                }
            }
            DataType::Utf8 => {
                let values = array.as_any().downcast_ref::<StringArray>().unwrap();
                for row in 0..values.len() {
                    if values.is_valid(row) {
                        worksheet.write_string(row as u32 + 1, col, values.value(row))?;
                    }
                }
            }
            other => {
                return Err(ExcelError::UnsupportedColumn {
                    name: field.name().clone(),
                    data_type: other.clone(),
                });
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// What kinds of cells a column holds, for type inference
#[derive(Default)]
struct ColumnShape {
    ints: bool,
    floats: bool,
    bools: bool,
    text: bool,
}

fn batch_from_range(range: &Range<Data>, sheet: &str) -> Result<RecordBatch, ExcelError> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| ExcelError::EmptySheet(sheet.to_string()))?;
    let data_rows: Vec<&[Data]> = rows.collect();

    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Data::Empty => format!("column{i}"),
            other => other.to_string(),
        })
        .collect();

    let mut fields = Vec::with_capacity(names.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(names.len());

    for (col, name) in names.iter().enumerate() {
        let mut shape = ColumnShape::default();
        for row in &data_rows {
            match &row[col] {
                Data::Empty => {}
                Data::Int(_) => shape.ints = true,
                Data::Float(_) => shape.floats = true,
                Data::Bool(_) => shape.bools = true,
                _ => shape.text = true,
            }
        }

        let (data_type, array) = infer_column(&shape, col, &data_rows);
        fields.push(Field::new(name, data_type, true));
        columns.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    if columns.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    Ok(RecordBatch::try_new(schema, columns)?)
}

fn infer_column(shape: &ColumnShape, col: usize, rows: &[&[Data]]) -> (DataType, ArrayRef) {
    if shape.bools && !shape.ints && !shape.floats && !shape.text {
        let values: BooleanArray = rows
            .iter()
            .map(|row| match &row[col] {
                Data::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        return (DataType::Boolean, Arc::new(values));
    }

    if shape.ints && !shape.floats && !shape.bools && !shape.text {
        let values: Int64Array = rows
            .iter()
            .map(|row| match &row[col] {
                Data::Int(i) => Some(*i),
                _ => None,
            })
            .collect();
        return (DataType::Int64, Arc::new(values));
    }

    if (shape.floats || shape.ints) && !shape.bools && !shape.text {
        let values: Float64Array = rows
            .iter()
            .map(|row| match &row[col] {
                Data::Float(f) => Some(*f),
                Data::Int(i) => Some(*i as f64),
                _ => None,
            })
            .collect();
        return (DataType::Float64, Arc::new(values));
    }

    // Mixed or textual column: render every non-empty cell.
    let values: StringArray = rows
        .iter()
        .map(|row| match &row[col] {
            Data::Empty => None,
            other => Some(other.to_string()),
        })
        .collect();
    (DataType::Utf8, Arc::new(values))
}

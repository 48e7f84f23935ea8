use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataError;
use super::model::{CellValue, RawTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a raw table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` – first worksheet, first row is the header
/// * `.csv`     – header row, one record per line
/// * `.json`    – `[{ "country": "China", "1990": 2173.4, ... }, ...]`
/// * `.parquet` – any flat schema of string / integer / float / bool columns
pub fn load_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let table = match ext.as_str() {
        "xlsx" | "xls" | "xlsm" => load_workbook(path, name),
        "csv" => load_csv(path, name),
        "json" => load_json(path, name),
        "parquet" | "pq" => load_parquet(path, name),
        other => Err(DataError::UnsupportedExtension(other.to_string()).into()),
    }?;

    log::info!(
        "Loaded {} ({} rows, {} columns)",
        table.name,
        table.len(),
        table.headers.len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

/// First worksheet of a workbook. The first row holds the headers; numeric
/// header cells (`1960` or `1960.0`) become their text form.
fn load_workbook(path: &Path, name: String) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .with_context(|| format!("{name}: workbook has no worksheets"))?
        .with_context(|| format!("reading first worksheet of {}", path.display()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|c| workbook_cell(c).as_text()).collect())
        .unwrap_or_default();

    let mut table = RawTable::new(name, headers);
    for row in rows {
        table.push_row(row.iter().map(workbook_cell).collect());
    }
    Ok(table)
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => guess_cell_type(s),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty | Data::Error(_) => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names; every field becomes a typed
/// cell. Ragged rows are padded with nulls.
fn load_csv(path: &Path, name: String) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut table = RawTable::new(name, headers);
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        table.push_row(record.iter().map(guess_cell_type).collect());
    }
    Ok(table)
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "country": "China", "1990": 2173.4, "1991": 2300.1 },
///   ...
/// ]
/// ```
///
/// Columns are the union of record keys in first-seen order.
fn load_json(path: &Path, name: String) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let mut table = RawTable::new(name, headers);
    for rec in records {
        let row = table
            .headers
            .iter()
            .map(|h| rec.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => guess_cell_type(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table (e.g. a spreadsheet exported with
/// `df.to_parquet()`). Year columns are usually named `"1990"`, `"1991"`, ...
fn load_parquet(path: &Path, name: String) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = RawTable::new(name, headers);
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch
            .columns()
            .iter()
            .zip(&table.headers)
            .map(|(col, header)| TypedColumn::from_arrow(col, &table.name, header))
            .collect::<Result<Vec<_>>>()?;
        for row in 0..batch.num_rows() {
            table.push_row(columns.iter().map(|c| c.cell(row)).collect());
        }
    }
    Ok(table)
}

// -- Arrow helpers --

/// An Arrow column cast to one of the four cell kinds.
enum TypedColumn {
    Text(StringArray),
    Integer(Int64Array),
    Float(Float64Array),
    Bool(BooleanArray),
}

impl TypedColumn {
    /// Integers widen to Int64, other numerics (floats, decimals) to
    /// Float64, and string-like or dictionary-encoded columns to Utf8.
    /// Anything else is a schema error.
    fn from_arrow(col: &ArrayRef, table: &str, column: &str) -> Result<Self> {
        let target = match col.data_type() {
            DataType::Boolean => DataType::Boolean,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => DataType::Utf8,
            DataType::Dictionary(_, value) if value.is_integer() => DataType::Int64,
            DataType::Dictionary(_, value) if value.is_numeric() => DataType::Float64,
            DataType::Dictionary(_, value)
                if matches!(**value, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View) =>
            {
                DataType::Utf8
            }
            t if t.is_integer() => DataType::Int64,
            t if t.is_numeric() => DataType::Float64,
            other => {
                return Err(DataError::UnsupportedColumnType {
                    table: table.to_string(),
                    column: column.to_string(),
                    data_type: other.to_string(),
                }
                .into())
            }
        };

        let array = if col.data_type() == &target {
            Arc::clone(col)
        } else {
            cast(col, &target)
                .with_context(|| format!("{table}: casting column '{column}' to {target}"))?
        };

        let typed = match target {
            DataType::Utf8 => array.as_string_opt::<i32>().cloned().map(TypedColumn::Text),
            DataType::Int64 => array
                .as_primitive_opt::<Int64Type>()
                .cloned()
                .map(TypedColumn::Integer),
            DataType::Float64 => array
                .as_primitive_opt::<Float64Type>()
                .cloned()
                .map(TypedColumn::Float),
            _ => array.as_boolean_opt().cloned().map(TypedColumn::Bool),
        };
        typed.with_context(|| format!("{table}: column '{column}' did not cast to {target}"))
    }

    fn cell(&self, row: usize) -> CellValue {
        match self {
            TypedColumn::Text(a) if a.is_valid(row) => guess_cell_type(a.value(row)),
            TypedColumn::Integer(a) if a.is_valid(row) => CellValue::Integer(a.value(row)),
            TypedColumn::Float(a) if a.is_valid(row) => CellValue::Float(a.value(row)),
            TypedColumn::Bool(a) if a.is_valid(row) => CellValue::Bool(a.value(row)),
            _ => CellValue::Null,
        }
    }
}

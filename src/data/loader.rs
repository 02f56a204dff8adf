use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type,
    UInt16Type, UInt32Type, UInt64Type,
};
use arrow::util::display::array_value_to_string;
use encoding_rs::Encoding;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, RidershipDataset};

/// How to read delimited text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Encoding label, e.g. `cp949`, `euc-kr`, `utf-8`. A BOM overrides it.
    pub encoding: String,
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            encoding: "cp949".to_string(),
            delimiter: b',',
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a ridership table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – delimited text in `options.encoding` (CP949 by default)
/// * `.json`         – `[{ "사용월": "202401", "호선명": "2호선", ... }, ...]`
/// * `.parquet`      – one column per header, as written by `df.to_parquet()`
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<RidershipDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" | "txt" => load_csv(path, options),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!(
        "Loaded {} records, {} columns, {} time slots from {}",
        dataset.len(),
        dataset.headers.len(),
        dataset.schema.slots.len(),
        path.display()
    );
    if dataset.invalid_cells > 0 {
        log::warn!(
            "{} count cells were not whole non-negative numbers and were read as 0",
            dataset.invalid_cells
        );
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Text decoding
// ---------------------------------------------------------------------------

/// Resolve an encoding label. `cp949`/`ms949` map to Windows-949 (EUC-KR).
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    let lowered = label.trim().to_ascii_lowercase();
    let normalized = match lowered.as_str() {
        "cp949" | "ms949" | "uhc" => "windows-949",
        other => other,
    };
    Encoding::for_label(normalized.as_bytes())
        .with_context(|| format!("Unknown text encoding '{label}'"))
}

/// Decode a whole file. Malformed byte sequences are an error, never replaced.
pub fn decode_text<'a>(bytes: &'a [u8], label: &str) -> Result<Cow<'a, str>> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((enc, bom_len)) => (enc, &bytes[bom_len..]),
        None => (resolve_encoding(label)?, bytes),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .with_context(|| format!("File is not valid {} text", encoding.name()))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per row.
fn load_csv(path: &Path, options: &LoadOptions) -> Result<RidershipDataset> {
    let bytes = std::fs::read(path).context("reading CSV file")?;
    let text = decode_text(&bytes, &options.encoding)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            let line = csv_error_line(&e, row_no);
            anyhow::Error::new(e).context(format!("CSV line {line}"))
        })?;
        rows.push(record.iter().map(CellValue::from_text).collect());
    }

    Ok(RidershipDataset::from_table(headers, rows))
}

/// 1-based file line of a failed record. The header occupies line 1, so the
/// `data_row`-th record (0-based) starts on line `data_row + 2` unless the
/// reader knows better.
fn csv_error_line(err: &csv::Error, data_row: usize) -> u64 {
    err.position()
        .map(csv::Position::line)
        .unwrap_or(data_row as u64 + 2)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records', force_ascii=False)`).
/// The header is the union of keys in first-seen order.
fn load_json(path: &Path) -> Result<RidershipDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .iter()
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RidershipDataset::from_table(headers, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::from_text(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per source header.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RidershipDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().trim().to_string())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("Row {row}"))?,
            );
        }
    }

    Ok(RidershipDataset::from_table(headers, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => CellValue::from_text(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => CellValue::from_text(col.as_string::<i64>().value(row)),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Integer)
        }
        DataType::Float32 => {
            CellValue::Float(col.as_primitive::<Float32Type>().value(row).into())
        }
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        // dates, dictionaries, ...: use Arrow's own rendering
        _ => CellValue::from_text(
            &array_value_to_string(col, row).context("formatting parquet cell")?,
        ),
    };
    Ok(cell)
}

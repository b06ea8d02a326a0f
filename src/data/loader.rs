use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, Dataset, Record};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a salary table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one response per line
/// * `.json`    – `[{ "year": 2023, "role": "...", ... }, ...]`
/// * `.parquet` – flat columns, one response per row
///
/// Headers may use any alias listed by [`Column::aliases`]; other columns
/// are kept verbatim in [`Record::extra`].
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!("loaded {} records from {}", records.len(), path.display());
    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Row assembly shared by every format
// ---------------------------------------------------------------------------

/// Build a typed record from one row's cells, keyed by source header.
fn build_record(row: usize, cells: BTreeMap<String, CellValue>) -> Result<Record> {
    let mut typed: BTreeMap<Column, CellValue> = BTreeMap::new();
    let mut extra = BTreeMap::new();

    for (header, value) in cells {
        match Column::from_header(&header) {
            Some(col) => {
                typed.insert(col, value);
            }
            None => {
                extra.insert(header, value);
            }
        }
    }

    let mut take = |col: Column| -> Result<CellValue> {
        match typed.remove(&col) {
            None | Some(CellValue::Null) => bail!("Row {row}: missing value for '{col}'"),
            Some(CellValue::Text(s)) if s.is_empty() => {
                bail!("Row {row}: missing value for '{col}'")
            }
            Some(v) => Ok(v),
        }
    };

    let year = parse_year(take(Column::Year)?).with_context(|| format!("Row {row}"))?;
    let role = text(take(Column::Role)?);
    let seniority = text(take(Column::Seniority)?);
    let company_size = text(take(Column::CompanySize)?);
    let remote_type = text(take(Column::RemoteType)?);
    let residence_country_code = text(take(Column::ResidenceCountryCode)?);
    let salary_usd = parse_salary(take(Column::SalaryUsd)?).with_context(|| format!("Row {row}"))?;

    Ok(Record {
        year,
        role,
        seniority,
        company_size,
        remote_type,
        residence_country_code,
        salary_usd,
        extra,
    })
}

/// Categorical cells are kept verbatim; non-text cells use their display form.
fn text(value: CellValue) -> String {
    match value {
        CellValue::Text(s) => s,
        other => other.to_string(),
    }
}

fn parse_year(value: CellValue) -> Result<i32> {
    let year = match value {
        CellValue::Integer(i) => i,
        CellValue::Float(f) if f.fract() == 0.0 && f.is_finite() => f as i64,
        CellValue::Text(ref s) => s
            .trim()
            .parse::<i64>()
            .with_context(|| format!("'year' value '{s}' is not an integer"))?,
        other => bail!("'year' value '{other}' is not an integer"),
    };
    i32::try_from(year).with_context(|| format!("'year' value {year} is out of range"))
}

fn parse_salary(value: CellValue) -> Result<f64> {
    let salary = match value {
        CellValue::Integer(i) => i as f64,
        CellValue::Float(f) => f,
        CellValue::Text(ref s) => s
            .trim()
            .parse::<f64>()
            .with_context(|| format!("'salary_usd' value '{s}' is not a number"))?,
        other => bail!("'salary_usd' value '{other}' is not a number"),
    };
    if !salary.is_finite() || salary < 0.0 {
        bail!("'salary_usd' value {salary} must be a finite, non-negative number");
    }
    Ok(salary)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    check_required_headers(&headers)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let cells = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.clone(), csv_cell(h, v)))
            .collect();
        records.push(build_record(row_no, cells)?);
    }
    Ok(records)
}

/// Typed categorical columns stay text so "1" or "true" job titles survive.
fn csv_cell(header: &str, raw: &str) -> CellValue {
    match Column::from_header(header) {
        Some(Column::Year) | Some(Column::SalaryUsd) | None => CellValue::from_text(raw),
        Some(_) if raw.is_empty() => CellValue::Null,
        Some(_) => CellValue::Text(raw.to_string()),
    }
}

fn check_required_headers(headers: &[String]) -> Result<()> {
    for col in Column::ALL {
        if !headers.iter().any(|h| col.aliases().contains(&h.as_str())) {
            bail!("missing '{col}' column (accepted headers: {:?})", col.aliases());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `to_json(orient='records')` layout.
fn load_json(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let obj = row
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            let cells = obj
                .iter()
                .map(|(k, v)| (k.clone(), json_to_cell(v)))
                .collect();
            build_record(i, cells)
        })
        .collect()
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
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

/// Load a Parquet file with one flat column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<Record>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    records_from_batches(reader.map(|b| b.context("reading parquet record batch")))
}

/// Row numbers in errors count across batches.
fn records_from_batches<I>(batches: I) -> Result<Vec<Record>>
where
    I: IntoIterator<Item = Result<RecordBatch>>,
{
    let mut records = Vec::new();

    for batch in batches {
        let batch = batch?;
        let schema = batch.schema();
        let headers: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
        check_required_headers(&headers)?;

        let columns = batch
            .columns()
            .iter()
            .zip(&headers)
            .map(|(col, header)| {
                normalize_column(col).with_context(|| format!("failed to read '{header}'"))
            })
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let row_no = records.len();
            let cells = headers
                .iter()
                .zip(&columns)
                .map(|(header, col)| (header.clone(), extract_cell(col, row)))
                .collect();
            records.push(build_record(row_no, cells)?);
        }
    }

    Ok(records)
}

/// Cast a column to the one Arrow type per cell kind that [`extract_cell`] reads.
fn normalize_column(col: &ArrayRef) -> Result<ArrayRef> {
    let target = match col.data_type() {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => DataType::Int64,
        DataType::Float16 | DataType::Float32 | DataType::Float64 | DataType::UInt64 => {
            DataType::Float64
        }
        DataType::Boolean => return Ok(col.clone()),
        _ => DataType::Utf8,
    };
    if col.data_type() == &target {
        return Ok(col.clone());
    }
    cast(col.as_ref(), &target).with_context(|| format!("casting to {target:?}"))
}

/// Extract a single cell from a normalized column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        _ => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
    }
}

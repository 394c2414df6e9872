use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{MetadataValue, Record, RecordError, RecordStore, check_finite, is_reserved};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load an exported vector table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json`    – `[{ "id": ..., "x": .., "y": .., "z": .., ...meta }, ...]`
/// * `.csv`     – header row with `id`, `x`, `y`, `z` plus metadata columns
/// * `.parquet` – `id`, `x`, `y`, `z` scalar columns plus metadata columns
pub fn load_file(path: &Path) -> Result<RecordStore> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Parse the body of the vectors endpoint (or a `.json` export).
pub fn parse_json_records(text: &str) -> Result<RecordStore> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let items = root
        .as_array()
        .context("Expected top-level JSON array of vectors")?;
    Ok(RecordStore::from_json_array(items))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<RecordStore> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json_records(&text)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout as written by the embedding backend's cache:
/// header row, `id`, `x`, `y`, `z` columns, everything else is metadata.
/// Empty cells are null; cells missing from a short row are left out.
fn load_csv(path: &Path) -> Result<RecordStore> {
    let reader = csv_reader().from_path(path).context("opening CSV")?;
    read_csv(reader)
}

/// Rows may be ragged; each one is validated on its own.
fn csv_reader() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.flexible(true);
    builder
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<RecordStore> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))
    };
    let id_idx = column("id")?;
    let axis_idx = [column("x")?, column("y")?, column("z")?];

    let mut candidates = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        match result {
            Ok(row) => candidates.push(csv_record(&headers, &row, id_idx, axis_idx)),
            Err(e) if e.is_io_error() => {
                return Err(e).with_context(|| format!("reading CSV row {row_no}"));
            }
            Err(e) => {
                let reason = format!("CSV row {row_no}: {e}");
                candidates.push(Err(RecordError::Malformed(reason)));
            }
        }
    }

    Ok(RecordStore::ingest(candidates))
}

fn csv_record(
    headers: &[String],
    row: &csv::StringRecord,
    id_idx: usize,
    axis_idx: [usize; 3],
) -> Result<Record, RecordError> {
    let id = row
        .get(id_idx)
        .filter(|s| !s.is_empty())
        .ok_or(RecordError::InvalidId)?
        .to_string();

    let coord = |axis: &'static str, idx: usize| -> Result<f64, RecordError> {
        let v = row
            .get(idx)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .ok_or(RecordError::MissingCoordinate(axis))?;
        check_finite(axis, v)
    };
    let x = coord("x", axis_idx[0])?;
    let y = coord("y", axis_idx[1])?;
    let z = coord("z", axis_idx[2])?;

    let metadata = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_reserved(name))
        .filter_map(|(i, name)| Some((name.clone(), MetadataValue::from_text(row.get(i)?))))
        .collect();

    Ok(Record { id, x, y, z, metadata })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of projected vectors.
///
/// Expected schema:
/// - `id`: Utf8 or integer
/// - `x`, `y`, `z`: Float64 / Float32 / integer
/// - Any other columns are treated as metadata (strings, ints, floats, bools)
fn load_parquet(path: &Path) -> Result<RecordStore> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut candidates = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let column = |name: &str| {
            schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
        };
        let id_col = batch.column(column("id")?);
        let axis_cols = [
            batch.column(column("x")?),
            batch.column(column("y")?),
            batch.column(column("z")?),
        ];

        let meta_cols: Vec<(&Arc<dyn Array>, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| !is_reserved(f.name()))
            .map(|(i, f)| (batch.column(i), f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let candidate = parquet_record(id_col, &axis_cols, row).map(|mut rec| {
                let metadata: BTreeMap<String, MetadataValue> = meta_cols
                    .iter()
                    .map(|(col, name)| (name.clone(), extract_metadata_value(col, row)))
                    .collect();
                rec.metadata = metadata;
                rec
            });
            candidates.push(candidate);
        }
    }

    Ok(RecordStore::ingest(candidates))
}

fn parquet_record(
    id_col: &Arc<dyn Array>,
    axis_cols: &[&Arc<dyn Array>; 3],
    row: usize,
) -> Result<Record, RecordError> {
    let id = match extract_metadata_value(id_col, row) {
        MetadataValue::Null => return Err(RecordError::InvalidId),
        value => value.filter_key(),
    };

    let mut coords = [0.0; 3];
    for ((slot, col), axis) in coords.iter_mut().zip(axis_cols).zip(["x", "y", "z"]) {
        let v = extract_f64(col, row).ok_or(RecordError::MissingCoordinate(axis))?;
        *slot = check_finite(axis, v)?;
    }

    Ok(Record::new(id, coords[0], coords[1], coords[2]))
}

// -- Parquet / Arrow helpers --

/// Read a numeric scalar cell as `f64`; `None` for nulls and non-numeric columns.
fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float64 => col.as_primitive_opt::<Float64Type>().map(|a| a.value(row)),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| a.value(row) as f64),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| a.value(row) as f64),
        _ => None,
    }
}

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|s| MetadataValue::String(s.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| MetadataValue::String(s.value(row).to_string())),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| MetadataValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| MetadataValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| MetadataValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| MetadataValue::Float(a.value(row))),
        DataType::Boolean => col
            .as_boolean_opt()
            .map(|a| MetadataValue::Bool(a.value(row))),
        _ => None,
    };
    value.unwrap_or_else(|| match array_value_to_string(col, row) {
        Ok(s) => MetadataValue::String(s),
        Err(_) => MetadataValue::String(format!("{:?}", col.data_type())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_endpoint_body() {
        let body = r#"[
            {"id": "v1", "x": 0.1, "y": 0.2, "z": 0.3, "header": "Intro", "lang": "en"},
            {"id": "v2", "x": 0.4, "y": 0.5, "z": 0.6, "lang": null}
        ]"#;
        let store = parse_json_records(body).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.rejected(), 0);
        assert_eq!(store.records()[0].header().as_deref(), Some("Intro"));
        assert!(store.records()[1].metadata["lang"].is_null());
    }

    #[test]
    fn rejects_non_array_body() {
        assert!(parse_json_records(r#"{"error": "No vectors found"}"#).is_err());
        assert!(parse_json_records("not json").is_err());
    }

    #[test]
    fn loads_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"id": 1, "x": 1, "y": 2, "z": 3}}]"#).unwrap();
        let store = load_file(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].id, "1");
    }

    #[test]
    fn loads_cached_csv_layout() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,header,category,x,y,z").unwrap();
        writeln!(file, "a,First,news,0.1,0.2,0.3").unwrap();
        writeln!(file, "b,,2,0.4,0.5,0.6").unwrap();
        writeln!(file, "c,Broken,news,,0.5,0.6").unwrap();
        writeln!(file, "d,Infinite,news,inf,0.5,0.6").unwrap();
        file.flush().unwrap();

        let store = load_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.rejected(), 2);

        let b = &store.records()[1];
        assert_eq!(b.id, "b");
        assert!(b.metadata["header"].is_null());
        assert_eq!(b.metadata["category"], MetadataValue::Integer(2));
        assert_eq!(b.coords(), [0.4, 0.5, 0.6]);
        assert!(!b.metadata.contains_key("x"));
    }

    #[test]
    fn csv_without_coordinates_fails() {
        let reader = csv_reader().from_reader("id,x,y\na,1,2\n".as_bytes());
        let err = read_csv(reader).unwrap_err();
        assert!(err.to_string().contains("'z'"));
    }

    #[test]
    fn short_csv_row_is_rejected_alone() {
        let text = "id,x,y,z,cat\na,1,2,3,u\nb,1,2\nc,4,5,6,v\nd,7,8,9\n";
        let store = read_csv(csv_reader().from_reader(text.as_bytes())).unwrap();
        let ids: Vec<&str> = store.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
        assert_eq!(store.rejected(), 1);
        assert!(!store.records()[2].metadata.contains_key("cat"));
    }

    #[test]
    fn undecodable_csv_row_is_rejected_alone() {
        let mut bytes = b"id,x,y,z,cat\na,1,2,3,u\n".to_vec();
        bytes.extend_from_slice(b"b,1,2,3,\xff\xfe\n");
        bytes.extend_from_slice(b"c,4,5,6,v\n");
        let store = read_csv(csv_reader().from_reader(bytes.as_slice())).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.rejected(), 1);
    }

    #[test]
    fn unknown_extension_is_an_error() {
        assert!(load_file(Path::new("vectors.txt")).is_err());
    }
}

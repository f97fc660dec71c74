use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType as ArrowType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::{Error, Result};

use super::eclab::{EcLabExtractor, Extractor};
use super::model::{Column, ColumnKind, DataType, Table};

/// Reads `path` and returns a table for the requested data type tag
/// (already lower-cased, `None` for a format's default).
pub type Transform = Box<dyn Fn(&Path, Option<&str>) -> Result<Table> + Send + Sync>;

type Key = (String, Option<String>);

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps `(file format, data type)` to a transform.
///
/// Keys are case-insensitive and a leading dot on the format is ignored, so
/// `.mpt`, `mpt` and `MPT` are the same format. There is no fallback from a
/// specific data type to the format default: each pair is registered
/// explicitly.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: HashMap<Key, Transform>,
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

impl LoaderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in formats, using the EC-Lab reader for `.mpt`.
    pub fn with_builtin() -> Self {
        Self::with_extractor(Arc::new(EcLabExtractor))
    }

    /// Registry with the built-in formats and a custom `.mpt` extractor.
    ///
    /// * `.txt`     – whitespace columns `cycle time Ewe I`, no header (`cv`)
    /// * `.mpt`     – vendor file via `extractor` (`cv`, `eis`, default = `cv`)
    /// * `.parquet` – flat columns named per the contract (`cv`, `eis`)
    pub fn with_extractor(extractor: Arc<dyn Extractor>) -> Self {
        let mut registry = Self::new();

        registry.register(".txt", Some("cv"), Box::new(load_whitespace_cv));

        for data_type in [Some("cv"), Some("eis"), None] {
            let extractor = Arc::clone(&extractor);
            registry.register(
                ".mpt",
                data_type,
                Box::new(move |path: &Path, dtype: Option<&str>| {
                    load_vendor(extractor.as_ref(), path, dtype)
                }),
            );
        }

        for data_type in [DataType::Cv, DataType::Eis] {
            registry.register(".parquet", Some(data_type.tag()), Box::new(load_parquet));
        }

        registry
    }

    /// Associate a transform with a key. Re-registering replaces it.
    pub fn register(&mut self, format: &str, data_type: Option<&str>, transform: Transform) {
        let key = make_key(format, data_type);
        if self.loaders.insert(key.clone(), transform).is_some() {
            log::warn!("Replacing loader for {key:?}");
        } else {
            log::debug!("Registered loader for {key:?}");
        }
    }

    /// Whether a transform exists for exactly this key.
    pub fn supports(&self, format: &str, data_type: Option<&str>) -> bool {
        self.loaders.contains_key(&make_key(format, data_type))
    }

    /// Every registered key, sorted.
    pub fn keys(&self) -> Vec<(String, Option<String>)> {
        let mut keys: Vec<_> = self.loaders.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Distinct registered formats (without the leading dot), sorted.
    pub fn formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self.loaders.keys().map(|(f, _)| f.clone()).collect();
        formats.sort();
        formats.dedup();
        formats
    }

    /// Resolve the key and run its transform on `path`.
    pub fn load(&self, path: &Path, format: &str, data_type: Option<&str>) -> Result<Table> {
        let key = make_key(format, data_type);
        let transform = self
            .loaders
            .get(&key)
            .ok_or_else(|| Error::UnsupportedFormat {
                format: format.to_string(),
                data_type: data_type.map(str::to_string),
            })?;
        transform(path, key.1.as_deref())
    }
}

fn make_key(format: &str, data_type: Option<&str>) -> Key {
    (
        format.trim_start_matches('.').to_ascii_lowercase(),
        data_type.map(str::to_ascii_lowercase),
    )
}

fn resolve_data_type(path: &Path, tag: Option<&str>, default: DataType) -> Result<DataType> {
    match tag {
        None => Ok(default),
        Some(tag) => tag.parse().map_err(|e: String| Error::malformed(path, e)),
    }
}

// ---------------------------------------------------------------------------
// Plain-text CV
// ---------------------------------------------------------------------------

const WHITESPACE_CV_COLUMNS: [&str; 4] = ["cycle", "time", "Ewe", "I"];

/// Whitespace-separated `cycle time Ewe I` rows without a header.
fn load_whitespace_cv(path: &Path, data_type: Option<&str>) -> Result<Table> {
    let data_type = resolve_data_type(path, data_type, DataType::Cv)?;
    if data_type != DataType::Cv {
        return Err(Error::UnsupportedFormat {
            format: "txt".into(),
            data_type: Some(data_type.tag().into()),
        });
    }

    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    let mut cells: [Vec<&str>; 4] = Default::default();
    for (line_no, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != WHITESPACE_CV_COLUMNS.len() {
            return Err(Error::malformed(
                path,
                format!(
                    "line {}: expected {} columns, found {}",
                    line_no + 1,
                    WHITESPACE_CV_COLUMNS.len(),
                    fields.len()
                ),
            ));
        }
        for (column, field) in cells.iter_mut().zip(fields) {
            column.push(field);
        }
    }

    let mut raw = Table::default();
    for (name, values) in WHITESPACE_CV_COLUMNS.iter().zip(&cells) {
        let column = infer_column(values)
            .map_err(|e| Error::malformed(path, format!("column '{name}': {e}")))?;
        raw.push_column(*name, column).map_err(|e| Error::malformed(path, e))?;
    }
    raw.conform(path, DataType::Cv)
}

/// Integer column if every cell parses as an integer, float otherwise.
fn infer_column(cells: &[&str]) -> std::result::Result<Column, String> {
    if let Ok(ints) = cells
        .iter()
        .map(|c| c.parse::<i64>())
        .collect::<std::result::Result<Vec<_>, _>>()
    {
        return Ok(Column::Integer(ints));
    }
    cells
        .iter()
        .enumerate()
        .map(|(row, c)| c.parse::<f64>().map_err(|_| format!("row {row}: '{c}' is not a number")))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(Column::Float)
}

// ---------------------------------------------------------------------------
// Vendor format (.mpt)
// ---------------------------------------------------------------------------

/// Select and rename vendor columns for the requested data type.
fn load_vendor(extractor: &dyn Extractor, path: &Path, data_type: Option<&str>) -> Result<Table> {
    let data_type = resolve_data_type(path, data_type, DataType::Cv)?;
    let raw = extractor.extract(path, "eclab.mpt")?;
    match data_type {
        DataType::Cv => raw.select(
            path,
            &[
                ("cycle number", "cycle", ColumnKind::Integer),
                ("time", "time", ColumnKind::Float),
                ("Ewe", "Ewe", ColumnKind::Float),
                ("<I>", "I", ColumnKind::Float),
            ],
        ),
        DataType::Eis => raw.conform(path, DataType::Eis),
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Flat numeric columns (Int32/Int64/Float32/Float64), named per contract.
/// Works with files written by Pandas (`df.to_parquet()`) and Polars.
fn load_parquet(path: &Path, data_type: Option<&str>) -> Result<Table> {
    let data_type = resolve_data_type(path, data_type, DataType::Cv)?;

    let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::malformed(path, format!("reading parquet metadata: {e}")))?;
    let reader = builder
        .build()
        .map_err(|e| Error::malformed(path, format!("building parquet reader: {e}")))?;

    let mut names: Vec<String> = Vec::new();
    let mut columns: Vec<Option<Column>> = Vec::new();
    // Set once any chunk of the column is non-numeric or an integer with nulls.
    let mut dropped: Vec<bool> = Vec::new();

    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| Error::malformed(path, format!("reading parquet record batch: {e}")))?;
        let schema = batch.schema();

        if names.is_empty() {
            names = schema.fields().iter().map(|f| f.name().clone()).collect();
            columns = vec![None; names.len()];
            dropped = vec![false; names.len()];
        }

        for (idx, column) in columns.iter_mut().enumerate() {
            if dropped[idx] {
                continue;
            }
            let Some(chunk) = extract_numeric(batch.column(idx).as_ref()) else {
                log::debug!("{}: skipping column '{}'", path.display(), names[idx]);
                dropped[idx] = true;
                *column = None;
                continue;
            };
            let merged = match (column.take(), chunk) {
                (None, chunk) => chunk,
                (Some(Column::Integer(mut acc)), Column::Integer(more)) => {
                    acc.extend(more);
                    Column::Integer(acc)
                }
                (Some(Column::Float(mut acc)), Column::Float(more)) => {
                    acc.extend(more);
                    Column::Float(acc)
                }
                (Some(acc), more) => {
                    let mut widened = acc.to_f64();
                    widened.extend(more.to_f64());
                    Column::Float(widened)
                }
            };
            *column = Some(merged);
        }
    }

    let mut raw = Table::default();
    for (name, column) in names.into_iter().zip(columns) {
        if let Some(column) = column {
            raw.push_column(name, column).map_err(|e| Error::malformed(path, e))?;
        }
    }
    raw.conform(path, data_type)
}

/// Numeric Arrow array as a column; nulls become NaN (floats) or fail (ints).
fn extract_numeric(array: &dyn Array) -> Option<Column> {
    let any = array.as_any();
    match array.data_type() {
        ArrowType::Int32 => {
            let arr = any.downcast_ref::<Int32Array>()?;
            if arr.null_count() > 0 {
                return None;
            }
            Some(Column::Integer(arr.values().iter().map(|&v| v as i64).collect()))
        }
        ArrowType::Int64 => {
            let arr = any.downcast_ref::<Int64Array>()?;
            if arr.null_count() > 0 {
                return None;
            }
            Some(Column::Integer(arr.values().to_vec()))
        }
        ArrowType::Float32 => {
            let arr = any.downcast_ref::<Float32Array>()?;
            Some(Column::Float(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect()))
        }
        ArrowType::Float64 => {
            let arr = any.downcast_ref::<Float64Array>()?;
            Some(Column::Float(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{ArrayRef, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn names(table: &Table) -> Vec<&str> {
        table.column_names().iter().map(String::as_str).collect()
    }

    #[test]
    fn whitespace_cv_infers_integer_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "run.txt",
            "1 0.0 0.10 1e-3\n1  0.1 0.20 2e-3\n\n2 0.2 0.30 -1e-3\n",
        );
        let table = LoaderRegistry::with_builtin()
            .load(&path, ".TXT", Some("CV"))
            .unwrap();
        assert_eq!(names(&table), ["cycle", "time", "Ewe", "I"]);
        assert_eq!(table.column("cycle"), Some(&Column::Integer(vec![1, 1, 2])));
        assert_eq!(table.num_rows(), 3);
    }

    #[test]
    fn whitespace_cv_rejects_wrong_column_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "bad.txt", "1 0.0 0.1\n");
        let err = LoaderRegistry::with_builtin()
            .load(&path, "txt", Some("cv"))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedData { .. }));
    }

    #[test]
    fn no_fallback_to_format_default() {
        let mut registry = LoaderRegistry::new();
        registry.register("dat", None, Box::new(|_, _| Ok(Table::default())));
        assert!(registry.supports("DAT", None));
        assert!(!registry.supports("dat", Some("cv")));

        let err = registry
            .load(Path::new("x.dat"), "dat", Some("cv"))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
        assert!(registry.load(Path::new("x.dat"), "dat", None).is_ok());
    }

    #[test]
    fn re_registering_replaces_transform() {
        let mut registry = LoaderRegistry::new();
        registry.register("dat", Some("cv"), Box::new(|_, _| Ok(Table::default())));
        registry.register(
            ".DAT",
            Some("CV"),
            Box::new(|_, _| {
                Ok(Table::from_columns([("x", Column::Float(vec![1.0]))]).unwrap())
            }),
        );
        assert_eq!(registry.keys().len(), 1);
        let table = registry.load(Path::new("x.dat"), "dat", Some("cv")).unwrap();
        assert_eq!(table.num_rows(), 1);
    }

    #[test]
    fn transform_receives_lowercased_data_type() {
        let mut registry = LoaderRegistry::new();
        registry.register(
            "dat",
            Some("eis"),
            Box::new(|path, dtype| {
                assert_eq!(dtype, Some("eis"));
                Err(Error::malformed(path, "checked"))
            }),
        );
        let err = registry
            .load(Path::new("x.dat"), "Dat", Some("EIS"))
            .unwrap_err();
        assert!(err.to_string().contains("checked"));
    }

    #[test]
    fn missing_file_surfaces_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoaderRegistry::with_builtin()
            .load(&dir.path().join("nope.txt"), "txt", Some("cv"))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn vendor_default_data_type_is_cv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "cv.mpt",
            "EC-Lab ASCII FILE\nNb header lines : 3\n\
time/s\tEwe/V\t<I>/mA\tcycle number\n\
0.0\t0.1\t0.5\t1.0\n\
0.5\t0.2\t0.6\t2.0\n",
        );
        let table = LoaderRegistry::with_builtin()
            .load(&path, "mpt", None)
            .unwrap();
        assert_eq!(names(&table), ["cycle", "time", "Ewe", "I"]);
        assert_eq!(table.column("cycle"), Some(&Column::Integer(vec![1, 2])));
        assert_eq!(table.column("I"), Some(&Column::Float(vec![0.5, 0.6])));
    }

    #[test]
    fn vendor_missing_columns_are_named() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "eis.mpt",
            "EC-Lab ASCII FILE\nNb header lines : 3\n\
freq/Hz\tRe(Z)/Ohm\t-Im(Z)/Ohm\n\
1000\t10\t2\n",
        );
        let err = LoaderRegistry::with_builtin()
            .load(&path, "mpt", Some("eis"))
            .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::MalformedData { .. }));
        assert!(msg.contains("alpha"), "{msg}");
    }

    #[test]
    fn parquet_table_is_conformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("sample", ArrowType::Utf8, false),
            Field::new("I", ArrowType::Float64, false),
            Field::new("Ewe", ArrowType::Float64, false),
            Field::new("time", ArrowType::Float32, false),
            Field::new("cycle", ArrowType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![
                Arc::new(StringArray::from(vec!["a", "a"])) as ArrayRef,
                Arc::new(Float64Array::from(vec![1.0, 2.0])) as ArrayRef,
                Arc::new(Float64Array::from(vec![0.1, 0.2])) as ArrayRef,
                Arc::new(Float32Array::from(vec![0.0f32, 0.5])) as ArrayRef,
                Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = LoaderRegistry::with_builtin()
            .load(&path, "parquet", Some("cv"))
            .unwrap();
        assert_eq!(names(&table), ["cycle", "time", "Ewe", "I"]);
        assert_eq!(table.column("time"), Some(&Column::Float(vec![0.0, 0.5])));

        let err = LoaderRegistry::with_builtin()
            .load(&path, "parquet", Some("eis"))
            .unwrap_err();
        assert!(err.to_string().contains("freq, Z_real, Z_imag, alpha"));
    }

    #[test]
    fn parquet_nullable_extra_column_spanning_batches_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.parquet");
        let rows = 3000;

        let schema = Arc::new(Schema::new(vec![
            Field::new("cycle", ArrowType::Int64, false),
            Field::new("time", ArrowType::Float64, false),
            Field::new("Ewe", ArrowType::Float64, false),
            Field::new("I", ArrowType::Float64, false),
            Field::new("flag", ArrowType::Int64, true),
        ]));
        let flag: Vec<Option<i64>> = (0..rows).map(|i| (i > 0).then_some(1)).collect();
        let batch = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![
                Arc::new(Int64Array::from_iter_values((0..rows).map(|i| i / 1000 + 1))) as ArrayRef,
                Arc::new(Float64Array::from_iter_values((0..rows).map(|i| i as f64))) as ArrayRef,
                Arc::new(Float64Array::from_iter_values((0..rows).map(|i| i as f64 * 1e-3)))
                    as ArrayRef,
                Arc::new(Float64Array::from_iter_values((0..rows).map(|_| 1e-3))) as ArrayRef,
                Arc::new(Int64Array::from(flag)) as ArrayRef,
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = LoaderRegistry::with_builtin()
            .load(&path, "parquet", Some("cv"))
            .unwrap();
        assert_eq!(names(&table), ["cycle", "time", "Ewe", "I"]);
        assert_eq!(table.num_rows(), rows as usize);
        assert_eq!(table.cycles().into_iter().collect::<Vec<_>>(), [1, 2, 3]);
    }
}

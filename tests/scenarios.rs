use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType as ArrowType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use electro_browser::data::eclab::Extractor;
use electro_browser::data::loader::LoaderRegistry;
use electro_browser::data::model::{Column, ColumnKind, DataType, Table};
use electro_browser::trace::{StylePatch, TraceStore};
use electro_browser::Error;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Stands in for the vendor parser: returns a fixed raw table with the
/// column names the real extractor produces.
struct CannedExtractor;

impl Extractor for CannedExtractor {
    fn extract(&self, path: &Path, _format: &str) -> electro_browser::Result<Table> {
        Table::from_columns([
            ("mode", Column::Float(vec![2.0, 2.0, 2.0])),
            ("cycle number", Column::Float(vec![1.0, 2.0, 3.0])),
            ("time", Column::Float(vec![0.0, 1.0, 2.0])),
            ("Ewe", Column::Float(vec![0.1, 0.2, 0.3])),
            ("<I>", Column::Float(vec![1e-3, 2e-3, 3e-3])),
            ("freq", Column::Float(vec![1e3, 1e2, 1e1])),
            ("Z_real", Column::Float(vec![10.0, 20.0, 30.0])),
            ("Z_imag", Column::Float(vec![-1.0, -5.0, -2.0])),
            ("alpha", Column::Float(vec![0.9, 0.9, 0.9])),
        ])
        .map_err(|e| Error::malformed(path, e))
    }
}

fn names(table: &Table) -> Vec<&str> {
    table.column_names().iter().map(String::as_str).collect()
}

/// Only `(txt, cv)`, `(mpt, cv)` and `(mpt, eis)` registered.
fn minimal_registry() -> LoaderRegistry {
    let full = Arc::new(LoaderRegistry::with_extractor(Arc::new(CannedExtractor)));
    let mut registry = LoaderRegistry::new();
    for (format, data_type) in [(".txt", "cv"), (".mpt", "cv"), (".mpt", "eis")] {
        let full = Arc::clone(&full);
        registry.register(
            format,
            Some(data_type),
            Box::new(move |path: &Path, dtype: Option<&str>| full.load(path, format, dtype)),
        );
    }
    registry
}

#[test]
fn registered_keys_resolve_case_insensitively() -> TestResult {
    let registry = minimal_registry();

    let eis = registry.load(Path::new("x.mpt"), "MPT", Some("EIS"))?;
    assert_eq!(names(&eis), ["freq", "Z_real", "Z_imag", "alpha"]);

    let cv = registry.load(Path::new("x.mpt"), ".mpt", Some("cv"))?;
    assert_eq!(names(&cv), ["cycle", "time", "Ewe", "I"]);
    assert_eq!(cv.column("cycle"), Some(&Column::Integer(vec![1, 2, 3])));

    Ok(())
}

#[test]
fn unregistered_keys_are_unsupported() {
    let registry = minimal_registry();
    for (format, data_type) in [("csv", Some("cv")), ("mpt", None), ("txt", Some("eis"))] {
        let err = registry
            .load(Path::new("x.csv"), format, data_type)
            .unwrap_err();
        assert!(
            matches!(err, Error::UnsupportedFormat { .. }),
            "{format}/{data_type:?}: {err}"
        );
    }
}

const MPT_CV: &str = "EC-Lab ASCII FILE\nNb header lines : 4\n\n\
mode\ttime/s\tEwe/V\t<I>/mA\tcycle number\t\n\
2\t0,000\t0,100\t1,5E-3\t1,000\t\n\
2\t0,500\t0,200\t2,5E-3\t2,000\t\n";

const MPT_EIS: &str = "EC-Lab ASCII FILE\nNb header lines : 4\n\n\
freq/Hz\tRe(Z)/Ohm\t-Im(Z)/Ohm\talpha\t\n\
1,0E+3\t1,0E+1\t2,0E+0\t9,0E-1\t\n";

/// Parquet file holding exactly the contract columns of `data_type`.
fn write_contract_parquet(path: &Path, data_type: DataType) -> TestResult {
    let rows = 3;
    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();
    for (name, kind) in data_type.columns() {
        match kind {
            ColumnKind::Integer => {
                fields.push(Field::new(*name, ArrowType::Int64, false));
                arrays.push(Arc::new(Int64Array::from_iter_values(1..=rows)));
            }
            ColumnKind::Float => {
                fields.push(Field::new(*name, ArrowType::Float64, false));
                arrays.push(Arc::new(Float64Array::from_iter_values(
                    (1..=rows).map(|i| i as f64 * 0.5),
                )));
            }
        }
    }
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(Arc::clone(&schema), arrays)?;
    let mut writer = ArrowWriter::try_new(std::fs::File::create(path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// A well-formed file for one registry key.
fn write_fixture(
    dir: &Path,
    format: &str,
    data_type: DataType,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.join(format!("{}.{format}", data_type.tag()));
    match (format, data_type) {
        ("txt", DataType::Cv) => std::fs::write(&path, "1 0.0 0.1 1e-3\n2 0.5 0.2 2e-3\n")?,
        ("mpt", DataType::Cv) => std::fs::write(&path, MPT_CV)?,
        ("mpt", DataType::Eis) => std::fs::write(&path, MPT_EIS)?,
        ("parquet", _) => write_contract_parquet(&path, data_type)?,
        _ => return Err(format!("no fixture for {format}/{data_type}").into()),
    }
    Ok(path)
}

#[test]
fn builtin_formats_match_column_contracts() -> TestResult {
    let dir = tempfile::tempdir()?;
    let registry = LoaderRegistry::with_builtin();
    let keys = registry.keys();
    assert_eq!(keys.len(), 6, "{keys:?}");

    for (format, tag) in keys {
        let data_type: DataType = match tag.as_deref() {
            Some(tag) => tag.parse()?,
            None => DataType::Cv,
        };
        let path = write_fixture(dir.path(), &format, data_type)?;

        let table = registry.load(&path, &format, tag.as_deref())?;
        let contract: Vec<&str> = data_type.columns().iter().map(|(name, _)| *name).collect();
        assert_eq!(names(&table), contract, "{format}/{tag:?}");
        for (name, kind) in data_type.columns() {
            let column = table.column(name).ok_or(format!("{format}/{tag:?}: no {name}"))?;
            assert_eq!(column.kind(), *kind, "{format}/{tag:?}: {name}");
        }
        assert!(table.num_rows() > 0, "{format}/{tag:?}");
    }

    let eis = registry.load(&dir.path().join("eis.mpt"), "mpt", Some("eis"))?;
    assert_eq!(eis.column("Z_imag"), Some(&Column::Float(vec![-2.0])));
    let cv = registry.load(&dir.path().join("cv.mpt"), "mpt", Some("cv"))?;
    assert_eq!(cv.column("cycle"), Some(&Column::Integer(vec![1, 2])));

    Ok(())
}

#[test]
fn trace_lifecycle_through_the_store() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sweep.txt");
    std::fs::write(
        &path,
        "1 0.0 0.1 1.0\n2 0.1 0.2 2.0\n3 0.2 0.3 3.0\n2 0.3 0.4 4.0\n",
    )?;
    let registry = LoaderRegistry::with_builtin();
    let mut store = TraceStore::new();

    let label = store.add_trace(&registry, &path, "txt", Some("cv"))?;
    let copy = store.duplicate_trace(&label)?;
    assert_eq!(copy, "sweep.txt_copy");

    let view = store.set_style(&copy, &StylePatch::default().cycle_filter(2))?;
    assert_eq!(view.column("I"), Some(&Column::Float(vec![2.0, 4.0])));
    assert_eq!(store.get_view_table(&label)?.num_rows(), 4);

    store.rename_trace(&copy, "second cycle")?;
    store.remove_trace(&label)?;
    assert_eq!(store.labels(), ["second cycle"]);
    assert!(store.remove_trace(&label).unwrap_err().is_not_found());

    Ok(())
}

use std::path::Path;

use crate::error::{Error, Result};

use super::model::{Column, Table};

// ---------------------------------------------------------------------------
// Extractor – turns a vendor file into a raw table
// ---------------------------------------------------------------------------

/// Parses a vendor file into a raw table with the instrument's own column
/// names. Column selection for a data type happens in the loader.
pub trait Extractor: Send + Sync {
    fn extract(&self, path: &Path, format: &str) -> Result<Table>;
}

// ---------------------------------------------------------------------------
// EC-Lab ASCII (.mpt)
// ---------------------------------------------------------------------------

const MAGIC: &str = "EC-Lab ASCII FILE";

/// Header → normalized column name. Headers not listed are kept verbatim.
const ALIASES: &[(&str, &str)] = &[
    ("time/s", "time"),
    ("Ewe/V", "Ewe"),
    ("Ece/V", "Ece"),
    ("<I>/mA", "<I>"),
    ("I/mA", "I"),
    ("control/V", "control"),
    ("freq/Hz", "freq"),
    ("Re(Z)/Ohm", "Z_real"),
    ("Im(Z)/Ohm", "Z_imag"),
    ("|Z|/Ohm", "|Z|"),
    ("Phase(Z)/deg", "Phase(Z)"),
    ("Q-Qo/mA.h", "Q-Qo"),
];

/// `-Im(Z)` is stored with the sign flipped; it becomes `Z_imag`.
const NEG_IMAG: &str = "-Im(Z)/Ohm";

/// Reader for BioLogic EC-Lab ASCII exports.
///
/// Layout:
/// ```text
/// EC-Lab ASCII FILE
/// Nb header lines : 4
/// <free-form settings ...>
/// time/s<TAB>Ewe/V<TAB><I>/mA<TAB>cycle number
/// 0,000<TAB>0,10<TAB>1,2E-3<TAB>1,000
/// ```
/// The column header is the last of the `Nb header lines`. Numbers may use
/// a comma as decimal separator.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcLabExtractor;

impl Extractor for EcLabExtractor {
    fn extract(&self, path: &Path, _format: &str) -> Result<Table> {
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        // EC-Lab writes Windows-1252 ("µ" in unit names); only ASCII matters here.
        let text = String::from_utf8_lossy(&bytes);
        parse_mpt(path, &text)
    }
}

fn parse_mpt(path: &Path, text: &str) -> Result<Table> {
    let lines: Vec<&str> = text.lines().collect();

    if !lines.first().is_some_and(|l| l.trim().starts_with(MAGIC)) {
        return Err(Error::malformed(path, format!("missing '{MAGIC}' marker")));
    }

    let n_header = lines
        .iter()
        .take(4)
        .find_map(|l| {
            let (key, value) = l.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case("Nb header lines")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .ok_or_else(|| Error::malformed(path, "missing 'Nb header lines'"))?;

    if n_header < 2 || n_header > lines.len() {
        return Err(Error::malformed(
            path,
            format!("header declares {n_header} lines but file has {}", lines.len()),
        ));
    }

    // Column header line plus data rows, handed to the tab-separated reader.
    let body = lines[n_header - 1..].join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::malformed(path, format!("reading column header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    // Trailing tabs produce empty header cells; those columns are dropped.
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

    for (row_no, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::malformed(path, format!("row {row_no}: {e}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        for (col_idx, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let cell = record.get(col_idx).unwrap_or("");
            let value = parse_number(cell).ok_or_else(|| {
                Error::malformed(
                    path,
                    format!("row {row_no}, column '{header}': '{cell}' is not a number"),
                )
            })?;
            values[col_idx].push(value);
        }
    }

    let mut table = Table::default();
    for (header, column) in headers.into_iter().zip(values) {
        if header.is_empty() {
            continue;
        }
        let (name, column) = normalize(&header, column);
        table
            .push_column(name, Column::Float(column))
            .map_err(|e| Error::malformed(path, e))?;
    }
    Ok(table)
}

fn normalize(header: &str, column: Vec<f64>) -> (String, Vec<f64>) {
    if header == NEG_IMAG {
        return ("Z_imag".to_string(), column.into_iter().map(|v| -v).collect());
    }
    let name = ALIASES
        .iter()
        .find(|(raw, _)| *raw == header)
        .map_or(header, |(_, alias)| *alias);
    (name.to_string(), column)
}

fn parse_number(cell: &str) -> Option<f64> {
    if cell.contains(',') {
        cell.replace(',', ".").parse().ok()
    } else {
        cell.parse().ok()
    }
}

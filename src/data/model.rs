use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// DataType – the analysis kind, which fixes the column contract
// ---------------------------------------------------------------------------

/// Numeric type of a contract column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
}

/// Electrochemical analysis kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Cyclic voltammetry.
    Cv,
    /// Electrochemical impedance spectroscopy.
    Eis,
}

impl DataType {
    /// Required columns of a normalized table, in order.
    pub fn columns(self) -> &'static [(&'static str, ColumnKind)] {
        match self {
            DataType::Cv => &[
                ("cycle", ColumnKind::Integer),
                ("time", ColumnKind::Float),
                ("Ewe", ColumnKind::Float),
                ("I", ColumnKind::Float),
            ],
            DataType::Eis => &[
                ("freq", ColumnKind::Float),
                ("Z_real", ColumnKind::Float),
                ("Z_imag", ColumnKind::Float),
                ("alpha", ColumnKind::Float),
            ],
        }
    }

    /// `(x, y)` column names plotted for this data type.
    pub fn plot_axes(self) -> (&'static str, &'static str) {
        match self {
            DataType::Cv => ("Ewe", "I"),
            DataType::Eis => ("Z_real", "Z_imag"),
        }
    }

    /// Lower-case tag used as a registry key.
    pub fn tag(self) -> &'static str {
        match self {
            DataType::Cv => "cv",
            DataType::Eis => "eis",
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cv" => Ok(DataType::Cv),
            "eis" => Ok(DataType::Eis),
            other => Err(format!("unknown data type '{other}'")),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Column – one named numeric series
// ---------------------------------------------------------------------------

/// Values of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Integer(Vec<i64>),
    Float(Vec<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Integer(v) => v.len(),
            Column::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Integer(_) => ColumnKind::Integer,
            Column::Float(_) => ColumnKind::Float,
        }
    }

    /// Value at `row` widened to `f64`.
    pub fn get_f64(&self, row: usize) -> Option<f64> {
        match self {
            Column::Integer(v) => v.get(row).map(|&i| i as f64),
            Column::Float(v) => v.get(row).copied(),
        }
    }

    /// All values widened to `f64`.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Column::Integer(v) => v.iter().map(|&i| i as f64).collect(),
            Column::Float(v) => v.clone(),
        }
    }

    /// Keep only rows whose mask entry is `true`, preserving order.
    pub fn retain_mask(&self, mask: &[bool]) -> Column {
        fn keep<T: Copy>(values: &[T], mask: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(mask)
                .filter(|(_, m)| **m)
                .map(|(v, _)| *v)
                .collect()
        }
        match self {
            Column::Integer(v) => Column::Integer(keep(v, mask)),
            Column::Float(v) => Column::Float(keep(v, mask)),
        }
    }

    /// Convert to the requested kind. Floats only become integers when
    /// every value is integral.
    pub fn coerce(self, kind: ColumnKind) -> std::result::Result<Column, String> {
        match (self, kind) {
            (c @ Column::Integer(_), ColumnKind::Integer) => Ok(c),
            (c @ Column::Float(_), ColumnKind::Float) => Ok(c),
            (Column::Integer(v), ColumnKind::Float) => {
                Ok(Column::Float(v.into_iter().map(|i| i as f64).collect()))
            }
            (Column::Float(v), ColumnKind::Integer) => v
                .into_iter()
                .enumerate()
                .map(|(row, f)| {
                    if f.is_finite() && f.fract() == 0.0 {
                        Ok(f as i64)
                    } else {
                        Err(format!("row {row}: {f} is not an integer"))
                    }
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Column::Integer),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – rectangular, column-oriented dataset
// ---------------------------------------------------------------------------

/// Named numeric columns of equal length. Row order is the order of the
/// source file and is never changed except by explicit filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, rejecting duplicate names and ragged columns.
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Column)>,
    ) -> std::result::Result<Self, String> {
        let mut table = Table::default();
        for (name, column) in columns {
            table.push_column(name, column)?;
        }
        Ok(table)
    }

    /// Append a column; its length must match the existing rows.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> std::result::Result<(), String> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(format!("duplicate column '{name}'"));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(format!(
                    "column '{name}' has {} rows, expected {}",
                    column.len(),
                    first.len()
                ));
            }
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Iterate `(name, column)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Keep only rows whose mask entry is `true`.
    pub fn retain_rows(&self, mask: &[bool]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.retain_mask(mask)).collect(),
        }
    }

    /// Select `(source, target)` columns, renaming and coercing each to the
    /// given kind. Fails with the names of every absent source column.
    pub fn select(
        &self,
        path: &Path,
        spec: &[(&str, &str, ColumnKind)],
    ) -> Result<Table> {
        let missing: Vec<&str> = spec
            .iter()
            .filter(|(source, _, _)| !self.has_column(source))
            .map(|(source, _, _)| *source)
            .collect();
        if !missing.is_empty() {
            return Err(Error::missing_columns(path, &missing));
        }

        let mut out = Table::default();
        for (source, target, kind) in spec {
            let column = self
                .column(source)
                .cloned()
                .ok_or_else(|| Error::missing_columns(path, &[*source]))?
                .coerce(*kind)
                .map_err(|e| Error::malformed(path, format!("column '{source}': {e}")))?;
            out.push_column(*target, column)
                .map_err(|e| Error::malformed(path, e))?;
        }
        Ok(out)
    }

    /// Project onto the column contract of `data_type` (names unchanged).
    pub fn conform(&self, path: &Path, data_type: DataType) -> Result<Table> {
        let spec: Vec<(&str, &str, ColumnKind)> = data_type
            .columns()
            .iter()
            .map(|&(name, kind)| (name, name, kind))
            .collect();
        self.select(path, &spec)
    }

    /// Sorted set of distinct values in the `cycle` column.
    pub fn cycles(&self) -> BTreeSet<i64> {
        match self.column("cycle") {
            Some(Column::Integer(v)) => v.iter().copied().collect(),
            Some(Column::Float(v)) => v.iter().map(|&f| f as i64).collect(),
            None => BTreeSet::new(),
        }
    }

    /// `[x, y]` pairs for two columns, in row order.
    pub fn points(&self, x: &str, y: &str) -> Option<Vec<[f64; 2]>> {
        let xs = self.column(x)?;
        let ys = self.column(y)?;
        Some(
            (0..self.num_rows())
                .filter_map(|row| Some([xs.get_f64(row)?, ys.get_f64(row)?]))
                .collect(),
        )
    }
}

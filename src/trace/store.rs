use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::data::filter::cycle_view;
use crate::data::loader::LoaderRegistry;
use crate::data::model::{DataType, Table};
use crate::error::{Error, Result};

use super::style::{StylePatch, StyleSpec};

// ---------------------------------------------------------------------------
// Trace – one loaded dataset plus its style
// ---------------------------------------------------------------------------

/// A named, independently styled dataset.
#[derive(Debug, Clone)]
pub struct Trace {
    /// Full, unfiltered load result.
    table: Table,
    style: StyleSpec,
    /// Data type the table was loaded as (`None` = format default).
    data_type: Option<DataType>,
    source: PathBuf,
}

impl Trace {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn style(&self) -> &StyleSpec {
        &self.style
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The table restricted to the active cycle filter.
    pub fn view(&self) -> Cow<'_, Table> {
        cycle_view(&self.table, self.style.cycle_filter)
    }

    /// `(x, y)` column names to plot.
    pub fn plot_axes(&self) -> (&'static str, &'static str) {
        self.data_type.unwrap_or(DataType::Cv).plot_axes()
    }
}

// ---------------------------------------------------------------------------
// TraceStore
// ---------------------------------------------------------------------------

/// Owns every trace by label and keeps their legend order.
///
/// All operations either fully apply or leave the store untouched.
#[derive(Debug, Default)]
pub struct TraceStore {
    traces: HashMap<String, Trace>,
    /// Labels in legend order.
    order: Vec<String>,
}

impl TraceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.traces.contains_key(label)
    }

    /// Labels in legend order.
    pub fn labels(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, label: &str) -> Result<&Trace> {
        self.traces
            .get(label)
            .ok_or_else(|| Error::NotFound(label.to_string()))
    }

    /// `(label, trace)` pairs in legend order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Trace)> {
        self.order
            .iter()
            .filter_map(|label| Some((label.as_str(), self.traces.get(label)?)))
    }

    /// Load `path` through `registry` and add it labelled by its file name.
    ///
    /// A label collision is an error; plain adds are never auto-suffixed.
    pub fn add_trace(
        &mut self,
        registry: &LoaderRegistry,
        path: &Path,
        format: &str,
        data_type: Option<&str>,
    ) -> Result<String> {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::FileNotFound {
                path: path.to_path_buf(),
            })?;
        if self.contains(&label) {
            return Err(Error::DuplicateLabel(label));
        }

        let table = registry.load(path, format, data_type)?;
        log::info!(
            "Loaded '{label}': {} rows, columns {:?}",
            table.num_rows(),
            table.column_names()
        );

        let trace = Trace {
            table,
            style: StyleSpec::default(),
            data_type: data_type.and_then(|t| t.parse().ok()),
            source: path.to_path_buf(),
        };
        self.insert(label.clone(), trace);
        Ok(label)
    }

    /// Add an already loaded table under `label`.
    pub fn insert_table(
        &mut self,
        label: &str,
        table: Table,
        data_type: Option<DataType>,
    ) -> Result<()> {
        if self.contains(label) {
            return Err(Error::DuplicateLabel(label.to_string()));
        }
        let trace = Trace {
            table,
            style: StyleSpec::default(),
            data_type,
            source: PathBuf::new(),
        };
        self.insert(label.to_string(), trace);
        Ok(())
    }

    /// Delete a trace and its table. Removing twice is an error.
    pub fn remove_trace(&mut self, label: &str) -> Result<Trace> {
        let trace = self
            .traces
            .remove(label)
            .ok_or_else(|| Error::NotFound(label.to_string()))?;
        self.order.retain(|l| l != label);
        log::info!("Removed trace '{label}'");
        Ok(trace)
    }

    /// Copy a trace (table and style) under `label_copy`, `label_copy1`, …
    /// whichever is the first unused label. The copy is appended.
    pub fn duplicate_trace(&mut self, label: &str) -> Result<String> {
        let original = self.get(label)?;
        // Deep copy: the duplicate owns its own table storage.
        let copy = original.clone();

        let new_label = self.copy_label(label);
        log::info!("Duplicated '{label}' as '{new_label}'");
        self.insert(new_label.clone(), copy);
        Ok(new_label)
    }

    /// Move a trace to a new label, keeping its legend position.
    pub fn rename_trace(&mut self, label: &str, new_label: &str) -> Result<()> {
        if !self.contains(label) {
            return Err(Error::NotFound(label.to_string()));
        }
        if label == new_label {
            return Ok(());
        }
        if self.contains(new_label) {
            return Err(Error::DuplicateLabel(new_label.to_string()));
        }

        if let Some(trace) = self.traces.remove(label) {
            self.traces.insert(new_label.to_string(), trace);
        }
        if let Some(slot) = self.order.iter_mut().find(|l| *l == label) {
            *slot = new_label.to_string();
        }
        log::info!("Renamed trace '{label}' to '{new_label}'");
        Ok(())
    }

    /// Merge `patch` into the trace's style and return the new view table.
    pub fn set_style(&mut self, label: &str, patch: &StylePatch) -> Result<Cow<'_, Table>> {
        let trace = self
            .traces
            .get_mut(label)
            .ok_or_else(|| Error::NotFound(label.to_string()))?;
        let style = trace.style.merged(patch)?;
        if style != trace.style {
            log::debug!("Restyled '{label}': {style:?}");
        }
        trace.style = style;
        Ok(trace.view())
    }

    pub fn style(&self, label: &str) -> Result<&StyleSpec> {
        self.get(label).map(Trace::style)
    }

    /// The trace's table after its cycle filter, rows in original order.
    pub fn get_view_table(&self, label: &str) -> Result<Cow<'_, Table>> {
        self.get(label).map(Trace::view)
    }

    fn insert(&mut self, label: String, trace: Trace) {
        self.order.push(label.clone());
        self.traces.insert(label, trace);
    }

    fn copy_label(&self, label: &str) -> String {
        let first = format!("{label}_copy");
        if !self.contains(&first) {
            return first;
        }
        (1u64..)
            .map(|i| format!("{label}_copy{i}"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or(first)
    }
}

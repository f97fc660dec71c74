use std::fmt::Display;
use std::path::PathBuf;

use electro_browser::config::AppConfig;
use electro_browser::data::browse::list_data_files;
use electro_browser::data::loader::LoaderRegistry;
use electro_browser::trace::{StylePatch, StyleSpec, TraceStore};

// ---------------------------------------------------------------------------
// Graph options
// ---------------------------------------------------------------------------

/// Axis labels and optional fixed ranges for the plot.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphOptions {
    pub x_label: String,
    pub y_label: String,
    /// `[min, max]`; ignored while `min == max`.
    pub x_range: [f64; 2],
    pub y_range: [f64; 2],
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            x_label: "Potential".into(),
            y_label: "Current".into(),
            x_range: [0.0, 0.0],
            y_range: [0.0, 0.0],
        }
    }
}

impl GraphOptions {
    /// Plot bounds after applying the fixed ranges to the current ones, or
    /// `None` if no range is fixed.
    pub fn fixed_bounds(&self, min: [f64; 2], max: [f64; 2]) -> Option<([f64; 2], [f64; 2])> {
        let x_fixed = self.x_range[0] != self.x_range[1];
        let y_fixed = self.y_range[0] != self.y_range[1];
        if !x_fixed && !y_fixed {
            return None;
        }
        let (x_min, x_max) = if x_fixed {
            (self.x_range[0], self.x_range[1])
        } else {
            (min[0], max[0])
        };
        let (y_min, y_max) = if y_fixed {
            (self.y_range[0], self.y_range[1])
        } else {
            (min[1], max[1])
        };
        Some(([x_min, y_min], [x_max, y_max]))
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,
    pub registry: LoaderRegistry,
    pub traces: TraceStore,

    /// Folder whose files are listed on the left.
    pub folder: Option<PathBuf>,
    pub files: Vec<PathBuf>,
    pub selected_file: Option<usize>,

    /// Format and data type used for the next load.
    pub file_format: String,
    pub data_type: String,

    /// Trace selected in the trace list.
    pub current_trace: Option<String>,
    /// Editor values for the selected trace.
    pub style_draft: StyleSpec,
    pub rename_buffer: String,

    pub graph: GraphOptions,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let mut state = Self {
            file_format: config.file_formats.first().cloned().unwrap_or_default(),
            data_type: config.data_types.first().cloned().unwrap_or_default(),
            registry: LoaderRegistry::with_builtin(),
            traces: TraceStore::new(),
            folder: None,
            files: Vec::new(),
            selected_file: None,
            current_trace: None,
            style_draft: StyleSpec::default(),
            rename_buffer: String::new(),
            graph: GraphOptions::default(),
            status_message: None,
            config,
        };
        if let Some(folder) = state.config.initial_folder.clone() {
            state.select_folder(folder);
        }
        state
    }

    fn report(&mut self, context: &str, err: impl Display) {
        log::error!("{context}: {err:#}");
        self.status_message = Some(format!("{context}: {err:#}"));
    }

    /// List the loadable files of `folder`.
    pub fn select_folder(&mut self, folder: PathBuf) {
        self.folder = Some(folder);
        self.refresh_file_list();
    }

    pub fn refresh_file_list(&mut self) {
        let Some(folder) = &self.folder else {
            return;
        };
        match list_data_files(folder, &self.registry) {
            Ok(files) => {
                log::info!("{} loadable files in {}", files.len(), folder.display());
                self.files = files;
                self.selected_file = None;
                self.status_message = None;
            }
            Err(e) => {
                self.files.clear();
                self.selected_file = None;
                self.report("Folder error", e);
            }
        }
    }

    /// Load the selected file with the chosen format and data type.
    pub fn add_selected_file(&mut self) {
        let Some(path) = self.selected_file.and_then(|i| self.files.get(i)).cloned() else {
            return;
        };
        let data_type = (!self.data_type.is_empty()).then_some(self.data_type.as_str());
        match self
            .traces
            .add_trace(&self.registry, &path, &self.file_format, data_type)
        {
            Ok(label) => {
                self.status_message = None;
                self.select_trace(&label);
            }
            Err(e) => self.report("Load error", e),
        }
    }

    /// Make `label` the trace edited by the option panels.
    pub fn select_trace(&mut self, label: &str) {
        match self.traces.style(label) {
            Ok(style) => {
                self.style_draft = *style;
                self.current_trace = Some(label.to_string());
                self.rename_buffer = label.to_string();
            }
            Err(e) => self.report("Select error", e),
        }
    }

    pub fn remove_current_trace(&mut self) {
        let Some(label) = self.current_trace.clone() else {
            return;
        };
        match self.traces.remove_trace(&label) {
            Ok(_) => {
                self.current_trace = None;
                self.rename_buffer.clear();
            }
            Err(e) => self.report("Remove error", e),
        }
    }

    pub fn duplicate_current_trace(&mut self) {
        let Some(label) = self.current_trace.clone() else {
            return;
        };
        if let Err(e) = self.traces.duplicate_trace(&label) {
            self.report("Duplicate error", e);
        }
    }

    /// Rename the selected trace to the contents of the rename field.
    pub fn rename_current_trace(&mut self) {
        let Some(label) = self.current_trace.clone() else {
            return;
        };
        let new_label = self.rename_buffer.trim().to_string();
        if new_label.is_empty() {
            return;
        }
        match self.traces.rename_trace(&label, &new_label) {
            Ok(()) => {
                self.current_trace = Some(new_label);
                self.status_message = None;
            }
            Err(e) => self.report("Rename error", e),
        }
    }

    /// Push the editor values to the selected trace.
    pub fn apply_style_draft(&mut self) {
        let Some(label) = self.current_trace.clone() else {
            return;
        };
        let patch = StylePatch::from(self.style_draft);
        if let Err(e) = self.traces.set_style(&label, &patch) {
            self.report("Style error", e);
            if let Ok(style) = self.traces.style(&label) {
                self.style_draft = *style;
            }
        }
    }
}

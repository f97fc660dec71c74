use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// What the top bar asked the app to do this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TopBarActions {
    pub export: bool,
}

/// Render the folder picker, format / data type selectors and export button.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) -> TopBarActions {
    let mut actions = TopBarActions::default();

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Select Folder").clicked() {
            open_folder_dialog(state);
        }

        let folder = state
            .folder
            .as_ref()
            .map(|f| f.display().to_string())
            .unwrap_or_default();
        ui.label(RichText::new(folder).monospace());

        ui.separator();

        ui.label("Filetype:");
        egui::ComboBox::from_id_salt("file_format")
            .selected_text(&state.file_format)
            .show_ui(ui, |ui: &mut Ui| {
                for format in &state.config.file_formats {
                    ui.selectable_value(&mut state.file_format, format.clone(), format);
                }
            });

        ui.label("Data Type:");
        egui::ComboBox::from_id_salt("data_type")
            .selected_text(&state.data_type)
            .show_ui(ui, |ui: &mut Ui| {
                for data_type in &state.config.data_types {
                    ui.selectable_value(&mut state.data_type, data_type.clone(), data_type);
                }
            });

        ui.separator();

        if ui.button("Export Plot").clicked() {
            actions.export = true;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    actions
}

// ---------------------------------------------------------------------------
// Left side panel – files in folder
// ---------------------------------------------------------------------------

/// Render the file list and the "Add to Plot" button.
pub fn file_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Files in Folder");
    ui.separator();

    if state.folder.is_none() {
        ui.label("No folder selected.");
        return;
    }

    let mut add = false;
    ScrollArea::vertical()
        .max_height(ui.available_height() - 40.0)
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (idx, path) in state.files.iter().enumerate() {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let selected = state.selected_file == Some(idx);
                let response = ui.selectable_label(selected, name);
                if response.clicked() {
                    state.selected_file = Some(idx);
                }
                if response.double_clicked() {
                    add = true;
                }
            }
        });

    ui.separator();
    if ui
        .add_enabled(state.selected_file.is_some(), egui::Button::new("Add to Plot"))
        .clicked()
    {
        add = true;
    }
    if add {
        state.add_selected_file();
    }
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let mut dialog = rfd::FileDialog::new().set_title("Select data folder");
    if let Some(folder) = &state.folder {
        dialog = dialog.set_directory(folder);
    }
    if let Some(folder) = dialog.pick_folder() {
        state.select_folder(folder);
    }
}

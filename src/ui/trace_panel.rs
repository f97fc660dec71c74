use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use electro_browser::trace::style::LINE_WIDTH_RANGE;
use electro_browser::trace::{LineStyle, NamedColor};

use crate::color::color32;
use crate::state::AppState;

/// Upper bound of the cycle selector when a trace has no cycle column.
const MAX_CYCLE: u64 = 100;

// ---------------------------------------------------------------------------
// Right side panel – traces, trace options, graph options
// ---------------------------------------------------------------------------

pub fn trace_side_panel(ui: &mut Ui, state: &mut AppState) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Traces");
            ui.separator();
            trace_list(ui, state);
            trace_buttons(ui, state);

            ui.add_space(8.0);
            egui::CollapsingHeader::new(RichText::new("Trace Appearance").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| trace_options(ui, state));

            egui::CollapsingHeader::new(RichText::new("Graph Options").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| graph_options(ui, state));
        });
}

/// Table of traces with row and cycle counts; clicking a label selects it.
fn trace_list(ui: &mut Ui, state: &mut AppState) {
    if state.traces.is_empty() {
        ui.label("No traces on the plot.");
        return;
    }

    let mut clicked: Option<String> = None;
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(TableColumn::remainder().at_least(120.0))
        .column(TableColumn::auto())
        .column(TableColumn::auto())
        .header(18.0, |mut header| {
            header.col(|ui| {
                ui.strong("Trace");
            });
            header.col(|ui| {
                ui.strong("Rows");
            });
            header.col(|ui| {
                ui.strong("Cycles");
            });
        })
        .body(|mut body| {
            for (label, trace) in state.traces.iter() {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        let selected = state.current_trace.as_deref() == Some(label);
                        let text = RichText::new(label).color(color32(trace.style().color));
                        if ui.selectable_label(selected, text).clicked() {
                            clicked = Some(label.to_string());
                        }
                    });
                    row.col(|ui| {
                        ui.label(trace.view().num_rows().to_string());
                    });
                    row.col(|ui| {
                        ui.label(trace.table().cycles().len().to_string());
                    });
                });
            }
        });

    if let Some(label) = clicked {
        state.select_trace(&label);
    }
}

fn trace_buttons(ui: &mut Ui, state: &mut AppState) {
    let has_selection = state.current_trace.is_some();

    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(has_selection, egui::Button::new("Remove"))
            .clicked()
        {
            state.remove_current_trace();
        }
        if ui
            .add_enabled(has_selection, egui::Button::new("Duplicate"))
            .clicked()
        {
            state.duplicate_current_trace();
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        let edit = ui.add_enabled(
            has_selection,
            egui::TextEdit::singleline(&mut state.rename_buffer).desired_width(140.0),
        );
        let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui
            .add_enabled(has_selection, egui::Button::new("Rename"))
            .clicked()
            || submitted
        {
            state.rename_current_trace();
        }
    });
}

/// Style editor for the selected trace; every change is applied at once.
fn trace_options(ui: &mut Ui, state: &mut AppState) {
    let Some(label) = state.current_trace.clone() else {
        ui.label("Select a trace to edit its appearance.");
        return;
    };

    let max_cycle = state
        .traces
        .get(&label)
        .ok()
        .and_then(|t| t.table().cycles().last().copied())
        .and_then(|c| u64::try_from(c).ok())
        .unwrap_or(MAX_CYCLE);

    let draft = &mut state.style_draft;
    let before = *draft;

    egui::Grid::new("trace_options")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("Color:");
            egui::ComboBox::from_id_salt("trace_color")
                .selected_text(RichText::new(draft.color.name()).color(color32(draft.color)))
                .show_ui(ui, |ui: &mut Ui| {
                    for color in NamedColor::ALL {
                        let text = RichText::new(color.name()).color(color32(color));
                        ui.selectable_value(&mut draft.color, color, text);
                    }
                });
            ui.end_row();

            ui.label("Line Style:");
            egui::ComboBox::from_id_salt("trace_line_style")
                .selected_text(draft.line_style.name())
                .show_ui(ui, |ui: &mut Ui| {
                    for style in LineStyle::ALL {
                        ui.selectable_value(&mut draft.line_style, style, style.name());
                    }
                });
            ui.end_row();

            ui.label("Line Width:");
            ui.add(
                egui::DragValue::new(&mut draft.line_width)
                    .range(LINE_WIDTH_RANGE)
                    .speed(0.1)
                    .fixed_decimals(1),
            );
            ui.end_row();

            ui.label("Cycle (0 = all):");
            ui.add(egui::DragValue::new(&mut draft.cycle_filter).range(0..=max_cycle));
            ui.end_row();
        });

    if *draft != before {
        state.apply_style_draft();
    }
}

fn graph_options(ui: &mut Ui, state: &mut AppState) {
    let graph = &mut state.graph;

    egui::Grid::new("graph_options")
        .num_columns(3)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("X range:");
            ui.add(egui::DragValue::new(&mut graph.x_range[0]).speed(0.01));
            ui.add(egui::DragValue::new(&mut graph.x_range[1]).speed(0.01));
            ui.end_row();

            ui.label("Y range:");
            ui.add(egui::DragValue::new(&mut graph.y_range[0]).speed(0.01));
            ui.add(egui::DragValue::new(&mut graph.y_range[1]).speed(0.01));
            ui.end_row();

            ui.label("X label:");
            ui.text_edit_singleline(&mut graph.x_label);
            ui.end_row();

            ui.label("Y label:");
            ui.text_edit_singleline(&mut graph.y_label);
            ui.end_row();
        });

    if ui.small_button("Reset ranges").clicked() {
        graph.x_range = [0.0, 0.0];
        graph.y_range = [0.0, 0.0];
    }
}

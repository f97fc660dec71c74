use eframe::egui;

use electro_browser::config::AppConfig;

use crate::state::AppState;
use crate::ui::export::Exporter;
use crate::ui::{panels, plot, trace_panel};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ElectroBrowserApp {
    pub state: AppState,
    exporter: Exporter,
    plot_rect: egui::Rect,
}

impl ElectroBrowserApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
            exporter: Exporter::default(),
            plot_rect: egui::Rect::NOTHING,
        }
    }
}

impl eframe::App for ElectroBrowserApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: folder, format, data type, export ----
        let actions = egui::TopBottomPanel::top("top_bar")
            .show(ctx, |ui| panels::top_bar(ui, &mut self.state))
            .inner;
        if actions.export {
            self.exporter.request_with_dialog(self.state.config.export_scale);
        }

        // ---- Left side panel: files ----
        egui::SidePanel::left("file_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::file_panel(ui, &mut self.state);
            });

        // ---- Right side panel: traces and options ----
        egui::SidePanel::right("trace_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                trace_panel::trace_side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            self.plot_rect = plot::trace_plot(ui, &self.state);
        });

        if let Some(outcome) = self.exporter.poll(ctx, self.plot_rect) {
            self.state.status_message = match outcome {
                Ok(path) => Some(format!("Plot saved to {}", path.display())),
                Err(e) => Some(format!("Export error: {e:#}")),
            };
        } else if self.exporter.is_busy() {
            ctx.request_repaint();
        }
    }
}

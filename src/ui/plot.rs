use eframe::egui::{Rect, Ui};
use egui_plot::{Legend, Line, Plot, PlotBounds, PlotPoints};

use crate::color::{color32, plot_line_style};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Trace plot (central panel)
// ---------------------------------------------------------------------------

/// Render every trace's view table. Returns the screen rect of the plot,
/// used to crop exports.
pub fn trace_plot(ui: &mut Ui, state: &AppState) -> Rect {
    if state.traces.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Select a folder and add files to the plot");
        });
        return ui.min_rect();
    }

    let graph = &state.graph;

    Plot::new("trace_plot")
        .legend(Legend::default())
        .x_axis_label(graph.x_label.clone())
        .y_axis_label(graph.y_label.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (label, trace) in state.traces.iter() {
                let (x, y) = trace.plot_axes();
                let Some(points) = trace.view().points(x, y) else {
                    log::debug!("'{label}' has no '{x}'/'{y}' columns, skipped");
                    continue;
                };

                let style = trace.style();
                let line = Line::new(PlotPoints::from(points))
                    .name(label)
                    .color(color32(style.color))
                    .style(plot_line_style(style.line_style))
                    .width(style.line_width);

                plot_ui.line(line);
            }

            let current = plot_ui.plot_bounds();
            if let Some((min, max)) = graph.fixed_bounds(current.min(), current.max()) {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(min, max));
            }
        })
        .response
        .rect
}

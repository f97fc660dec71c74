use eframe::egui::Color32;
use egui_plot::LineStyle as PlotLineStyle;

use electro_browser::trace::{LineStyle, NamedColor};

// ---------------------------------------------------------------------------
// Style → egui conversions
// ---------------------------------------------------------------------------

pub fn color32(color: NamedColor) -> Color32 {
    let [r, g, b] = color.rgb();
    Color32::from_rgb(r, g, b)
}

/// egui_plot has no dash-dot pattern; it is drawn as a long dash.
pub fn plot_line_style(style: LineStyle) -> PlotLineStyle {
    match style {
        LineStyle::Solid => PlotLineStyle::Solid,
        LineStyle::Dashed => PlotLineStyle::Dashed { length: 8.0 },
        LineStyle::DashDot => PlotLineStyle::Dashed { length: 14.0 },
        LineStyle::Dotted => PlotLineStyle::Dotted { spacing: 4.0 },
    }
}
